//! Prime progression used by the unique tables and the operation cache

/// Roughly doubling primes, the last one close to the u32 handle limit
pub(crate) const PRIMES: &[u32] = &[
    53,
    127,
    251,
    509,
    1021,
    2039,
    4093,
    8191,
    16381,
    32749,
    65521,
    131071,
    262139,
    524287,
    1048573,
    2097143,
    4194301,
    8388593,
    16777213,
    33554393,
    67108859,
    134217689,
    268435399,
    536870909,
    1073741789,
    2147483647,
    4294967291,
];

/// Smallest prime in the progression not below `n`, or `None` past the end
pub(crate) fn at_least(n: u64) -> Option<u32> {
    PRIMES.iter().copied().find(|&p| p as u64 >= n)
}
