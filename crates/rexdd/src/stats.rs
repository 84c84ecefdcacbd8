//! Per-operator statistics counters, compiled in via the `statistics`
//! feature

#[cfg(feature = "statistics")]
pub(crate) mod imp {
    use std::sync::atomic::{AtomicI64, Ordering::Relaxed};

    use crate::cache::OpCode;

    pub(crate) struct StatCounters {
        pub(crate) calls: AtomicI64,
        pub(crate) cache_queries: AtomicI64,
        pub(crate) cache_hits: AtomicI64,
        pub(crate) reduced: AtomicI64,
    }

    impl StatCounters {
        #[allow(clippy::declare_interior_mutable_const)]
        const INIT: StatCounters = StatCounters {
            calls: AtomicI64::new(0),
            cache_queries: AtomicI64::new(0),
            cache_hits: AtomicI64::new(0),
            reduced: AtomicI64::new(0),
        };
    }

    pub(crate) static STAT_COUNTERS: [StatCounters; OpCode::COUNT] =
        [StatCounters::INIT; OpCode::COUNT];

    /// Print statistics to stderr
    pub fn print_stats() {
        eprintln!("[rexdd operators]");
        for (i, counter) in STAT_COUNTERS.iter().enumerate() {
            let calls = counter.calls.swap(0, Relaxed);
            let queries = counter.cache_queries.swap(0, Relaxed);
            let hits = counter.cache_hits.swap(0, Relaxed);
            let reduced = counter.reduced.swap(0, Relaxed);
            if calls == 0 && queries == 0 {
                continue;
            }
            let op = match i {
                0 => OpCode::Union,
                1 => OpCode::Intersect,
                2 => OpCode::Difference,
                3 => OpCode::Xor,
                4 => OpCode::Not,
                5 => OpCode::Min,
                6 => OpCode::Max,
                7 => OpCode::Plus,
                8 => OpCode::Cardinality,
                9 => OpCode::NodeCount,
                10 => OpCode::Restrict,
                11 => OpCode::Osm,
                12 => OpCode::Tsm,
                13 => OpCode::Compare,
                14 => OpCode::HasCommon,
                15 => OpCode::Common,
                16 => OpCode::Highest,
                17 => OpCode::Lowest,
                18 => OpCode::Copy,
                19 => OpCode::Image,
                _ => OpCode::Saturate,
            };
            eprintln!(
                "  {}: calls {calls}, cache queries {queries}, hits {hits}, reduced {reduced}",
                op.name(),
            );
        }
    }
}

#[cfg(feature = "statistics")]
pub use imp::print_stats;

#[cfg(feature = "statistics")]
macro_rules! stat {
    (call $op:expr) => {
        $crate::stats::imp::STAT_COUNTERS[$op as usize]
            .calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    };
    (cache_query $op:expr) => {
        $crate::stats::imp::STAT_COUNTERS[$op as usize]
            .cache_queries
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    };
    (cache_hit $op:expr) => {
        $crate::stats::imp::STAT_COUNTERS[$op as usize]
            .cache_hits
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    };
    (reduced $op:expr) => {
        $crate::stats::imp::STAT_COUNTERS[$op as usize]
            .reduced
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    };
}

#[cfg(not(feature = "statistics"))]
macro_rules! stat {
    ($($tt:tt)*) => {};
}
