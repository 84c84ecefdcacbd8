//! Shared helpers for the integration tests
#![allow(dead_code)]

use rexdd::{DdResult, Edge, EdgeLabel, Forest, ForestConfig, Level, Predef, Value};

/// Lehmer generator, good enough for reproducible random functions
pub struct Rng(i64);

impl Rng {
    pub fn new(seed: i64) -> Rng {
        Rng(seed)
    }

    pub fn next01(&mut self) -> f64 {
        const MODULUS: i64 = 2147483647;
        const MULTIPLIER: i64 = 48271;
        const Q: i64 = MODULUS / MULTIPLIER;
        const R: i64 = MODULUS % MULTIPLIER;
        let t = MULTIPLIER * (self.0 % Q) - R * (self.0 / Q);
        self.0 = if t > 0 { t } else { t + MODULUS };
        self.0 as f64 / MODULUS as f64
    }

    pub fn bool(&mut self) -> bool {
        self.next01() > 0.5
    }

    pub fn below(&mut self, n: usize) -> usize {
        (self.next01() * n as f64) as usize % n
    }
}

/// All set-forest families exercised by the canonicity tests
pub fn set_families() -> Vec<Predef> {
    vec![
        Predef::Qbdd,
        Predef::Fbdd,
        Predef::Cfbdd,
        Predef::Sfbdd,
        Predef::Csfbdd,
        Predef::Zbdd,
        Predef::Esrbdd,
        Predef::Cesrbdd,
        Predef::Rexbdd,
    ]
}

pub fn forest(kind: Predef, num_vars: Level) -> Forest {
    Forest::new(ForestConfig::predef(kind, num_vars)).unwrap()
}

/// Build a set function from its truth table by bottom-up recursion over
/// `reduce_edge`; `table[a]` is the value at assignment `a`, bit `k-1` of
/// `a` being the variable at level `k`.
pub fn build_from_table(f: &mut Forest, table: &[bool]) -> DdResult<Edge> {
    let num_vars = table.len().trailing_zeros() as Level;
    assert_eq!(1usize << num_vars, table.len());
    fn rec(f: &mut Forest, k: Level, table: &[bool], start: usize) -> DdResult<Edge> {
        if k == 0 {
            return f.terminal(Value::Int(table[start] as i64));
        }
        let half = 1usize << (k - 1);
        let c0 = rec(f, k - 1, table, start)?;
        let c1 = rec(f, k - 1, table, start + half)?;
        f.reduce_edge(k, EdgeLabel::default(), k, &[c0, c1], 0)
    }
    let top = num_vars;
    let e = rec(f, top, table, 0)?;
    f.normalize_edge(top, e)
}

/// Evaluate `e` on every assignment and return the truth table
pub fn table_of(f: &Forest, e: Edge, num_vars: Level) -> Vec<bool> {
    (0..1usize << num_vars)
        .map(|bits| {
            let vars: Vec<bool> = (0..num_vars).map(|k| bits & (1 << k) != 0).collect();
            f.evaluate(e, &vars).unwrap() == Value::Int(1)
        })
        .collect()
}

/// A random truth table over `num_vars` variables
pub fn random_table(rng: &mut Rng, num_vars: Level) -> Vec<bool> {
    (0..1usize << num_vars).map(|_| rng.bool()).collect()
}
