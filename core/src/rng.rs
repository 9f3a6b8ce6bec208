//! Deterministic random number generation for sample datasets.
//!
//! RULE: fixtures never call a platform RNG. Each base table draws from
//! its own stream, seeded from (seed XOR table index), so adding a column
//! to one table never changes the rows generated for another.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

pub struct DatasetRng {
    pub table: &'static str,
    inner: Pcg64Mcg,
}

impl DatasetRng {
    pub fn new(seed: u64, stream: TableStream) -> Self {
        let derived_seed = seed ^ (stream as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15);
        Self {
            table: stream.name(),
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Roll a u64 in [0, n).
    pub fn next_u64_below(&mut self, n: u64) -> u64 {
        use rand::RngCore;
        assert!(n > 0, "n must be > 0");
        self.inner.next_u64() % n
    }

    /// Inclusive integer range.
    pub fn range_i64(&mut self, lo: i64, hi: i64) -> i64 {
        assert!(lo <= hi, "empty range {lo}..={hi}");
        lo + self.next_u64_below((hi - lo + 1) as u64) as i64
    }

    /// Bernoulli trial: returns true with probability p.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.next_u64_below(items.len() as u64) as usize]
    }

    /// Round to cents.
    pub fn money(&mut self, lo: f64, hi: f64) -> f64 {
        let raw = lo + self.next_f64() * (hi - lo);
        (raw * 100.0).round() / 100.0
    }
}

/// Stable stream assignments. Append only: reordering changes every
/// generated table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u64)]
pub enum TableStream {
    Customers = 0,
    Loans = 1,
    Credit = 2,
    Repayments = 3,
}

impl TableStream {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Loans => "loans",
            Self::Credit => "credit",
            Self::Repayments => "repayments",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = DatasetRng::new(7, TableStream::Loans);
        let mut b = DatasetRng::new(7, TableStream::Loans);
        for _ in 0..32 {
            assert_eq!(a.next_u64_below(1000), b.next_u64_below(1000));
        }
    }

    #[test]
    fn streams_are_independent() {
        let mut a = DatasetRng::new(7, TableStream::Loans);
        let mut b = DatasetRng::new(7, TableStream::Credit);
        let xs: Vec<u64> = (0..8).map(|_| a.next_u64_below(u64::MAX)).collect();
        let ys: Vec<u64> = (0..8).map(|_| b.next_u64_below(u64::MAX)).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn range_is_inclusive() {
        let mut rng = DatasetRng::new(1, TableStream::Customers);
        for _ in 0..200 {
            let v = rng.range_i64(18, 20);
            assert!((18..=20).contains(&v));
        }
    }
}
