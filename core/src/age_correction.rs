//! Circular age shift and dense ranking, computed in Rust.
//!
//! These mirror what the Q6 and Q7 statements do inside SQLite so the
//! verifier can check the database output independently.

use serde::{Deserialize, Serialize};

/// Positions the recorded ages are displaced by within each gender.
pub const AGE_SHIFT: usize = 2;

/// Value at position i becomes the value recorded at position i - `by`,
/// wrapping to the end of the slice.
pub fn shift_back<T: Clone>(values: &[T], by: usize) -> Vec<T> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let by = by % n;
    (0..n).map(|i| values[(i + n - by) % n].clone()).collect()
}

/// Inverse of [`shift_back`].
pub fn shift_forward<T: Clone>(values: &[T], by: usize) -> Vec<T> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let by = by % n;
    (0..n).map(|i| values[(i + by) % n].clone()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeCategory {
    Teen,
    YoungAdult,
    Adult,
    Pensioner,
}

impl AgeCategory {
    pub fn for_age(age: i64) -> Self {
        match age {
            a if a < 20 => Self::Teen,
            a if a < 30 => Self::YoungAdult,
            a if a < 60 => Self::Adult,
            _ => Self::Pensioner,
        }
    }

    /// Label written into `corrected_customers.AgeCategory`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Teen => "Teen",
            Self::YoungAdult => "Young Adult",
            Self::Adult => "Adult",
            Self::Pensioner => "Pensioner",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        [Self::Teen, Self::YoungAdult, Self::Adult, Self::Pensioner]
            .into_iter()
            .find(|c| c.label() == label)
    }
}

/// Dense ranks for `scores` sorted descending: ties share a rank and the
/// next distinct score gets the next integer. Output is aligned with input.
pub fn dense_rank_desc(scores: &[i64]) -> Vec<i64> {
    let mut distinct: Vec<i64> = scores.to_vec();
    distinct.sort_unstable_by(|a, b| b.cmp(a));
    distinct.dedup();
    scores
        .iter()
        .map(|s| {
            // distinct is sorted descending; position of s is rank - 1.
            let pos = distinct.partition_point(|d| d > s);
            pos as i64 + 1
        })
        .collect()
}

/// True when `ranks` (in any order) are exactly 1..=k with no gaps.
pub fn ranks_are_contiguous(ranks: &[i64]) -> bool {
    let mut distinct: Vec<i64> = ranks.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    distinct.iter().enumerate().all(|(i, r)| *r == i as i64 + 1)
}
