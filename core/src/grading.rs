//! Compare a question's result set with an expected answer.
//!
//! Column names must match exactly, including case. Numeric cells compare
//! within a tolerance, regardless of integer/real storage; text compares
//! byte for byte.

use crate::{
    error::LoanResult,
    question::Question,
    result_set::{Cell, ResultSet},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_FLOAT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedAnswer {
    pub question: u8,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    #[serde(default = "default_tolerance")]
    pub float_tolerance: f64,
}

fn default_tolerance() -> f64 {
    DEFAULT_FLOAT_TOLERANCE
}

impl ExpectedAnswer {
    /// Load `<dir>/question_<n>.json`. Returns None when no answer exists.
    pub fn load(dir: &Path, question: Question) -> LoanResult<Option<Self>> {
        let path = dir.join(format!("question_{}.json", question.number()));
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn from_result(question: Question, rs: &ResultSet) -> Self {
        Self {
            question: question.number(),
            columns: rs.columns.clone(),
            rows: rs.rows.clone(),
            float_tolerance: DEFAULT_FLOAT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mismatch {
    Columns {
        expected: Vec<String>,
        actual: Vec<String>,
    },
    RowCount {
        expected: usize,
        actual: usize,
    },
    Cell {
        row: usize,
        column: String,
        expected: Cell,
        actual: Cell,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Grade {
    Pass,
    Fail(Vec<Mismatch>),
}

impl Grade {
    pub fn passed(&self) -> bool {
        matches!(self, Grade::Pass)
    }
}

/// Stop listing cell mismatches after this many.
const MAX_CELL_MISMATCHES: usize = 20;

pub fn grade(actual: &ResultSet, expected: &ExpectedAnswer) -> Grade {
    if actual.columns != expected.columns {
        return Grade::Fail(vec![Mismatch::Columns {
            expected: expected.columns.clone(),
            actual: actual.columns.clone(),
        }]);
    }
    if actual.rows.len() != expected.rows.len() {
        return Grade::Fail(vec![Mismatch::RowCount {
            expected: expected.rows.len(),
            actual: actual.rows.len(),
        }]);
    }

    let mut mismatches = Vec::new();
    'rows: for (i, (a_row, e_row)) in actual.rows.iter().zip(&expected.rows).enumerate() {
        for ((a, e), column) in a_row.iter().zip(e_row).zip(&expected.columns) {
            if !cells_match(a, e, expected.float_tolerance) {
                mismatches.push(Mismatch::Cell {
                    row: i,
                    column: column.clone(),
                    expected: e.clone(),
                    actual: a.clone(),
                });
                if mismatches.len() >= MAX_CELL_MISMATCHES {
                    break 'rows;
                }
            }
        }
    }

    if mismatches.is_empty() {
        Grade::Pass
    } else {
        Grade::Fail(mismatches)
    }
}

fn cells_match(actual: &Cell, expected: &Cell, tolerance: f64) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(e)) => (a - e).abs() <= tolerance * e.abs().max(1.0),
        _ => actual == expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rs(columns: &[&str], rows: Vec<Vec<Cell>>) -> ResultSet {
        ResultSet {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn integer_and_real_storage_compare_numerically() {
        let actual = rs(&["JanuaryTotal"], vec![vec![Cell::Integer(0)]]);
        let expected = ExpectedAnswer::from_result(
            Question::TimelinePivot,
            &rs(&["JanuaryTotal"], vec![vec![Cell::Real(0.0)]]),
        );
        assert!(grade(&actual, &expected).passed());
    }

    #[test]
    fn column_case_matters() {
        let actual = rs(&["rank"], vec![vec![Cell::Integer(1)]]);
        let expected =
            ExpectedAnswer::from_result(Question::AgeCategoryRank, &rs(&["Rank"], vec![vec![Cell::Integer(1)]]));
        assert!(matches!(
            grade(&actual, &expected),
            Grade::Fail(m) if matches!(m[0], Mismatch::Columns { .. })
        ));
    }

    #[test]
    fn reports_cell_position() {
        let actual = rs(&["Province"], vec![vec![Cell::Text("GT".into())], vec![Cell::Text("WC".into())]]);
        let expected = ExpectedAnswer::from_result(
            Question::RejectedPerProvince,
            &rs(&["Province"], vec![vec![Cell::Text("GT".into())], vec![Cell::Text("KZN".into())]]),
        );
        match grade(&actual, &expected) {
            Grade::Fail(m) => assert_eq!(
                m,
                vec![Mismatch::Cell {
                    row: 1,
                    column: "Province".into(),
                    expected: Cell::Text("KZN".into()),
                    actual: Cell::Text("WC".into()),
                }]
            ),
            Grade::Pass => panic!("expected a mismatch"),
        }
    }

    #[test]
    fn tolerance_defaults_when_missing_from_json() {
        let e: ExpectedAnswer =
            serde_json::from_str(r#"{"question":1,"columns":["AverageIncome"],"rows":[[1.0]]}"#)
                .unwrap();
        assert_eq!(e.float_tolerance, DEFAULT_FLOAT_TOLERANCE);
    }
}
