//! The seven graded questions and how they link together.
//!
//! Q4 → Q5 and Q6 → Q7 are linked: the first materializes a table the
//! second reads. Every other question stands alone.

use crate::error::LoanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Question {
    AverageIncomePerClass,
    RejectedPerProvince,
    Financing,
    Timeline,
    TimelinePivot,
    CorrectedCustomers,
    AgeCategoryRank,
}

impl Question {
    pub const ALL: [Question; 7] = [
        Question::AverageIncomePerClass,
        Question::RejectedPerProvince,
        Question::Financing,
        Question::Timeline,
        Question::TimelinePivot,
        Question::CorrectedCustomers,
        Question::AgeCategoryRank,
    ];

    pub fn number(self) -> u8 {
        match self {
            Self::AverageIncomePerClass => 1,
            Self::RejectedPerProvince => 2,
            Self::Financing => 3,
            Self::Timeline => 4,
            Self::TimelinePivot => 5,
            Self::CorrectedCustomers => 6,
            Self::AgeCategoryRank => 7,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|q| q.number() == n)
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::AverageIncomePerClass => "AverageIncome per CustomerClass",
            Self::RejectedPerProvince => "RejectedApplications per Province",
            Self::Financing => "Create financing table",
            Self::Timeline => "Create monthly repayment timeline",
            Self::TimelinePivot => "Pivot timeline per customer",
            Self::CorrectedCustomers => "Create corrected_customers",
            Self::AgeCategoryRank => "Rank customers per age category",
        }
    }

    /// The linked question that must have run earlier in the same section.
    pub fn prerequisite(self) -> Option<Question> {
        match self {
            Self::TimelinePivot => Some(Self::Timeline),
            Self::AgeCategoryRank => Some(Self::CorrectedCustomers),
            _ => None,
        }
    }

    /// Table this question creates or replaces, if any.
    pub fn produces_table(self) -> Option<&'static str> {
        match self {
            Self::Financing => Some("financing"),
            Self::Timeline => Some("timeline"),
            Self::CorrectedCustomers => Some("corrected_customers"),
            _ => None,
        }
    }

    /// False for questions graded only on their side effect.
    pub fn returns_rows(self) -> bool {
        !matches!(self, Self::Financing | Self::Timeline)
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{} ({})", self.number(), self.title())
    }
}

impl FromStr for Question {
    type Err = LoanError;

    /// Accepts "4", "q4" or "Q4".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches(|c: char| c == 'q' || c == 'Q');
        digits
            .parse::<u8>()
            .ok()
            .and_then(Question::from_number)
            .ok_or_else(|| LoanError::UnknownQuestion(s.to_string()))
    }
}
