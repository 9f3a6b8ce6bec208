//! Shared primitive types and row shapes for the loan dataset.

use serde::{Deserialize, Serialize};

/// Customer key. Not unique per row in `customers`.
pub type CustomerId = i64;

pub const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

// ── Base tables ────────────────────────────────────────────────
//
// Every column except the keys may be NULL in the source database.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRow {
    pub customer_id: CustomerId,
    pub income: Option<f64>,
    pub region: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRow {
    pub customer_id: CustomerId,
    pub loan_amount: Option<f64>,
    pub loan_term: Option<i64>,
    pub interest_rate: Option<f64>,
    pub approval_status: Option<String>, // free text, casing and padding vary
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditRow {
    pub customer_id: CustomerId,
    pub customer_class: Option<String>,
    pub credit_score: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentRow {
    pub repayment_id: i64,
    pub customer_id: CustomerId,
    pub amount: Option<f64>,
    pub repayment_date: Option<String>, // "YYYY-MM-DD HH:MM:SS" in `time_zone`
    pub time_zone: Option<String>,
}

/// All four customer-keyed base tables. `months` is fixed and seeded by the
/// schema bootstrap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub customers: Vec<CustomerRow>,
    pub loans: Vec<LoanRow>,
    pub credit: Vec<CreditRow>,
    pub repayments: Vec<RepaymentRow>,
}

// ── Derived tables ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub customer_id: CustomerId,
    pub month_name: String,
    pub number_of_repayments: i64,
    pub amount_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectedCustomerRow {
    pub customer_id: CustomerId,
    pub age: Option<i64>,
    pub corrected_age: Option<i64>,
    pub gender: Option<String>,
}
