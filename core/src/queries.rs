//! SQL text for every question.
//!
//! RULE: queries are data. Nothing here touches a connection; the store
//! executes whatever the catalog hands it.
//!
//! Deduplication: customer-keyed tables may hold several rows per
//! CustomerID. Every query collapses them with MIN() before joining.

use crate::{
    config::AnalyticsConfig,
    question::Question,
    types::MONTH_NAMES,
};
use std::fmt::Write;

pub const AVERAGE_INCOME_PER_CLASS: &str = "
WITH customers_clean AS (
    SELECT
        CustomerID,
        MIN(Income) AS Income
    FROM customers
    GROUP BY CustomerID
),
credit_clean AS (
    SELECT
        CustomerID,
        MIN(CustomerClass) AS CustomerClass
    FROM credit
    GROUP BY CustomerID
)
SELECT
    cr.CustomerClass,
    AVG(cu.Income) AS AverageIncome
FROM credit_clean cr
JOIN customers_clean cu
    ON cr.CustomerID = cu.CustomerID
GROUP BY cr.CustomerClass
ORDER BY cr.CustomerClass;
";

pub const FINANCING: &str = "
DROP TABLE IF EXISTS financing;

CREATE TABLE financing (
    CustomerID     INTEGER,
    Income         REAL,
    LoanAmount     REAL,
    LoanTerm       INTEGER,
    InterestRate   REAL,
    ApprovalStatus TEXT,
    CreditScore    INTEGER
);

WITH customers_clean AS (
    SELECT
        CustomerID,
        MIN(Income) AS Income
    FROM customers
    GROUP BY CustomerID
),
credit_clean AS (
    SELECT
        CustomerID,
        MIN(CreditScore) AS CreditScore
    FROM credit
    GROUP BY CustomerID
)
INSERT INTO financing (
    CustomerID, Income, LoanAmount, LoanTerm, InterestRate, ApprovalStatus, CreditScore
)
SELECT
    c.CustomerID,
    c.Income,
    l.LoanAmount,
    l.LoanTerm,
    l.InterestRate,
    l.ApprovalStatus,
    cr.CreditScore
FROM customers_clean c
JOIN loans l
    ON l.CustomerID = c.CustomerID
JOIN credit_clean cr
    ON cr.CustomerID = c.CustomerID;
";

/// Rank r takes the age recorded at rank r - 2 of the same gender,
/// wrapping past the first rank to the end of the partition.
pub const CORRECTED_CUSTOMERS: &str = "
DROP TABLE IF EXISTS corrected_customers;

CREATE TABLE corrected_customers AS
WITH customers_clean AS (
    SELECT
        CustomerID,
        Gender,
        MIN(Age) AS Age
    FROM customers
    WHERE CustomerID IS NOT NULL
    GROUP BY CustomerID, Gender
),
ranked AS (
    SELECT
        CustomerID,
        Age,
        Gender,
        ROW_NUMBER() OVER (PARTITION BY Gender ORDER BY CustomerID) AS GenderRank,
        COUNT(*)     OVER (PARTITION BY Gender)                     AS GenderCount
    FROM customers_clean
)
SELECT
    cur.CustomerID,
    cur.Age,
    src.Age AS CorrectedAge,
    cur.Gender
FROM ranked cur
JOIN ranked src
    ON src.Gender IS cur.Gender
    AND src.GenderRank =
        ((cur.GenderRank - 3) % cur.GenderCount + cur.GenderCount) % cur.GenderCount + 1
ORDER BY cur.Gender, cur.CustomerID;

SELECT * FROM corrected_customers;
";

/// Rebuilds `corrected_customers` with an AgeCategory column so the
/// question can run again in the same section.
pub const AGE_CATEGORY_RANK: &str = "
DROP TABLE IF EXISTS corrected_customers_banded;

CREATE TABLE corrected_customers_banded AS
SELECT
    CustomerID,
    Age,
    CorrectedAge,
    Gender,
    CASE
        WHEN CorrectedAge < 20 THEN 'Teen'
        WHEN CorrectedAge < 30 THEN 'Young Adult'
        WHEN CorrectedAge < 60 THEN 'Adult'
        ELSE 'Pensioner'
    END AS AgeCategory
FROM corrected_customers
ORDER BY Gender, CustomerID;

DROP TABLE corrected_customers;

ALTER TABLE corrected_customers_banded RENAME TO corrected_customers;

WITH repayment_counts AS (
    SELECT
        CustomerID,
        COUNT(*) AS NumberOfRepayments
    FROM repayments
    GROUP BY CustomerID
)
SELECT
    cc.CustomerID,
    cc.Age,
    cc.CorrectedAge,
    cc.Gender,
    cc.AgeCategory,
    DENSE_RANK() OVER (
        PARTITION BY cc.AgeCategory
        ORDER BY COALESCE(rc.NumberOfRepayments, 0) DESC
    ) AS \"Rank\"
FROM corrected_customers cc
LEFT JOIN repayment_counts rc
    ON rc.CustomerID = cc.CustomerID
ORDER BY cc.AgeCategory, \"Rank\", cc.CustomerID;
";

/// Produces the SQL for each question. Q2 and Q4 depend on configuration;
/// the rest are fixed text.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    config: AnalyticsConfig,
}

impl QueryCatalog {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn sql(&self, question: Question) -> String {
        match question {
            Question::AverageIncomePerClass => AVERAGE_INCOME_PER_CLASS.to_string(),
            Question::RejectedPerProvince => self.rejected_per_province(),
            Question::Financing => FINANCING.to_string(),
            Question::Timeline => self.timeline(),
            Question::TimelinePivot => timeline_pivot(),
            Question::CorrectedCustomers => CORRECTED_CUSTOMERS.to_string(),
            Question::AgeCategoryRank => AGE_CATEGORY_RANK.to_string(),
        }
    }

    fn rejected_per_province(&self) -> String {
        let mut cases = String::new();
        for p in &self.config.provinces {
            let _ = writeln!(
                cases,
                "        WHEN '{}' THEN '{}'",
                p.full_name, p.abbreviation
            );
        }
        format!(
            "
WITH customers_clean AS (
    SELECT
        CustomerID,
        MIN(TRIM(Region)) AS Region
    FROM customers
    GROUP BY CustomerID
)
SELECT
    COUNT(*) AS RejectedApplications,
    CASE c.Region
{cases}        ELSE c.Region
    END AS Province
FROM loans l
JOIN customers_clean c
    ON l.CustomerID = c.CustomerID
WHERE LOWER(TRIM(l.ApprovalStatus)) = 'rejected'
GROUP BY Province
ORDER BY RejectedApplications DESC, Province;
"
        )
    }

    /// Month and time of day both come from the converted timestamp, so a
    /// repayment can move into the neighbouring month after conversion.
    fn timeline(&self) -> String {
        let offsets = self
            .config
            .time_zones
            .iter()
            .map(|tz| {
                format!(
                    "        ('{}', {})",
                    tz.abbreviation.trim().to_uppercase(),
                    tz.offset_minutes
                )
            })
            .collect::<Vec<_>>()
            .join(",\n");
        let reference = self.config.reference_offset_minutes;
        let (start, end) = self.config.repayment_window.canonical();
        format!(
            "
DROP TABLE IF EXISTS timeline;

CREATE TABLE timeline AS
WITH tz_offsets (TimeZone, OffsetMinutes) AS (
    VALUES
{offsets}
),
customer_ids AS (
    SELECT DISTINCT CustomerID
    FROM customers
    WHERE CustomerID IS NOT NULL
),
converted AS (
    SELECT
        r.RepaymentID,
        r.CustomerID,
        r.Amount,
        DATETIME(
            r.RepaymentDate,
            PRINTF('%+d minutes', {reference} - COALESCE(o.OffsetMinutes, {reference}))
        ) AS ReferenceDate
    FROM repayments r
    LEFT JOIN tz_offsets o
        ON o.TimeZone = UPPER(TRIM(r.TimeZone))
),
windowed AS (
    SELECT *
    FROM converted
    WHERE TIME(ReferenceDate) >= '{start}'
      AND TIME(ReferenceDate) <  '{end}'
)
SELECT
    c.CustomerID,
    m.MonthName,
    COUNT(w.RepaymentID)       AS NumberOfRepayments,
    COALESCE(SUM(w.Amount), 0) AS AmountTotal
FROM customer_ids c
CROSS JOIN months m
LEFT JOIN windowed w
    ON w.CustomerID = c.CustomerID
    AND CAST(STRFTIME('%m', w.ReferenceDate) AS INTEGER) = m.MonthID
GROUP BY c.CustomerID, m.MonthID, m.MonthName
ORDER BY c.CustomerID, m.MonthID;
"
        )
    }
}

fn timeline_pivot() -> String {
    let mut columns = Vec::with_capacity(MONTH_NAMES.len() * 2);
    for month in MONTH_NAMES {
        columns.push(format!(
            "    CAST(SUM(CASE WHEN MonthName = '{month}' THEN NumberOfRepayments ELSE 0 END) AS INTEGER) AS {month}Repayments"
        ));
        columns.push(format!(
            "    CAST(SUM(CASE WHEN MonthName = '{month}' THEN AmountTotal ELSE 0 END) AS REAL) AS {month}Total"
        ));
    }
    format!(
        "
SELECT
    CustomerID,
{}
FROM timeline
GROUP BY CustomerID
ORDER BY CustomerID;
",
        columns.join(",\n")
    )
}
