use super::LoanStore;
use crate::{
    error::LoanResult,
    types::{CorrectedCustomerRow, TimelineRow},
};

impl LoanStore {
    // ── Materialized question tables ──────────────────────────────

    /// Rows of `timeline`, ordered by customer then calendar month.
    pub fn timeline_rows(&self) -> LoanResult<Vec<TimelineRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.CustomerID, t.MonthName, t.NumberOfRepayments, t.AmountTotal
             FROM timeline t
             JOIN months m ON m.MonthName = t.MonthName
             ORDER BY t.CustomerID, m.MonthID",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(TimelineRow {
                customer_id: row.get(0)?,
                month_name: row.get(1)?,
                number_of_repayments: row.get(2)?,
                amount_total: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Rows of `corrected_customers`, ordered by gender then customer so
    /// each gender partition reads in rank order.
    pub fn corrected_customer_rows(&self) -> LoanResult<Vec<CorrectedCustomerRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT CustomerID, Age, CorrectedAge, Gender
             FROM corrected_customers
             ORDER BY Gender, CustomerID",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CorrectedCustomerRow {
                customer_id: row.get(0)?,
                age: row.get(1)?,
                corrected_age: row.get(2)?,
                gender: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
