use super::LoanStore;
use crate::{
    error::LoanResult,
    types::{CreditRow, CustomerRow, Dataset, LoanRow, RepaymentRow},
};
use rusqlite::params;

impl LoanStore {
    // ── Base tables ───────────────────────────────────────────────

    /// Bulk-load a dataset into the base tables in one transaction.
    pub fn load_dataset(&self, data: &Dataset) -> LoanResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO customers (CustomerID, Income, Region, Age, Gender)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for c in &data.customers {
                stmt.execute(params![c.customer_id, c.income, c.region, c.age, c.gender])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO loans (CustomerID, LoanAmount, LoanTerm, InterestRate, ApprovalStatus)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for l in &data.loans {
                stmt.execute(params![
                    l.customer_id,
                    l.loan_amount,
                    l.loan_term,
                    l.interest_rate,
                    l.approval_status
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO credit (CustomerID, CustomerClass, CreditScore)
                 VALUES (?1, ?2, ?3)",
            )?;
            for c in &data.credit {
                stmt.execute(params![c.customer_id, c.customer_class, c.credit_score])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO repayments (RepaymentID, CustomerID, Amount, RepaymentDate, TimeZone)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for r in &data.repayments {
                stmt.execute(params![
                    r.repayment_id,
                    r.customer_id,
                    r.amount,
                    r.repayment_date,
                    r.time_zone
                ])?;
            }
        }
        tx.commit()?;
        log::info!(
            "Loaded dataset: {} customer rows, {} loans, {} credit rows, {} repayments",
            data.customers.len(),
            data.loans.len(),
            data.credit.len(),
            data.repayments.len()
        );
        Ok(())
    }

    // Reads skip rows without a CustomerID; no question can attribute them.

    pub fn all_customers(&self) -> LoanResult<Vec<CustomerRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT CustomerID, Income, Region, Age, Gender
             FROM customers WHERE CustomerID IS NOT NULL
             ORDER BY CustomerID, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CustomerRow {
                customer_id: row.get(0)?,
                income: row.get(1)?,
                region: row.get(2)?,
                age: row.get(3)?,
                gender: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn all_loans(&self) -> LoanResult<Vec<LoanRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT CustomerID, LoanAmount, LoanTerm, InterestRate, ApprovalStatus
             FROM loans WHERE CustomerID IS NOT NULL
             ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LoanRow {
                customer_id: row.get(0)?,
                loan_amount: row.get(1)?,
                loan_term: row.get(2)?,
                interest_rate: row.get(3)?,
                approval_status: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn all_credit(&self) -> LoanResult<Vec<CreditRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT CustomerID, CustomerClass, CreditScore
             FROM credit WHERE CustomerID IS NOT NULL
             ORDER BY CustomerID, rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CreditRow {
                customer_id: row.get(0)?,
                customer_class: row.get(1)?,
                credit_score: row.get(2)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn all_repayments(&self) -> LoanResult<Vec<RepaymentRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT RepaymentID, CustomerID, Amount, RepaymentDate, TimeZone
             FROM repayments WHERE CustomerID IS NOT NULL
             ORDER BY RepaymentID",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(RepaymentRow {
                repayment_id: row.get(0)?,
                customer_id: row.get(1)?,
                amount: row.get(2)?,
                repayment_date: row.get(3)?,
                time_zone: row.get(4)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
