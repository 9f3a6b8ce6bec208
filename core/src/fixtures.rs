//! Deterministic sample datasets.
//!
//! Generated data carries the same defects as the graded database:
//! duplicate customer and credit rows, padded and mixed-case approval
//! statuses, regions spelled out or abbreviated, and repayments stamped
//! in several time zones at all hours.

use crate::{
    rng::{DatasetRng, TableStream},
    types::{CreditRow, CustomerId, CustomerRow, Dataset, LoanRow, RepaymentRow},
};

pub const DEFAULT_SAMPLE_CUSTOMERS: usize = 60;

const REGIONS: [&str; 12] = [
    "WesternCape", "Gauteng", "KwaZulu-Natal", "EasternCape", "FreeState", "Limpopo",
    "NorthWest", "NorthernCape", "Mpumalanga", "GT", "WC", " Gauteng ",
];
const GENDERS: [&str; 2] = ["Male", "Female"];
const STATUSES: [&str; 7] = [
    "Approved", "Rejected", " Rejected", "rejected ", "APPROVED", "Pending", "REJECTED",
];
const CLASSES: [&str; 3] = ["A", "B", "C"];
const TIME_ZONES: [&str; 8] = ["UTC", "GMT", "PST", "EST", "SAST", "CET", "JST", "ist"];

/// Probability a customer appears twice in `customers`.
const DUPLICATE_CUSTOMER_RATE: f64 = 0.15;
/// Probability a customer has a second `credit` row.
const DUPLICATE_CREDIT_RATE: f64 = 0.10;
/// Probability a customer never repays.
const NO_REPAYMENT_RATE: f64 = 0.10;

pub fn sample_dataset(seed: u64, customers: usize) -> Dataset {
    let mut data = Dataset::default();
    let ids: Vec<CustomerId> = (1..=customers as CustomerId).collect();

    let mut rng = DatasetRng::new(seed, TableStream::Customers);
    for &id in &ids {
        let row = CustomerRow {
            customer_id: id,
            income: Some(rng.money(8_000.0, 95_000.0)),
            region: Some((*rng.pick(&REGIONS)).to_string()),
            age: Some(rng.range_i64(16, 80)),
            gender: Some((*rng.pick(&GENDERS)).to_string()),
        };
        if rng.chance(DUPLICATE_CUSTOMER_RATE) {
            // Same key and gender, conflicting income and age.
            data.customers.push(CustomerRow {
                income: Some(rng.money(8_000.0, 95_000.0)),
                age: Some(rng.range_i64(16, 80)),
                ..row.clone()
            });
        }
        data.customers.push(row);
    }
    log::debug!("{}: {} rows", rng.table, data.customers.len());

    let mut rng = DatasetRng::new(seed, TableStream::Loans);
    for &id in &ids {
        for _ in 0..rng.range_i64(1, 2) {
            data.loans.push(LoanRow {
                customer_id: id,
                loan_amount: Some(rng.money(1_000.0, 250_000.0)),
                loan_term: Some(*rng.pick(&[12, 24, 36, 48, 60])),
                interest_rate: Some((rng.money(5.0, 24.0) * 10.0).round() / 10.0),
                approval_status: Some((*rng.pick(&STATUSES)).to_string()),
            });
        }
    }
    log::debug!("{}: {} rows", rng.table, data.loans.len());

    let mut rng = DatasetRng::new(seed, TableStream::Credit);
    for &id in &ids {
        let copies = if rng.chance(DUPLICATE_CREDIT_RATE) { 2 } else { 1 };
        for _ in 0..copies {
            data.credit.push(CreditRow {
                customer_id: id,
                customer_class: Some((*rng.pick(&CLASSES)).to_string()),
                credit_score: Some(rng.range_i64(300, 850)),
            });
        }
    }
    log::debug!("{}: {} rows", rng.table, data.credit.len());

    let mut rng = DatasetRng::new(seed, TableStream::Repayments);
    let mut next_id = 1;
    for &id in &ids {
        if rng.chance(NO_REPAYMENT_RATE) {
            continue;
        }
        for _ in 0..rng.range_i64(1, 8) {
            let date = format!(
                "2023-{:02}-{:02} {:02}:{:02}:{:02}",
                rng.range_i64(1, 12),
                rng.range_i64(1, 28),
                rng.range_i64(0, 23),
                rng.range_i64(0, 59),
                rng.range_i64(0, 59),
            );
            data.repayments.push(RepaymentRow {
                repayment_id: next_id,
                customer_id: id,
                amount: Some(rng.money(50.0, 5_000.0)),
                repayment_date: Some(date),
                time_zone: Some((*rng.pick(&TIME_ZONES)).to_string()),
            });
            next_id += 1;
        }
    }
    log::debug!("{}: {} rows", rng.table, data.repayments.len());

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn same_seed_same_dataset() {
        assert_eq!(sample_dataset(11, 30), sample_dataset(11, 30));
        assert_ne!(sample_dataset(11, 30), sample_dataset(12, 30));
    }

    #[test]
    fn repayment_ids_are_unique() {
        let data = sample_dataset(5, DEFAULT_SAMPLE_CUSTOMERS);
        let ids: HashSet<i64> = data.repayments.iter().map(|r| r.repayment_id).collect();
        assert_eq!(ids.len(), data.repayments.len());
    }

    #[test]
    fn duplicates_keep_customer_gender() {
        let data = sample_dataset(5, DEFAULT_SAMPLE_CUSTOMERS);
        for a in &data.customers {
            for b in &data.customers {
                if a.customer_id == b.customer_id {
                    assert_eq!(a.gender, b.gender);
                }
            }
        }
    }
}
