//! Gender-partitioned age correction and age-band ranking.

use loanbook_core::{
    age_correction::{ranks_are_contiguous, shift_forward, AGE_SHIFT},
    config::AnalyticsConfig,
    error::LoanError,
    question::Question,
    result_set::{Cell, ResultSet},
    section::GradingSection,
    types::{CustomerRow, Dataset, RepaymentRow},
};
use std::collections::BTreeMap;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(id: i64, age: i64, gender: &str) -> CustomerRow {
    CustomerRow {
        customer_id: id,
        income: Some(30_000.0),
        region: Some("Gauteng".into()),
        age: Some(age),
        gender: Some(gender.into()),
    }
}

/// `n` repayments for `customer_id`, ids starting at `first_id`.
fn repayments(first_id: i64, customer_id: i64, n: i64) -> Vec<RepaymentRow> {
    (0..n)
        .map(|i| RepaymentRow {
            repayment_id: first_id + i,
            customer_id,
            amount: Some(100.0),
            repayment_date: Some("2023-04-04 10:00:00".into()),
            time_zone: Some("GMT".into()),
        })
        .collect()
}

/// Males 1,3,5,7,9 and females 2,4,6. Customer 3 has a duplicate row with
/// a higher age that MIN() discards.
fn ages_dataset() -> Dataset {
    let mut reps = Vec::new();
    reps.extend(repayments(1, 1, 3));
    reps.extend(repayments(10, 7, 3));
    reps.extend(repayments(20, 9, 1));
    reps.extend(repayments(30, 5, 2));
    reps.extend(repayments(40, 2, 1));
    Dataset {
        customers: vec![
            customer(1, 21, "Male"),
            customer(2, 18, "Female"),
            customer(3, 32, "Male"),
            customer(3, 99, "Male"),
            customer(4, 61, "Female"),
            customer(5, 43, "Male"),
            customer(6, 29, "Female"),
            customer(7, 54, "Male"),
            customer(9, 65, "Male"),
        ],
        repayments: reps,
        ..Dataset::default()
    }
}

fn make_section() -> GradingSection {
    GradingSection::from_dataset(ages_dataset(), AnalyticsConfig::default()).unwrap()
}

fn corrected_ages(rs: &ResultSet, gender: &str) -> Vec<(i64, i64, i64)> {
    (0..rs.len())
        .filter(|&i| rs.get(i, "Gender").and_then(Cell::as_str) == Some(gender))
        .map(|i| {
            (
                rs.get(i, "CustomerID").and_then(Cell::as_i64).unwrap(),
                rs.get(i, "Age").and_then(Cell::as_i64).unwrap(),
                rs.get(i, "CorrectedAge").and_then(Cell::as_i64).unwrap(),
            )
        })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn corrected_age_takes_value_two_ranks_back_with_wraparound() {
    let mut section = make_section();
    let rs = section
        .run(Question::CorrectedCustomers)
        .unwrap()
        .result
        .expect("Q6 returns SELECT * FROM corrected_customers");

    assert_eq!(rs.columns, vec!["CustomerID", "Age", "CorrectedAge", "Gender"]);
    assert_eq!(
        corrected_ages(&rs, "Male"),
        vec![(1, 21, 54), (3, 32, 65), (5, 43, 21), (7, 54, 32), (9, 65, 43)]
    );
    assert_eq!(
        corrected_ages(&rs, "Female"),
        vec![(2, 18, 61), (4, 61, 29), (6, 29, 18)]
    );
}

#[test]
fn one_non_null_row_per_customer_and_gender() {
    let mut section = make_section();
    section.run(Question::CorrectedCustomers).unwrap();
    let rows = section.store.corrected_customer_rows().unwrap();

    assert_eq!(rows.len(), 8);
    let mut seen = BTreeMap::new();
    for r in &rows {
        assert!(r.corrected_age.is_some(), "customer {} has null CorrectedAge", r.customer_id);
        assert!(
            seen.insert((r.customer_id, r.gender.clone()), ()).is_none(),
            "customer {} listed twice",
            r.customer_id
        );
    }
}

#[test]
fn inverse_shift_recovers_recorded_ages() {
    let mut section = GradingSection::from_dataset(
        loanbook_core::fixtures::sample_dataset(17, 40),
        AnalyticsConfig::default(),
    )
    .unwrap();
    section.run(Question::CorrectedCustomers).unwrap();
    let rows = section.store.corrected_customer_rows().unwrap();

    let mut by_gender: BTreeMap<&str, (Vec<i64>, Vec<i64>)> = BTreeMap::new();
    for r in &rows {
        let e = by_gender.entry(r.gender.as_deref().unwrap()).or_default();
        e.0.push(r.age.unwrap());
        e.1.push(r.corrected_age.unwrap());
    }
    assert!(!by_gender.is_empty());
    for (gender, (ages, corrected)) in by_gender {
        assert_eq!(shift_forward(&corrected, AGE_SHIFT), ages, "{gender}");
    }
}

#[test]
fn single_customer_partition_keeps_own_age() {
    let data = Dataset {
        customers: vec![customer(1, 40, "Female"), customer(2, 25, "Male"), customer(3, 33, "Male")],
        ..Dataset::default()
    };
    let mut section = GradingSection::from_dataset(data, AnalyticsConfig::default()).unwrap();
    let rs = section.run(Question::CorrectedCustomers).unwrap().result.unwrap();
    assert_eq!(corrected_ages(&rs, "Female"), vec![(1, 40, 40)]);
    assert_eq!(corrected_ages(&rs, "Male"), vec![(2, 25, 25), (3, 33, 33)]);
}

#[test]
fn ranking_requires_corrected_customers() {
    let mut section = make_section();
    let err = section.run(Question::AgeCategoryRank).unwrap_err();
    assert!(matches!(
        err,
        LoanError::MissingPrerequisite { question: 7, table: "corrected_customers" }
    ));
}

#[test]
fn dense_rank_per_age_category() {
    let mut section = make_section();
    let rs = section
        .run_with_prerequisites(Question::AgeCategoryRank)
        .unwrap()
        .result
        .expect("Q7 returns rows");

    assert_eq!(
        rs.columns,
        vec!["CustomerID", "Age", "CorrectedAge", "Gender", "AgeCategory", "Rank"]
    );

    let got: Vec<(i64, String, i64)> = (0..rs.len())
        .map(|i| {
            (
                rs.get(i, "CustomerID").and_then(Cell::as_i64).unwrap(),
                rs.get(i, "AgeCategory").and_then(Cell::as_str).unwrap().to_string(),
                rs.get(i, "Rank").and_then(Cell::as_i64).unwrap(),
            )
        })
        .collect();
    let expected = vec![
        (1, "Adult".to_string(), 1),
        (7, "Adult".to_string(), 1),
        (9, "Adult".to_string(), 2),
        (2, "Pensioner".to_string(), 1),
        (3, "Pensioner".to_string(), 2),
        (6, "Teen".to_string(), 1),
        (5, "Young Adult".to_string(), 1),
        (4, "Young Adult".to_string(), 2),
    ];
    assert_eq!(got, expected);
}

#[test]
fn ranking_can_run_again_in_the_same_section() {
    let mut section = make_section();
    let first = section
        .run_with_prerequisites(Question::AgeCategoryRank)
        .unwrap()
        .result
        .unwrap();
    let second = section.run(Question::AgeCategoryRank).unwrap().result.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        section.store.column_names("corrected_customers").unwrap(),
        vec!["CustomerID", "Age", "CorrectedAge", "Gender", "AgeCategory"]
    );
    assert!(!section.store.table_exists("corrected_customers_banded").unwrap());
}

#[test]
fn customers_without_gender_form_their_own_partition() {
    let mut data = ages_dataset();
    data.customers.push(CustomerRow {
        gender: None,
        ..customer(11, 47, "")
    });
    let mut section = GradingSection::from_dataset(data, AnalyticsConfig::default()).unwrap();
    section.run(Question::CorrectedCustomers).unwrap();
    let rows = section.store.corrected_customer_rows().unwrap();
    let unknown: Vec<_> = rows.iter().filter(|r| r.gender.is_none()).collect();
    assert_eq!(unknown.len(), 1);
    assert_eq!(unknown[0].corrected_age, Some(47));
}

#[test]
fn customers_without_repayments_are_ranked() {
    let mut section = make_section();
    let rs = section
        .run_with_prerequisites(Question::AgeCategoryRank)
        .unwrap()
        .result
        .unwrap();
    // Customers 3, 4 and 6 never repaid.
    for id in [3, 4, 6] {
        assert!(
            (0..rs.len()).any(|i| rs.get(i, "CustomerID") == Some(&Cell::Integer(id))),
            "customer {id} missing from ranking"
        );
    }
}

#[test]
fn ranks_stay_contiguous_on_sample_data() {
    let mut section = GradingSection::from_dataset(
        loanbook_core::fixtures::sample_dataset(3, 80),
        AnalyticsConfig::default(),
    )
    .unwrap();
    let rs = section
        .run_with_prerequisites(Question::AgeCategoryRank)
        .unwrap()
        .result
        .unwrap();

    let mut by_category: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for i in 0..rs.len() {
        by_category
            .entry(rs.get(i, "AgeCategory").and_then(Cell::as_str).unwrap().to_string())
            .or_default()
            .push(rs.get(i, "Rank").and_then(Cell::as_i64).unwrap());
    }
    for (category, ranks) in by_category {
        assert!(ranks_are_contiguous(&ranks), "{category}: {ranks:?}");
    }
}
