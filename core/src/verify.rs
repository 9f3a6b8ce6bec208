//! Independent checks of the question outputs.
//!
//! Every check recomputes its answer in Rust from the base tables and
//! compares it with what SQLite produced. A check never fails the run; it
//! reports violations. NULL cells are skipped the way MIN(), AVG() and
//! SUM() skip them.

use crate::{
    age_correction::{dense_rank_desc, ranks_are_contiguous, shift_back, shift_forward, AgeCategory, AGE_SHIFT},
    config::AnalyticsConfig,
    error::LoanResult,
    question::Question,
    result_set::{Cell, ResultSet},
    section::GradingSection,
    store::LoanStore,
    timezone::ReferenceClock,
    types::{CustomerId, MONTH_NAMES},
};
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

const AMOUNT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: &'static str,
    pub violations: Vec<String>,
}

impl CheckResult {
    fn new(name: &'static str, violations: Vec<String>) -> Self {
        Self { name, violations }
    }

    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VerificationReport {
    pub checks: Vec<CheckResult>,
}

impl VerificationReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(CheckResult::passed)
    }
}

/// Reset the section, run every question in order and check the results.
pub fn verify_section(section: &mut GradingSection) -> LoanResult<VerificationReport> {
    section.reset()?;
    let outcomes = section.run_all()?;
    let result_of = |q: Question| -> ResultSet {
        outcomes
            .iter()
            .find(|o| o.question == q)
            .and_then(|o| o.result.clone())
            .unwrap_or_default()
    };
    let config = section.catalog().config().clone();
    let store = &section.store;

    let report = VerificationReport {
        checks: vec![
            CheckResult::new(
                "average_income_matches_deduplicated_mean",
                check_average_income(store, &result_of(Question::AverageIncomePerClass))?,
            ),
            CheckResult::new(
                "rejections_match_province_counts",
                check_rejected_per_province(
                    store,
                    &config,
                    &result_of(Question::RejectedPerProvince),
                )?,
            ),
            CheckResult::new(
                "timeline_matches_windowed_repayments",
                check_timeline(store, &config)?,
            ),
            CheckResult::new(
                "pivot_round_trips_to_timeline",
                check_pivot(store, &result_of(Question::TimelinePivot))?,
            ),
            CheckResult::new(
                "corrected_ages_are_circular_shift",
                check_corrected_customers(store)?,
            ),
            CheckResult::new(
                "age_category_ranks_are_dense",
                check_ranking(store, &result_of(Question::AgeCategoryRank))?,
            ),
        ],
    };
    for check in &report.checks {
        if check.passed() {
            log::info!("check {} passed", check.name);
        } else {
            log::warn!("check {} failed: {} violation(s)", check.name, check.violations.len());
        }
    }
    Ok(report)
}

/// MIN() over nullable values: NULL only when every value is NULL.
fn min_present<T: PartialOrd>(a: Option<T>, b: Option<T>) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b < a { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Q1: mean of MIN(Income) per customer, grouped by MIN(CustomerClass).
pub fn check_average_income(store: &LoanStore, q1: &ResultSet) -> LoanResult<Vec<String>> {
    let mut income: HashMap<CustomerId, Option<f64>> = HashMap::new();
    for c in store.all_customers()? {
        let e = income.entry(c.customer_id).or_default();
        *e = min_present(e.take(), c.income);
    }
    let mut class: HashMap<CustomerId, Option<String>> = HashMap::new();
    for c in store.all_credit()? {
        let e = class.entry(c.customer_id).or_default();
        *e = min_present(e.take(), c.customer_class);
    }

    // A class whose customers all lack an income still appears, with a NULL average.
    let mut sums: BTreeMap<Option<String>, (f64, usize)> = BTreeMap::new();
    for (id, cls) in &class {
        if let Some(inc) = income.get(id) {
            let e = sums.entry(cls.clone()).or_insert((0.0, 0));
            if let Some(inc) = inc {
                e.0 += inc;
                e.1 += 1;
            }
        }
    }

    let mut violations = Vec::new();
    if q1.len() != sums.len() {
        violations.push(format!("expected {} classes, got {}", sums.len(), q1.len()));
    }
    for i in 0..q1.len() {
        let cls = q1.get(i, "CustomerClass").and_then(|c| c.as_str()).map(String::from);
        let avg = q1.get(i, "AverageIncome").and_then(|c| c.as_f64());
        let Some(&(sum, n)) = sums.get(&cls) else {
            violations.push(format!("row {i}: unexpected class {cls:?}"));
            continue;
        };
        let expected = (n > 0).then(|| sum / n as f64);
        match (expected, avg) {
            (Some(expected), Some(avg))
                if (expected - avg).abs() <= AMOUNT_TOLERANCE * expected.abs().max(1.0) => {}
            (None, None) => {}
            _ => violations.push(format!("class {cls:?}: expected {expected:?}, got {avg:?}")),
        }
    }
    Ok(violations)
}

/// Q2: rejected loans per province, with the region taken as the
/// customer's MIN(TRIM(Region)) and mapped through the province table.
pub fn check_rejected_per_province(
    store: &LoanStore,
    config: &AnalyticsConfig,
    q2: &ResultSet,
) -> LoanResult<Vec<String>> {
    let mut region: HashMap<CustomerId, Option<String>> = HashMap::new();
    for c in store.all_customers()? {
        let e = region.entry(c.customer_id).or_default();
        *e = min_present(e.take(), c.region.map(|r| r.trim_matches(' ').to_string()));
    }

    let mut expected: BTreeMap<Option<String>, i64> = BTreeMap::new();
    for loan in store.all_loans()? {
        let rejected = loan
            .approval_status
            .as_deref()
            .is_some_and(|s| s.trim_matches(' ').eq_ignore_ascii_case("rejected"));
        if !rejected {
            continue;
        }
        let Some(r) = region.get(&loan.customer_id) else {
            continue;
        };
        let province = r.as_ref().map(|r| {
            config
                .provinces
                .iter()
                .find(|p| p.full_name == *r)
                .map_or_else(|| r.clone(), |p| p.abbreviation.clone())
        });
        *expected.entry(province).or_default() += 1;
    }

    let mut actual: BTreeMap<Option<String>, i64> = BTreeMap::new();
    let mut violations = Vec::new();
    let mut previous = i64::MAX;
    for i in 0..q2.len() {
        let province = q2.get(i, "Province").and_then(|c| c.as_str()).map(String::from);
        let Some(count) = q2.get(i, "RejectedApplications").and_then(|c| c.as_i64()) else {
            violations.push(format!("row {i}: missing RejectedApplications"));
            continue;
        };
        if count > previous {
            violations.push(format!("row {i}: counts are not in descending order"));
        }
        previous = count;
        actual.insert(province, count);
    }
    for (province, count) in &expected {
        let got = actual.get(province).copied().unwrap_or(0);
        if got != *count {
            violations.push(format!("province {province:?}: expected {count}, got {got}"));
        }
    }
    for province in actual.keys() {
        if !expected.contains_key(province) {
            violations.push(format!("unexpected province {province:?}"));
        }
    }
    Ok(violations)
}

/// Q4: twelve rows per customer, zero-filled, counting only repayments
/// whose reference time falls inside the window.
pub fn check_timeline(store: &LoanStore, config: &AnalyticsConfig) -> LoanResult<Vec<String>> {
    let clock = ReferenceClock::new(config)?;
    let customers: BTreeSet<CustomerId> =
        store.all_customers()?.iter().map(|c| c.customer_id).collect();

    let mut expected: HashMap<(CustomerId, usize), (i64, f64)> = HashMap::new();
    for r in store.all_repayments()? {
        // DATETIME(NULL) is NULL and never passes the window.
        let Some(date) = r.repayment_date.as_deref() else {
            continue;
        };
        let at = match clock.to_reference(date, r.time_zone.as_deref().unwrap_or_default()) {
            Ok(at) => at,
            Err(e) => {
                log::warn!("repayment {} skipped: {e}", r.repayment_id);
                continue;
            }
        };
        if !clock.in_window(at) {
            continue;
        }
        let e = expected
            .entry((r.customer_id, at.month0() as usize))
            .or_insert((0, 0.0));
        e.0 += 1;
        e.1 += r.amount.unwrap_or_default();
    }

    let rows = store.timeline_rows()?;
    let mut violations = Vec::new();
    if rows.len() != customers.len() * MONTH_NAMES.len() {
        violations.push(format!(
            "expected {} rows, got {}",
            customers.len() * MONTH_NAMES.len(),
            rows.len()
        ));
    }
    for row in &rows {
        let Some(month) = MONTH_NAMES.iter().position(|m| *m == row.month_name) else {
            violations.push(format!("unknown month '{}'", row.month_name));
            continue;
        };
        let (count, amount) = expected
            .get(&(row.customer_id, month))
            .copied()
            .unwrap_or((0, 0.0));
        if row.number_of_repayments != count
            || (row.amount_total - amount).abs() > AMOUNT_TOLERANCE * amount.abs().max(1.0)
        {
            violations.push(format!(
                "customer {} {}: expected {count}/{amount}, got {}/{}",
                row.customer_id, row.month_name, row.number_of_repayments, row.amount_total
            ));
        }
    }
    Ok(violations)
}

/// Q5: the twelve month pairs of each pivot row sum to the customer's
/// timeline totals.
pub fn check_pivot(store: &LoanStore, q5: &ResultSet) -> LoanResult<Vec<String>> {
    let mut totals: BTreeMap<CustomerId, (i64, f64)> = BTreeMap::new();
    for row in store.timeline_rows()? {
        let e = totals.entry(row.customer_id).or_insert((0, 0.0));
        e.0 += row.number_of_repayments;
        e.1 += row.amount_total;
    }

    let mut violations = Vec::new();
    if q5.len() != totals.len() {
        violations.push(format!("expected {} pivot rows, got {}", totals.len(), q5.len()));
    }
    for i in 0..q5.len() {
        let Some(id) = q5.get(i, "CustomerID").and_then(|c| c.as_i64()) else {
            violations.push(format!("row {i}: missing CustomerID"));
            continue;
        };
        let mut count = 0;
        let mut amount = 0.0;
        for month in MONTH_NAMES {
            count += q5
                .get(i, &format!("{month}Repayments"))
                .and_then(|c| c.as_i64())
                .unwrap_or_default();
            amount += q5
                .get(i, &format!("{month}Total"))
                .and_then(|c| c.as_f64())
                .unwrap_or_default();
        }
        let (exp_count, exp_amount) = totals.get(&id).copied().unwrap_or((0, 0.0));
        if count != exp_count
            || (amount - exp_amount).abs() > AMOUNT_TOLERANCE * exp_amount.abs().max(1.0)
        {
            violations.push(format!(
                "customer {id}: pivot {count}/{amount}, timeline {exp_count}/{exp_amount}"
            ));
        }
    }
    Ok(violations)
}

/// Q6: one row per (CustomerID, Gender), and the corrected sequence is
/// the recorded one shifted back two ranks.
pub fn check_corrected_customers(store: &LoanStore) -> LoanResult<Vec<String>> {
    // gender -> customer -> MIN(Age); BTreeMap order matches ORDER BY CustomerID.
    type ByGender = BTreeMap<Option<String>, BTreeMap<CustomerId, Option<i64>>>;
    let mut recorded: ByGender = BTreeMap::new();
    for c in store.all_customers()? {
        let e = recorded
            .entry(c.gender)
            .or_default()
            .entry(c.customer_id)
            .or_default();
        *e = min_present(e.take(), c.age);
    }

    let mut stored: ByGender = BTreeMap::new();
    let mut corrected_by_gender: BTreeMap<Option<String>, Vec<Option<i64>>> = BTreeMap::new();
    for row in store.corrected_customer_rows()? {
        stored
            .entry(row.gender.clone())
            .or_default()
            .insert(row.customer_id, row.age);
        corrected_by_gender
            .entry(row.gender)
            .or_default()
            .push(row.corrected_age);
    }

    let mut violations = Vec::new();
    for (gender, by_id) in &recorded {
        let Some(rows) = stored.get(gender) else {
            violations.push(format!("{gender:?}: partition missing"));
            continue;
        };
        let corrected = corrected_by_gender.get(gender).cloned().unwrap_or_default();
        if by_id.keys().ne(rows.keys()) || corrected.len() != by_id.len() {
            violations.push(format!(
                "{gender:?}: expected {} customers, got {} rows",
                by_id.len(),
                corrected.len()
            ));
            continue;
        }

        let ages: Vec<Option<i64>> = by_id.values().copied().collect();
        if rows.values().ne(by_id.values()) {
            violations.push(format!("{gender:?}: Age column differs from MIN(Age)"));
        }
        if corrected != shift_back(&ages, AGE_SHIFT) {
            violations.push(format!("{gender:?}: CorrectedAge is not a two-rank circular shift"));
        }
        if shift_forward(&corrected, AGE_SHIFT) != ages {
            violations.push(format!("{gender:?}: inverse shift does not recover Age"));
        }
    }
    for gender in stored.keys() {
        if !recorded.contains_key(gender) {
            violations.push(format!("unexpected gender partition {gender:?}"));
        }
    }
    Ok(violations)
}

/// Q7: categories follow CorrectedAge, ranks are dense per category and
/// ordered by repayment count descending (zero for customers who never
/// repaid).
pub fn check_ranking(store: &LoanStore, q7: &ResultSet) -> LoanResult<Vec<String>> {
    let mut repayments: HashMap<CustomerId, i64> = HashMap::new();
    for r in store.all_repayments()? {
        *repayments.entry(r.customer_id).or_default() += 1;
    }

    let mut violations = Vec::new();
    let mut by_category: BTreeMap<String, Vec<(CustomerId, i64, i64)>> = BTreeMap::new();
    for i in 0..q7.len() {
        let id = q7.get(i, "CustomerID").and_then(|c| c.as_i64());
        let corrected = q7.get(i, "CorrectedAge");
        let category = q7.get(i, "AgeCategory").and_then(|c| c.as_str());
        let rank = q7.get(i, "Rank").and_then(|c| c.as_i64());
        let (Some(id), Some(corrected), Some(category), Some(rank)) = (id, corrected, category, rank)
        else {
            violations.push(format!("row {i}: missing column value"));
            continue;
        };
        // A NULL age fails every band comparison and lands in the ELSE band.
        let band = match corrected {
            Cell::Null => AgeCategory::Pensioner,
            other => match other.as_i64() {
                Some(age) => AgeCategory::for_age(age),
                None => {
                    violations.push(format!("customer {id}: CorrectedAge {other} is not an integer"));
                    continue;
                }
            },
        };
        if AgeCategory::from_label(category) != Some(band) {
            violations.push(format!("customer {id}: age {corrected} filed under '{category}'"));
        }
        let count = repayments.get(&id).copied().unwrap_or(0);
        by_category
            .entry(category.to_string())
            .or_default()
            .push((id, count, rank));
    }

    for (category, members) in &by_category {
        let counts: Vec<i64> = members.iter().map(|m| m.1).collect();
        let ranks: Vec<i64> = members.iter().map(|m| m.2).collect();
        if !ranks_are_contiguous(&ranks) {
            violations.push(format!("{category}: ranks are not contiguous from 1"));
        }
        if dense_rank_desc(&counts) != ranks {
            violations.push(format!("{category}: ranks do not follow repayment counts"));
        }
    }
    Ok(violations)
}
