//! loanbook-runner: run the loan-dataset questions against a reset database.
//!
//! Usage:
//!   loanbook-runner --db loan.db --question 5 --with-prereqs
//!   loanbook-runner --seed 42 --customers 60 --verify
//!   loanbook-runner --db loan.db --expected ./answers --json
//!   loanbook-runner --question 4 --print-sql

use anyhow::Result;
use loanbook_core::{
    config::AnalyticsConfig,
    fixtures::{sample_dataset, DEFAULT_SAMPLE_CUSTOMERS},
    grading::{grade, ExpectedAnswer, Grade},
    question::Question,
    section::{GradingSection, QuestionOutcome},
    verify::verify_section,
};
use std::env;
use std::path::Path;

#[derive(serde::Serialize)]
struct OutcomeReport<'a> {
    question: u8,
    title: &'static str,
    result: Option<&'a loanbook_core::result_set::ResultSet>,
    grade: Option<Grade>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let customers = parse_arg(&args, "--customers", DEFAULT_SAMPLE_CUSTOMERS);
    let json = has_flag(&args, "--json");
    let with_prereqs = has_flag(&args, "--with-prereqs");
    let db = string_arg(&args, "--db");
    let data_dir = string_arg(&args, "--data-dir").unwrap_or("./data");
    let expected_dir = string_arg(&args, "--expected");
    let question = string_arg(&args, "--question")
        .map(str::parse::<Question>)
        .transpose()?;

    let config = load_config(data_dir)?;
    log::info!(
        "Reference time {} (UTC{:+} min), window {}-{}",
        config.reference_zone,
        config.reference_offset_minutes,
        config.repayment_window.start,
        config.repayment_window.end
    );

    if has_flag(&args, "--print-sql") {
        let catalog = loanbook_core::queries::QueryCatalog::new(config);
        let selected = question.map_or(Question::ALL.to_vec(), |q| vec![q]);
        for q in selected {
            println!("-- {q}");
            println!("{}", catalog.sql(q).trim());
            println!();
        }
        return Ok(());
    }

    let mut section = match db {
        Some(path) => GradingSection::from_file(path, config)?,
        None => {
            log::info!("No --db given; using sample dataset (seed {seed}, {customers} customers)");
            GradingSection::from_dataset(sample_dataset(seed, customers), config)?
        }
    };

    if !json {
        println!("loanbook-runner");
        println!("  db:        {}", db.unwrap_or("<sample>"));
        println!("  data_dir:  {data_dir}");
        println!();
    }

    if has_flag(&args, "--verify") {
        let report = verify_section(&mut section)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            println!("=== VERIFICATION ===");
            for check in &report.checks {
                let status = if check.passed() { "ok" } else { "FAILED" };
                println!("  {:<45} {status}", check.name);
                for v in &check.violations {
                    println!("      - {v}");
                }
            }
        }
        if !report.passed() {
            std::process::exit(1);
        }
        return Ok(());
    }

    let outcomes = match question {
        Some(q) if with_prereqs => vec![section.run_with_prerequisites(q)?],
        Some(q) => vec![section.run(q)?],
        None => section.run_all()?,
    };

    let mut failed = 0usize;
    for outcome in &outcomes {
        let grade = match expected_dir {
            Some(dir) => grade_outcome(Path::new(dir), outcome)?,
            None => None,
        };
        if matches!(grade, Some(Grade::Fail(_))) {
            failed += 1;
        }
        if json {
            let report = OutcomeReport {
                question: outcome.question.number(),
                title: outcome.question.title(),
                result: outcome.result.as_ref(),
                grade,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else {
            print_outcome(outcome, grade.as_ref());
        }
    }

    if failed > 0 {
        log::warn!("{failed} question(s) did not match the expected answer");
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(data_dir: &str) -> Result<AnalyticsConfig> {
    if Path::new(data_dir).join("config/analytics.json").exists() {
        AnalyticsConfig::load(data_dir)
    } else {
        log::warn!("No analytics config under {data_dir}; using built-in defaults");
        Ok(AnalyticsConfig::default())
    }
}

fn grade_outcome(dir: &Path, outcome: &QuestionOutcome) -> Result<Option<Grade>> {
    let Some(expected) = ExpectedAnswer::load(dir, outcome.question)? else {
        log::debug!("No expected answer for {}", outcome.question);
        return Ok(None);
    };
    let actual = outcome.result.clone().unwrap_or_default();
    Ok(Some(grade(&actual, &expected)))
}

fn print_outcome(outcome: &QuestionOutcome, grade: Option<&Grade>) {
    println!("=== {} ===", outcome.question);
    match &outcome.result {
        Some(rs) => print!("{}", rs.to_table_string()),
        None => match outcome.question.produces_table() {
            Some(table) => println!("  (created table {table})"),
            None => println!("  (no rows)"),
        },
    }
    match grade {
        Some(Grade::Pass) => println!("  grade: PASS"),
        Some(Grade::Fail(mismatches)) => {
            println!("  grade: FAIL");
            for m in mismatches {
                println!("      - {m:?}");
            }
        }
        None => {}
    }
    println!();
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn string_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
