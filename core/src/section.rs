//! A grading section: one reset of the database, questions run in order.
//!
//! RULES:
//!   - Every section starts from the pristine source; nothing written by an
//!     earlier section is visible.
//!   - Linked questions (Q4 → Q5, Q6 → Q7) share state only through the
//!     tables the first one materializes.
//!   - A question whose prerequisite table is missing fails before any of
//!     its SQL runs.

use crate::{
    config::AnalyticsConfig,
    error::{LoanError, LoanResult},
    queries::QueryCatalog,
    question::Question,
    result_set::ResultSet,
    store::LoanStore,
    types::Dataset,
};
use std::path::PathBuf;
use std::time::Instant;

/// Where a reset restores the database from.
#[derive(Debug, Clone)]
pub enum SectionSource {
    /// Pristine database file, copied over `scratch` on every reset.
    File { pristine: PathBuf, scratch: PathBuf },
    /// Dataset loaded into a fresh in-memory database on every reset.
    Dataset(Dataset),
}

#[derive(Debug, Clone)]
pub struct QuestionOutcome {
    pub question: Question,
    pub result: Option<ResultSet>,
}

pub struct GradingSection {
    source: SectionSource,
    catalog: QueryCatalog,
    pub store: LoanStore,
}

impl GradingSection {
    pub fn new(source: SectionSource, config: AnalyticsConfig) -> LoanResult<Self> {
        let store = Self::restore(&source)?;
        Ok(Self {
            source,
            catalog: QueryCatalog::new(config),
            store,
        })
    }

    /// Section over an in-memory copy of `dataset`.
    pub fn from_dataset(dataset: Dataset, config: AnalyticsConfig) -> LoanResult<Self> {
        Self::new(SectionSource::Dataset(dataset), config)
    }

    /// Section over a database file. The scratch copy lives next to it.
    pub fn from_file(pristine: impl Into<PathBuf>, config: AnalyticsConfig) -> LoanResult<Self> {
        let pristine = pristine.into();
        let mut scratch = pristine.clone().into_os_string();
        scratch.push(".scratch");
        Self::new(
            SectionSource::File {
                pristine,
                scratch: scratch.into(),
            },
            config,
        )
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    /// Throw away everything written since the last reset.
    pub fn reset(&mut self) -> LoanResult<()> {
        // Close the scratch connection before its file is overwritten.
        let placeholder = LoanStore::in_memory()?;
        drop(std::mem::replace(&mut self.store, placeholder));
        self.store = Self::restore(&self.source)?;
        log::info!("Section reset");
        Ok(())
    }

    fn restore(source: &SectionSource) -> LoanResult<LoanStore> {
        match source {
            SectionSource::File { pristine, scratch } => {
                std::fs::copy(pristine, scratch)?;
                let path = scratch.to_string_lossy();
                LoanStore::open(&path)
            }
            SectionSource::Dataset(data) => {
                let store = LoanStore::in_memory()?;
                store.migrate()?;
                store.load_dataset(data)?;
                Ok(store)
            }
        }
    }

    /// Run one question against the current state of the section.
    pub fn run(&mut self, question: Question) -> LoanResult<QuestionOutcome> {
        if let Some(pre) = question.prerequisite() {
            let table = pre.produces_table().unwrap_or_default();
            if !self.store.table_exists(table)? {
                return Err(LoanError::MissingPrerequisite {
                    question: question.number(),
                    table,
                });
            }
        }

        let sql = self.catalog.sql(question);
        let started = Instant::now();
        let result = self.store.run_batch(&sql)?;
        log::info!(
            "{question} finished in {:?}, {} row(s) returned",
            started.elapsed(),
            result.as_ref().map_or(0, ResultSet::len)
        );
        if let Some(table) = question.produces_table() {
            log::debug!("{table}: {} row(s)", self.store.row_count(table)?);
        }
        Ok(QuestionOutcome { question, result })
    }

    /// Run the linked prerequisite first (if any), then the question.
    pub fn run_with_prerequisites(&mut self, question: Question) -> LoanResult<QuestionOutcome> {
        if let Some(pre) = question.prerequisite() {
            self.run(pre)?;
        }
        self.run(question)
    }

    /// Run Q1..Q7 in order on one database state.
    pub fn run_all(&mut self) -> LoanResult<Vec<QuestionOutcome>> {
        Question::ALL.iter().map(|&q| self.run(q)).collect()
    }
}
