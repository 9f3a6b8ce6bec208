use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Question {question} requires table '{table}'; run its linked question first")]
    MissingPrerequisite { question: u8, table: &'static str },

    #[error("Unknown question '{0}'")]
    UnknownQuestion(String),

    #[error("Invalid repayment timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type LoanResult<T> = Result<T, LoanError>;
