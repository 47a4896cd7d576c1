use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Line {line}: {reason}")]
    MalformedRow { line: usize, reason: String },

    #[error("{unmatched} 1099-B lot(s) sold on {selldate} could not be matched")]
    Unresolved { selldate: NaiveDate, unmatched: usize },

    #[error("Expected {expected} choice(s) for lots sold on {selldate}, got {got}")]
    ChoiceCount {
        selldate: NaiveDate,
        expected: usize,
        got: usize,
    },

    #[error("Choice {choice} for lots sold on {selldate} is out of range (0..{available})")]
    InvalidChoice {
        selldate: NaiveDate,
        choice: usize,
        available: usize,
    },
}

pub type Result<T> = std::result::Result<T, ImportError>;
