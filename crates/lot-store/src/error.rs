use thiserror::Error;

#[derive(Error, Debug)]
pub enum LotFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row {row}: invalid {column} '{value}'")]
    InvalidField {
        row: usize,
        column: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, LotFileError>;
