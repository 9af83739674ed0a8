use thiserror::Error;

pub type Result<T> = std::result::Result<T, TableError>;

#[derive(Error, Debug)]
pub enum TableError {
    /// The key has no value in the table. Callers distinguish this from
    /// transient failures: a missing key is usually "no data", not an
    /// error.
    #[error("no such key")]
    NoSuchKey,

    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

impl TableError {
    pub fn is_no_such_key(&self) -> bool {
        matches!(self, Self::NoSuchKey)
    }
}
