#[derive(Debug, Clone, PartialEq)]
pub enum RepositoryError {
    NotFound,
    InvalidData(String),
    StorageError(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "Record not found"),
            RepositoryError::InvalidData(msg) => write!(f, "Invalid stored data: {}", msg),
            RepositoryError::StorageError(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<anyhow::Error> for RepositoryError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain on one line
        RepositoryError::StorageError(format!("{:#}", err))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
