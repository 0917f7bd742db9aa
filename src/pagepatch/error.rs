use thiserror::Error;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid locator path: {0}")]
    InvalidLocator(String),

    #[error("Element is detached from the document")]
    Detached,

    #[error("Node not found: {0}")]
    NodeNotFound(usize),

    #[error("Corrupt patch record: {0}")]
    CorruptRecord(String),

    #[error("Unsupported store schema version {found} (max supported {supported})")]
    UnsupportedSchema { found: u32, supported: u32 },

    #[error("Session error: {0}")]
    Session(String),

    #[error("Api Error: {0}")]
    Api(String),
}

pub type Result<T> = std::result::Result<T, PatchError>;
