use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid node id: {0}")]
    InvalidId(String),

    #[error("lineage must contain at least one id")]
    EmptyLineage,

    #[error("`{0}` is a reserved property name")]
    ReservedProperty(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
