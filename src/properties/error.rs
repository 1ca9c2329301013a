use thiserror::Error;

#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("malformed contribution table: {0}")]
    Table(#[from] serde_json::Error),
    #[error("estimator needs a '{expected}' catalog, got '{found}'")]
    WrongModel { expected: String, found: String },
    #[error("group '{0}' has no contribution row")]
    MissingContribution(String),
    #[error("group '{0}' is not in the catalog")]
    UnknownGroup(String),
    #[error("no groups to estimate from")]
    NoGroups,
}
