use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// No context is installed for the current task. Always a wiring defect.
    #[error("scope context required but none is installed")]
    ContextRequired,
    #[error("invalid scope context: {0}")]
    InvalidContext(String),
}

pub type ScopeResult<T> = Result<T, ScopeError>;
