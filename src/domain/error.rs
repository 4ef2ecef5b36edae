use thiserror::Error;

/// Errors raised by the chain engine and by handlers running inside it
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Handler not found.")]
    HandlerNotFound,

    #[error("No further handlers registered.")]
    NoFurtherHandlers,

    #[error("No handlers registered.")]
    NoHandlers,

    #[error("Cannot access head for empty callstack.")]
    EmptyHead,

    #[error("Cannot pop an empty callstack.")]
    EmptyPop,

    #[error("Cannot split an empty execution stack")]
    SplitEmptyStack,

    #[error("'{op}' operation not supported on empty stack frame")]
    EmptyFrame { op: &'static str },

    #[error("Unsupported yield operation: {0}")]
    UnsupportedYield(String),

    #[error("No handler named '{0}' is registered")]
    UnknownHandler(String),

    #[error("Handler '{0}' is already registered")]
    DuplicateHandler(String),

    #[error("Execution finished without a result")]
    Incomplete,

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}

impl ChainError {
    pub fn empty_frame(op: &'static str) -> Self {
        Self::EmptyFrame { op }
    }

    pub fn unsupported_yield(value: impl Into<String>) -> Self {
        Self::UnsupportedYield(value.into())
    }

    pub fn unknown_handler(name: impl Into<String>) -> Self {
        Self::UnknownHandler(name.into())
    }

    pub fn duplicate_handler(name: impl Into<String>) -> Self {
        Self::DuplicateHandler(name.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Error raised by handler code
    pub fn handler(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Handler(anyhow::Error::msg(message))
    }

    /// Whether this error comes from misuse of the stack machinery rather than a handler
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Handler(_))
    }
}
