use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Unsupported value at {path}: {kind}")]
    UnsupportedValue { path: String, kind: String },

    #[error("Nesting deeper than {limit} levels at {path}, the value is cyclic or too deep")]
    DepthLimitExceeded { path: String, limit: usize },

    #[error("Cannot convert an undefined value without an enclosing attribute set")]
    UndefinedRoot,

    #[error("Malformed {node}: {reason}")]
    MalformedNode { node: &'static str, reason: String },
}

impl Error {
    pub(crate) fn malformed(node: &'static str, reason: impl Into<String>) -> Self {
        Error::MalformedNode {
            node,
            reason: reason.into(),
        }
    }
}
