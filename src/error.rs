//! Error types for pipeline execution.

use crate::value::Kind;

/// Boxed error raised from inside a user callback.
pub type CallbackError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while running a chain.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// `reduce` without a seed saw no elements, so there is nothing to return.
    #[error("reduce of empty sequence with no initial value")]
    EmptyReduce,

    /// A predicate, transform, rank or equality callback failed.
    #[error("callback failed: {0}")]
    Callback(CallbackError),

    /// `invoke` found no callable under the given name.
    #[error("item has no invocable method '{method}'")]
    NotInvocable { method: String },

    /// Group keys must be value-typed.
    #[error("cannot group by a {kind} key")]
    UnhashableKey { kind: Kind },
}

impl LinkError {
    /// Wrap an arbitrary error (or message) raised by a callback.
    pub fn callback(err: impl Into<CallbackError>) -> Self {
        LinkError::Callback(err.into())
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, LinkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_reduce_displays() {
        assert_eq!(
            LinkError::EmptyReduce.to_string(),
            "reduce of empty sequence with no initial value"
        );
    }

    #[test]
    fn callback_wraps_message() {
        let err = LinkError::callback("boom");
        assert_eq!(err.to_string(), "callback failed: boom");
    }

    #[test]
    fn callback_wraps_io_error() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err = LinkError::callback(inner);
        assert!(err.to_string().contains("disk"), "got: {err}");
    }

    #[test]
    fn unhashable_key_names_kind() {
        let err = LinkError::UnhashableKey { kind: Kind::List };
        assert_eq!(err.to_string(), "cannot group by a list key");
    }
}
