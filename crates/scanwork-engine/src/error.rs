use std::fmt;
use std::time::Duration;

/// Errors surfaced by the scan and sort entry points.
///
/// Every variant aborts the whole call; nothing is retried.
#[derive(Debug)]
pub enum ComputeError {
    /// Rejected before any buffer is created (bad sizes, mismatched inputs).
    Configuration(String),

    /// Device acquisition, allocation or read-back failed.
    Resource(anyhow::Error),

    /// The chunk-sum array does not fit the single-workgroup second stage.
    Capacity {
        /// Number of chunk sums the call needs (after power-of-two padding).
        required: usize,
        /// Largest number of chunk sums the configured stage can scan.
        limit: usize,
    },

    /// Read-back did not complete within the configured bound.
    Timeout(Duration),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, ComputeError>;

impl ComputeError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn resource(msg: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Self {
        Self::Resource(anyhow::Error::msg(msg))
    }
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::Resource(err) => write!(f, "resource error: {err:#}"),
            Self::Capacity { required, limit } => write!(
                f,
                "capacity error: {required} chunk sums exceed the single-stage limit of {limit}"
            ),
            Self::Timeout(after) => {
                write!(f, "read-back did not complete within {} ms", after.as_millis())
            }
        }
    }
}

impl std::error::Error for ComputeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Resource(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<anyhow::Error> for ComputeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Resource(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_message_names_both_sizes() {
        let err = ComputeError::Capacity {
            required: 4096,
            limit: 2048,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096"));
        assert!(msg.contains("2048"));
    }

    #[test]
    fn resource_keeps_context_chain() {
        let inner = anyhow::anyhow!("adapter missing").context("failed to acquire device");
        let err = ComputeError::from(inner);
        let msg = err.to_string();
        assert!(msg.contains("failed to acquire device"));
        assert!(msg.contains("adapter missing"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn configuration_has_no_source() {
        let err = ComputeError::config("chunk size must be a power of two");
        assert!(std::error::Error::source(&err).is_none());
        assert_eq!(
            err.to_string(),
            "configuration error: chunk size must be a power of two"
        );
    }
}
