//! Error types for byte cursor operations.

use std::fmt;

/// Result type for byte cursor operations.
pub type ByteResult<T> = Result<T, ByteError>;

/// Errors that can occur while reading or writing a bounded buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ByteError {
    /// Attempted to read past the end of the buffer.
    UnexpectedEof {
        /// Number of bytes requested.
        requested: usize,
        /// Number of bytes available.
        available: usize,
    },

    /// Attempted to write more bytes than the buffer can hold.
    ///
    /// Nothing is written when this is returned; the writer position is unchanged.
    BufferOverflow {
        /// Number of bytes attempted to write.
        attempted: usize,
        /// Number of bytes still free.
        available: usize,
    },
}

impl fmt::Display for ByteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof {
                requested,
                available,
            } => {
                write!(
                    f,
                    "attempted to read {requested} bytes but only {available} bytes available"
                )
            }
            Self::BufferOverflow {
                attempted,
                available,
            } => {
                write!(
                    f,
                    "attempted to write {attempted} bytes but only {available} bytes free"
                )
            }
        }
    }
}

impl std::error::Error for ByteError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_unexpected_eof() {
        let err = ByteError::UnexpectedEof {
            requested: 4,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("4 bytes"), "should mention requested bytes");
        assert!(msg.contains("3 bytes"), "should mention available bytes");
        assert!(msg.contains("read"), "should mention read operation");
    }

    #[test]
    fn error_display_buffer_overflow() {
        let err = ByteError::BufferOverflow {
            attempted: 6,
            available: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains('6'), "should mention attempted bytes");
        assert!(msg.contains('2'), "should mention free bytes");
        assert!(msg.contains("write"), "should mention write operation");
    }

    #[test]
    fn error_equality() {
        let err1 = ByteError::UnexpectedEof {
            requested: 2,
            available: 1,
        };
        let err2 = err1.clone();
        let err3 = ByteError::UnexpectedEof {
            requested: 2,
            available: 0,
        };
        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<ByteError>();
    }
}
