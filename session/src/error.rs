//! Error types for the session queue.

use std::fmt;

/// The session loop stopped and dropped its end of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClosed;

impl fmt::Display for SessionClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "drawing session is closed")
    }
}

impl std::error::Error for SessionClosed {}
