//! Result type aliases for the data access layer.

use crate::BmmError;

/// A specialized `Result` type for DAO operations.
pub type BmmResult<T> = Result<T, BmmError>;
