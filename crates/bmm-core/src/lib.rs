//! # BMM Core
//!
//! Core types shared by the bare-metal infrastructure data access layer:
//!
//! ```text
//! error.rs        BmmError / not-found sentinel / sqlx error mapping
//! result.rs       BmmResult alias
//! pagination.rs   PageInput, OrderBy, Page
//! validation.rs   validator integration
//! telemetry.rs    tracing + OpenTelemetry bootstrap (feature "telemetry")
//! ```

pub mod error;
pub mod pagination;
pub mod result;
pub mod telemetry;
pub mod validation;

pub use error::*;
pub use pagination::*;
pub use result::*;
pub use telemetry::*;
pub use validation::*;

// Re-export shaku for dependency injection
pub use shaku::Interface;
