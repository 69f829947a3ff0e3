//! DAO implementations, organized by backend.

pub mod postgres;

pub use postgres::*;
