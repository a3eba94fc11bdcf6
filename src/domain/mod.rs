//! Core domain types and logic.

pub mod error;
pub mod expr;
pub mod indicator;
pub mod parser;
pub mod request;
