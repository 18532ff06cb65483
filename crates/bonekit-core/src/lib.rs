//! # bonekit-core
//!
//! Core crate for Bonekit. Contains configuration schemas, the dynamic
//! value and field model, search criteria and predicates, pagination types,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Bonekit crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
