//! # lotledger-core
//!
//! Core data structures for the lotledger vehicle inventory library.
//!
//! This crate provides the plain data the formula engine reads from:
//! - [`FieldValue`] and [`FieldRecord`] - Named attribute values
//! - [`CustomFieldValues`] - Stored values of user-defined fields
//! - [`CustomField`] and [`FieldType`] - User-defined field definitions
//! - [`Vehicle`] and [`Expense`] - Inventory records and their derived figures
//!
//! ## Example
//!
//! ```rust
//! use lotledger_core::{FieldRecord, FieldValue};
//!
//! let record = FieldRecord::new()
//!     .with("purchasePrice", 12500.0)
//!     .with("make", "Honda");
//!
//! assert_eq!(record.get("purchasePrice"), Some(&FieldValue::Number(12500.0)));
//! ```

pub mod error;
pub mod field;
pub mod value;
pub mod vehicle;

// Re-exports for convenience
pub use error::{Error, Result};
pub use field::{CustomField, FieldType};
pub use value::{CustomFieldValues, FieldRecord, FieldValue};
pub use vehicle::{Expense, Vehicle, ATTRIBUTE_NAMES, NUMERIC_ATTRIBUTES};
