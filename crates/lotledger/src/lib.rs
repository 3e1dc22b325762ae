//! # lotledger
//!
//! Custom fields and formula calculation for a used-car inventory.
//!
//! Dealers define their own fields on top of the built-in vehicle
//! attributes. Formula fields compute a number from other fields, e.g.
//! `{listingPrice} - {totalCost}`, and are evaluated per vehicle on demand.
//!
//! ## Features
//!
//! - Field definitions with save-time formula validation
//! - Circular reference rejection between formula fields
//! - Dependency-ordered calculation of every formula field on a vehicle
//! - Configurable rounding and formula limits
//!
//! ## Example
//!
//! ```rust
//! use lotledger::prelude::*;
//!
//! let mut registry = FieldRegistry::new();
//! registry
//!     .save(CustomField::formula("1", "Margin %", "({listingPrice} - {totalCost}) / {listingPrice} * 100"))
//!     .unwrap();
//!
//! let vehicle = FieldRecord::new()
//!     .with("listingPrice", 16000.0)
//!     .with("totalCost", 12500.0);
//!
//! let report = calculate_fields(
//!     &registry,
//!     &vehicle,
//!     &CustomFieldValues::new(),
//! );
//! assert_eq!(report.value("Margin %"), Some(FormulaValue::Number(21.88)));
//! ```

pub mod calculation;
pub mod prelude;
pub mod registry;

// Re-export calculation types
pub use calculation::{
    calculate_fields, calculate_vehicle, CalculationOptions, CalculationReport, CalculationStats,
    FieldResult, VehicleCalculationExt,
};
pub use registry::{AvailableField, FieldRegistry};

// Re-export core types
pub use lotledger_core::{
    CustomField, CustomFieldValues, Error, Expense, FieldRecord, FieldType, FieldValue, Result,
    Vehicle, ATTRIBUTE_NAMES, NUMERIC_ATTRIBUTES,
};

// Re-export formula types
pub use lotledger_formula::{
    evaluate_formula, get_field_references, validate_formula, DependencyGraph, Evaluation,
    FormulaEngine, FormulaError, FormulaOptions, FormulaValue, RoundingMode, Validation,
    ValidationError,
};
