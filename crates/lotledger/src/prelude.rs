//! Prelude module - common imports for lotledger users
//!
//! ```rust
//! use lotledger::prelude::*;
//! ```

pub use crate::{
    // Calculation
    calculate_fields,
    calculate_vehicle,
    CalculationOptions,
    CalculationReport,
    // Field definitions
    CustomField,
    CustomFieldValues,
    // Error types
    Error,
    Expense,
    FieldRecord,
    FieldRegistry,
    FieldType,
    FieldValue,
    // Formula engine
    FormulaEngine,
    FormulaOptions,
    FormulaValue,
    Result,
    RoundingMode,
    // Main types
    Vehicle,
    // Extension traits
    VehicleCalculationExt,
};
