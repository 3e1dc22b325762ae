//! # lotledger-formula
//!
//! Custom-field formula engine for lotledger.
//!
//! This crate provides:
//! - Field reference extraction and substitution (`{purchasePrice}` → `12500`)
//! - An arithmetic-only safety check on the substituted text
//! - Arithmetic parsing (text → AST) and evaluation (AST → number)
//! - Authoring-time formula validation
//! - Dependency tracking between formula fields
//!
//! ## Example
//!
//! ```rust
//! use lotledger_core::FieldRecord;
//! use lotledger_formula::{evaluate_formula, validate_formula, FormulaValue};
//!
//! let formula = "(({listingPrice} - {purchasePrice}) / {listingPrice}) * 100";
//! assert!(validate_formula(formula).is_ok());
//!
//! let vehicle = FieldRecord::new()
//!     .with("listingPrice", 16000.0)
//!     .with("purchasePrice", 12500.0);
//! assert_eq!(evaluate_formula(formula, &vehicle, None), FormulaValue::Number(21.88));
//! ```

pub mod ast;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod options;
pub mod parser;
pub mod reference;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::DependencyGraph;
pub use engine::{
    evaluate_formula, validate_formula, Evaluation, FormulaEngine, FormulaValue, Validation,
};
pub use error::{FormulaError, FormulaResult, ValidationError};
pub use evaluator::evaluate;
pub use options::{FormulaOptions, RoundingMode};
pub use parser::parse_formula;
pub use reference::get_field_references;
