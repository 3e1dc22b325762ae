//! Formula engine
//!
//! Turns a formula template plus two flat data records into a displayable
//! value. Evaluation runs in two stages: field references are substituted
//! with numbers, then the resulting text must pass an arithmetic-only
//! character check before it is parsed and evaluated.
//!
//! Evaluation never fails: every failure mode is encoded in [`FormulaValue`]
//! so callers can always render something.
//!
//! ## Example
//!
//! ```rust
//! use lotledger_core::FieldRecord;
//! use lotledger_formula::{evaluate_formula, FormulaValue};
//!
//! let vehicle = FieldRecord::new()
//!     .with("purchasePrice", 12500.0)
//!     .with("totalExpenses", 570.5);
//!
//! let value = evaluate_formula("{purchasePrice} + {totalExpenses}", &vehicle, None);
//! assert_eq!(value, FormulaValue::Number(13070.5));
//! ```

use std::fmt;

use lotledger_core::{CustomFieldValues, FieldRecord};

use crate::error::{FormulaError, ValidationError};
use crate::evaluator::evaluate;
use crate::options::FormulaOptions;
use crate::parser::parse_formula_with_depth;
use crate::reference::{
    format_number, get_field_references, is_arithmetic_only, replace_references,
    substitute_references,
};

/// Displayed when the substituted formula contains non-arithmetic characters
pub const INVALID_FORMULA: &str = "Invalid formula";
/// Displayed when the formula could not be evaluated
pub const ERROR: &str = "Error";
/// Displayed when the formula divides by zero
pub const DIV_ZERO: &str = "#DIV/0!";
/// Displayed when the result is too large to represent
pub const NOT_FINITE: &str = "#NUM!";

/// Result of evaluating a formula
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "kebab-case"))]
pub enum FormulaValue {
    /// Rounded numeric result
    Number(f64),
    /// The formula has nothing to evaluate
    Empty,
    /// Non-arithmetic characters remained after substitution
    InvalidFormula,
    /// Syntax error or limit exceeded
    Error,
    /// Division by a zero divisor
    DivideByZero,
    /// Result overflowed
    NotFinite,
}

impl FormulaValue {
    /// Get the numeric result, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FormulaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Check if the formula produced a number
    pub fn is_number(&self) -> bool {
        matches!(self, FormulaValue::Number(_))
    }

    /// Check if the value is one of the error sentinels
    pub fn is_error(&self) -> bool {
        !matches!(self, FormulaValue::Number(_) | FormulaValue::Empty)
    }
}

impl fmt::Display for FormulaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaValue::Number(n) => f.write_str(&format_number(*n)),
            FormulaValue::Empty => Ok(()),
            FormulaValue::InvalidFormula => f.write_str(INVALID_FORMULA),
            FormulaValue::Error => f.write_str(ERROR),
            FormulaValue::DivideByZero => f.write_str(DIV_ZERO),
            FormulaValue::NotFinite => f.write_str(NOT_FINITE),
        }
    }
}

/// Evaluation result together with references that resolved to nothing
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: FormulaValue,
    /// Referenced names found in neither record; each counted as zero
    pub unresolved: Vec<String>,
}

/// Outcome of [`validate_formula`] in a serializable shape
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Validation {
    pub valid: bool,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub error: Option<String>,
}

impl From<Result<(), ValidationError>> for Validation {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                error: None,
            },
            Err(e) => Self {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }
}

/// Formula evaluator configured with [`FormulaOptions`]
///
/// Holds no state besides its options, so one engine can be shared freely
/// across threads.
#[derive(Debug, Clone, Default)]
pub struct FormulaEngine {
    options: FormulaOptions,
}

impl FormulaEngine {
    /// Create an engine with the given options
    pub fn new(options: FormulaOptions) -> Self {
        Self { options }
    }

    /// Get the engine options
    pub fn options(&self) -> &FormulaOptions {
        &self.options
    }

    /// Evaluate a formula against vehicle attributes and custom field values
    pub fn evaluate(
        &self,
        formula: &str,
        primary: &FieldRecord,
        secondary: Option<&CustomFieldValues>,
    ) -> FormulaValue {
        self.evaluate_detailed(formula, primary, secondary).value
    }

    /// Evaluate a formula, also reporting references that resolved to nothing
    pub fn evaluate_detailed(
        &self,
        formula: &str,
        primary: &FieldRecord,
        secondary: Option<&CustomFieldValues>,
    ) -> Evaluation {
        let length = formula.chars().count();
        if length > self.options.max_length {
            let err = FormulaError::TooLong {
                length,
                limit: self.options.max_length,
            };
            log::warn!("Formula evaluation error: {err}");
            return Evaluation {
                value: FormulaValue::Error,
                unresolved: Vec::new(),
            };
        }

        let substitution = substitute_references(formula, primary, secondary);
        let value = self.evaluate_expression(&substitution.expression);

        Evaluation {
            value,
            unresolved: substitution.unresolved,
        }
    }

    fn evaluate_expression(&self, expression: &str) -> FormulaValue {
        if !is_arithmetic_only(expression) {
            log::debug!("Rejected non-arithmetic formula: {expression:?}");
            return FormulaValue::InvalidFormula;
        }

        let result = parse_formula_with_depth(expression, self.options.max_depth)
            .and_then(|ast| evaluate(&ast));

        match result {
            Ok(Some(n)) => {
                FormulaValue::Number(self.options.rounding.round(n, self.options.decimal_places))
            }
            Ok(None) => FormulaValue::Empty,
            Err(FormulaError::DivisionByZero) => FormulaValue::DivideByZero,
            Err(FormulaError::NotFinite) => FormulaValue::NotFinite,
            Err(err) => {
                log::warn!("Formula evaluation error: {err}");
                FormulaValue::Error
            }
        }
    }

    /// Check a formula before it is saved
    ///
    /// Field names are not checked: a formula may reference a field that
    /// does not exist yet.
    pub fn validate(&self, formula: &str) -> Result<(), ValidationError> {
        if formula.chars().count() > self.options.max_length {
            return Err(ValidationError::TooLong);
        }

        let mut depth: i64 = 0;
        for c in formula.chars() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(ValidationError::UnmatchedClosingParen);
            }
        }
        if depth != 0 {
            return Err(ValidationError::UnmatchedOpeningParen);
        }

        let dummy = replace_references(formula, "1");
        if !is_arithmetic_only(&dummy) {
            return Err(ValidationError::InvalidCharacters);
        }

        let result = parse_formula_with_depth(&dummy, self.options.max_depth)
            .and_then(|ast| evaluate(&ast));

        match result {
            // A zero divisor depends on the data, not on the formula
            Ok(_) | Err(FormulaError::DivisionByZero) | Err(FormulaError::NotFinite) => {}
            Err(FormulaError::TooDeep { .. }) => return Err(ValidationError::TooDeep),
            Err(_) => return Err(ValidationError::InvalidSyntax),
        }

        // A negative value substitutes with a sign, one level deeper than "1"
        if dummy != formula {
            let negative = replace_references(formula, "-1");
            if let Err(FormulaError::TooDeep { .. }) =
                parse_formula_with_depth(&negative, self.options.max_depth)
            {
                return Err(ValidationError::TooDeep);
            }
        }
        Ok(())
    }

    /// Get all field names referenced by a formula
    pub fn references(&self, formula: &str) -> Vec<String> {
        get_field_references(formula)
    }
}

/// Evaluate a formula with default options
///
/// See [`FormulaEngine::evaluate`].
pub fn evaluate_formula(
    formula: &str,
    primary: &FieldRecord,
    secondary: Option<&CustomFieldValues>,
) -> FormulaValue {
    FormulaEngine::default().evaluate(formula, primary, secondary)
}

/// Validate a formula with default options
///
/// See [`FormulaEngine::validate`].
pub fn validate_formula(formula: &str) -> Result<(), ValidationError> {
    FormulaEngine::default().validate(formula)
}
