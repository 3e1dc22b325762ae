//! Formula evaluator
//!
//! Evaluates arithmetic ASTs to produce numbers.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};

/// Evaluate a formula expression
///
/// Returns `None` for [`FormulaExpr::Empty`]. A zero divisor fails with
/// [`FormulaError::DivisionByZero`]; any other operation that leaves the finite
/// range fails with [`FormulaError::NotFinite`].
pub fn evaluate(expr: &FormulaExpr) -> FormulaResult<Option<f64>> {
    match expr {
        FormulaExpr::Empty => Ok(None),
        _ => evaluate_number(expr).map(Some),
    }
}

fn evaluate_number(expr: &FormulaExpr) -> FormulaResult<f64> {
    let value = match expr {
        FormulaExpr::Number(n) => *n,
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right)?,
        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand)?,
        FormulaExpr::Empty => {
            return Err(FormulaError::Parse("Empty operand".into()));
        }
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(FormulaError::NotFinite)
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
) -> FormulaResult<f64> {
    // Evaluate operands first
    let l = evaluate_number(left)?;
    let r = evaluate_number(right)?;

    match op {
        BinaryOperator::Add => Ok(l + r),
        BinaryOperator::Subtract => Ok(l - r),
        BinaryOperator::Multiply => Ok(l * r),
        BinaryOperator::Divide => {
            if r == 0.0 {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(l / r)
            }
        }
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(op: UnaryOperator, operand: &FormulaExpr) -> FormulaResult<f64> {
    let n = evaluate_number(operand)?;

    match op {
        UnaryOperator::Negate => Ok(-n),
        UnaryOperator::Plus => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;

    fn eval(formula: &str) -> FormulaResult<Option<f64>> {
        let ast = parse_formula(formula)?;
        evaluate(&ast)
    }

    #[test]
    fn test_evaluate_number() {
        assert_eq!(eval("42").unwrap(), Some(42.0));
        assert_eq!(eval("3.14").unwrap(), Some(3.14));
    }

    #[test]
    fn test_evaluate_empty() {
        assert_eq!(eval("   ").unwrap(), None);
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("1+2").unwrap(), Some(3.0));
        assert_eq!(eval("5-3").unwrap(), Some(2.0));
        assert_eq!(eval("4*5").unwrap(), Some(20.0));
        assert_eq!(eval("10/4").unwrap(), Some(2.5));
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval("1+2*3").unwrap(), Some(7.0));
        assert_eq!(eval("(1+2)*3").unwrap(), Some(9.0));
        assert_eq!(eval("8-3-1").unwrap(), Some(4.0));
        assert_eq!(eval("24/4/2").unwrap(), Some(3.0));
    }

    #[test]
    fn test_evaluate_unary() {
        assert_eq!(eval("-5").unwrap(), Some(-5.0));
        assert_eq!(eval("--5").unwrap(), Some(5.0));
        assert_eq!(eval("+5").unwrap(), Some(5.0));
        assert_eq!(eval("10 - -5").unwrap(), Some(15.0));
        assert_eq!(eval("-(2+3)*2").unwrap(), Some(-10.0));
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        assert_eq!(eval("1/0"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval("0/0"), Err(FormulaError::DivisionByZero));
        assert_eq!(eval("1/(2-2)"), Err(FormulaError::DivisionByZero));
    }

    #[test]
    fn test_evaluate_overflow() {
        let huge = "9".repeat(400);
        assert_eq!(eval(&huge), Err(FormulaError::NotFinite));

        let big = format!("1{}", "0".repeat(300));
        assert_eq!(eval(&format!("{big} * {big}")), Err(FormulaError::NotFinite));
    }
}
