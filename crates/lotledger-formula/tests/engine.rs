//! Behaviour of the three public formula operations on vehicle-shaped data

use lotledger_core::{CustomFieldValues, FieldRecord, FieldValue};
use lotledger_formula::{
    evaluate_formula, get_field_references, validate_formula, FormulaEngine, FormulaValue,
    Validation, ValidationError,
};
use pretty_assertions::assert_eq;

fn vehicle() -> FieldRecord {
    FieldRecord::new()
        .with("purchasePrice", 12500.0)
        .with("listingPrice", 15995.0)
        .with("totalExpenses", 570.5)
        .with("daysInInventory", 30)
        .with("mileage", 48000)
        .with("year", 2019)
        .with("make", "Honda")
}

#[test]
fn test_total_cost() {
    assert_eq!(
        evaluate_formula("{purchasePrice} + {totalExpenses}", &vehicle(), None),
        FormulaValue::Number(13070.5)
    );
}

#[test]
fn test_profit_margin() {
    let formula = "(({listingPrice} - {purchasePrice} - {totalExpenses}) / {listingPrice}) * 100";
    assert_eq!(validate_formula(formula), Ok(()));
    // 2924.5 / 15995 * 100 = 18.2838...
    assert_eq!(
        evaluate_formula(formula, &vehicle(), None),
        FormulaValue::Number(18.28)
    );
}

#[test]
fn test_cost_per_day() {
    let formula = "({purchasePrice} + {totalExpenses}) / {daysInInventory}";
    // 13070.5 / 30 = 435.683...
    assert_eq!(
        evaluate_formula(formula, &vehicle(), None),
        FormulaValue::Number(435.68)
    );

    let fresh = vehicle().with("daysInInventory", 0);
    assert_eq!(
        evaluate_formula(formula, &fresh, None),
        FormulaValue::DivideByZero
    );
}

#[test]
fn test_custom_field_values_by_name() {
    let mut custom = CustomFieldValues::new();
    custom.insert("Number of Keys".into(), "2".into());
    custom.insert("Previous Owner".into(), "J. Smith".into());

    assert_eq!(
        evaluate_formula("{Number of Keys} * 50", &vehicle(), Some(&custom)),
        FormulaValue::Number(100.0)
    );
    assert_eq!(
        evaluate_formula("{Previous Owner} + 1", &vehicle(), Some(&custom)),
        FormulaValue::Number(1.0)
    );
}

#[test]
fn test_primary_wins_over_custom_values() {
    let mut custom = CustomFieldValues::new();
    custom.insert("year".into(), "1999".into());

    assert_eq!(
        evaluate_formula("{year}", &vehicle(), Some(&custom)),
        FormulaValue::Number(2019.0)
    );

    let unknown_year = vehicle().with("year", FieldValue::Null);
    assert_eq!(
        evaluate_formula("{year}", &unknown_year, Some(&custom)),
        FormulaValue::Number(0.0)
    );
}

#[test]
fn test_text_attribute_counts_as_zero() {
    assert_eq!(
        evaluate_formula("{make} * 2 + 1", &vehicle(), None),
        FormulaValue::Number(1.0)
    );
}

#[test]
fn test_reference_extraction() {
    assert_eq!(
        get_field_references("{a} + {b} + {a}"),
        vec!["a".to_string(), "b".to_string(), "a".to_string()]
    );
}

#[test]
fn test_unresolved_references_are_reported() {
    let evaluation = FormulaEngine::default().evaluate_detailed(
        "{purchasePrice} + {reconditioning} + {transport}",
        &vehicle(),
        None,
    );
    assert_eq!(evaluation.value, FormulaValue::Number(12500.0));
    assert_eq!(
        evaluation.unresolved,
        vec!["reconditioning".to_string(), "transport".to_string()]
    );
}

#[test]
fn test_validation_messages() {
    let cases = [
        ("({a} + 1", "Unmatched opening parenthesis"),
        ("{a} + 1)", "Unmatched closing parenthesis"),
        ("{a} % 2", "Invalid characters in formula"),
        ("{a} {b}", "Invalid formula syntax"),
    ];

    for (formula, message) in cases {
        assert_eq!(
            Validation::from(validate_formula(formula)),
            Validation {
                valid: false,
                error: Some(message.to_string()),
            },
            "formula: {formula}"
        );
    }
}

#[test]
fn test_validate_does_not_check_field_names() {
    assert_eq!(validate_formula("{fieldCreatedLater} / 2"), Ok(()));
    assert!(matches!(
        validate_formula("{a} + alert(1)"),
        Err(ValidationError::InvalidCharacters)
    ));
}
