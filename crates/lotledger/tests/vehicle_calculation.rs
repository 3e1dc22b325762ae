//! End-to-end calculation of dealer-defined formula fields on a vehicle

use chrono::NaiveDate;
use lotledger::prelude::*;
use lotledger::{CalculationStats, FieldResult};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn options() -> CalculationOptions {
    CalculationOptions {
        today: date(2024, 2, 9),
        formula: None,
    }
}

fn vehicle() -> Vehicle {
    let mut vehicle = Vehicle::new("v1", "1HGCM82633A004352", date(2024, 1, 5));
    vehicle.make = Some("Honda".into());
    vehicle.model = Some("Accord".into());
    vehicle.year = Some(2019);
    vehicle.mileage = Some(48_000);
    vehicle.purchase_price = Some(Decimal::new(1_250_000, 2));
    vehicle.listing_price = Some(Decimal::new(1_599_500, 2));
    vehicle.purchase_date = Some(date(2024, 1, 10));
    vehicle.expenses = vec![
        Expense::new("e1", "Detailing", Decimal::new(15_000, 2), date(2024, 1, 12)),
        Expense::new("e2", "Repairs", Decimal::new(42_050, 2), date(2024, 1, 20)),
    ];
    vehicle
        .custom_field_values
        .insert("keys".into(), "2".into());
    vehicle
}

fn registry() -> FieldRegistry {
    FieldRegistry::from_fields([
        CustomField::select("source", "Vehicle Source", ["Auction", "Trade-In"]),
        CustomField::new("keys", "Number of Keys", FieldType::Number),
        CustomField::formula("margin", "Margin %", "({listingPrice} - {Total Cost}) / {listingPrice} * 100"),
        CustomField::formula("per-day", "Cost Per Day", "{Total Cost} / {daysInInventory}"),
        CustomField::formula("cost", "Total Cost", "{purchasePrice} + {totalExpenses}"),
        CustomField::formula("key-cost", "Key Cost", "{Number of Keys} * 150"),
        CustomField::formula("budget", "Budget Left", "{Recon Budget} - {totalExpenses}"),
    ])
    .unwrap()
}

#[test]
fn test_calculate_vehicle() {
    let report = calculate_vehicle(&registry(), &vehicle(), &options());

    let values: Vec<(&str, FormulaValue)> = report
        .results
        .iter()
        .map(|r| (r.name.as_str(), r.value))
        .collect();
    assert_eq!(
        values,
        vec![
            ("Total Cost", FormulaValue::Number(13070.5)),
            ("Margin %", FormulaValue::Number(18.28)),
            ("Cost Per Day", FormulaValue::Number(435.68)),
            ("Key Cost", FormulaValue::Number(300.0)),
            ("Budget Left", FormulaValue::Number(-570.5)),
        ]
    );
    assert_eq!(
        report.stats,
        CalculationStats {
            formula_count: 5,
            fields_calculated: 5,
            errors: 0,
            unresolved_references: 1,
        }
    );
}

#[test]
fn test_unresolved_reference_reported() {
    let report = calculate_vehicle(&registry(), &vehicle(), &options());

    assert_eq!(
        report.get("budget"),
        Some(&FieldResult {
            field_id: "budget".into(),
            name: "Budget Left".into(),
            value: FormulaValue::Number(-570.5),
            unresolved: vec!["Recon Budget".into()],
        })
    );
}

#[test]
fn test_new_arrival_divides_by_zero() {
    let mut vehicle = vehicle();
    vehicle.purchase_date = Some(date(2024, 2, 9));

    let report = vehicle.calculate_with_options(&registry(), &options());

    assert_eq!(report.value("Cost Per Day"), Some(FormulaValue::DivideByZero));
    assert_eq!(report.value("Cost Per Day").map(|v| v.to_string()), Some("#DIV/0!".into()));
    assert_eq!(report.value("Total Cost"), Some(FormulaValue::Number(13070.5)));
    assert_eq!(report.stats.errors, 1);
}

#[test]
fn test_vehicle_without_prices() {
    let vehicle = Vehicle::new("v2", "JH4KA7561PC008269", date(2024, 2, 1));
    let report = vehicle.calculate_with_options(&registry(), &options());

    assert_eq!(report.value("Total Cost"), Some(FormulaValue::Number(0.0)));
    // Listing price is missing, so the margin divides by zero
    assert_eq!(report.value("Margin %"), Some(FormulaValue::DivideByZero));
    assert_eq!(report.value("Key Cost"), Some(FormulaValue::Number(0.0)));
}

#[test]
fn test_editing_a_formula_changes_results() {
    let mut registry = registry();
    registry
        .save(CustomField::formula(
            "cost",
            "Total Cost",
            "{purchasePrice} + {totalExpenses} + 250",
        ))
        .unwrap();

    let report = calculate_vehicle(&registry, &vehicle(), &options());
    assert_eq!(report.value("Total Cost"), Some(FormulaValue::Number(13320.5)));
    // 13320.5 / 30 = 444.016...
    assert_eq!(report.value("Cost Per Day"), Some(FormulaValue::Number(444.02)));
}

#[test]
fn test_cycle_is_rejected_before_calculation() {
    let mut registry = registry();
    let err = registry
        .save(CustomField::formula(
            "cost",
            "Total Cost",
            "{purchasePrice} + {Cost Per Day}",
        ))
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Circular reference detected: Total Cost -> Cost Per Day -> Total Cost"
    );
    let report = calculate_vehicle(&registry, &vehicle(), &options());
    assert_eq!(report.value("Total Cost"), Some(FormulaValue::Number(13070.5)));
}

#[test]
fn test_every_saved_formula_evaluates() {
    let registry = registry();
    let report = calculate_vehicle(&registry, &Vehicle::new("v3", "X", date(2024, 1, 1)), &options());

    for result in &report.results {
        assert!(
            !matches!(result.value, FormulaValue::Error | FormulaValue::InvalidFormula),
            "{} evaluated to {:?}",
            result.name,
            result.value
        );
    }
}
