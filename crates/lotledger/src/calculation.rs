//! Vehicle calculation
//!
//! Evaluates every formula field of a [`FieldRegistry`] against one vehicle,
//! in dependency order, so a formula field can reference another formula
//! field's result. Results are computed on demand and never stored on the
//! vehicle.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use lotledger::prelude::*;
//!
//! let mut registry = FieldRegistry::new();
//! registry
//!     .save(CustomField::formula("1", "Markup", "{listingPrice} - {purchasePrice}"))
//!     .unwrap();
//!
//! let today = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
//! let mut vehicle = Vehicle::new("v1", "1HGCM82633A004352", today);
//! vehicle.purchase_price = Some("12500".parse().unwrap());
//! vehicle.listing_price = Some("15995".parse().unwrap());
//!
//! let report = vehicle.calculate(&registry);
//! assert_eq!(report.value("Markup"), Some(FormulaValue::Number(3495.0)));
//! ```

use chrono::NaiveDate;

use lotledger_formula::reference::format_number;

use crate::{
    CustomField, CustomFieldValues, FieldRecord, FieldRegistry, FormulaEngine, FormulaOptions,
    FormulaValue, Vehicle,
};

/// Options for vehicle calculation
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationOptions {
    /// Date `daysInInventory` is counted up to (default: the local date)
    pub today: NaiveDate,
    /// Formula engine options; `None` uses the options the registry
    /// validated its formulas with
    pub formula: Option<FormulaOptions>,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            today: chrono::Local::now().date_naive(),
            formula: None,
        }
    }
}

/// Statistics from a calculation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalculationStats {
    /// Total number of formula fields
    pub formula_count: usize,
    /// Number of fields that produced a number
    pub fields_calculated: usize,
    /// Number of fields whose result is a sentinel rather than a number
    pub errors: usize,
    /// Number of references that resolved to nothing
    pub unresolved_references: usize,
}

/// Result for a single formula field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldResult {
    pub field_id: String,
    pub name: String,
    pub value: FormulaValue,
    /// Referenced names found nowhere, counted as zero
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Vec::is_empty"))]
    pub unresolved: Vec<String>,
}

/// Every formula field result for one vehicle, in evaluation order
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CalculationReport {
    pub results: Vec<FieldResult>,
    pub stats: CalculationStats,
}

impl CalculationReport {
    /// Get the result of a field by name, falling back to id
    pub fn get(&self, name_or_id: &str) -> Option<&FieldResult> {
        self.results
            .iter()
            .find(|r| r.name == name_or_id)
            .or_else(|| self.results.iter().find(|r| r.field_id == name_or_id))
    }

    /// Get the value of a field by name, falling back to id
    pub fn value(&self, name_or_id: &str) -> Option<FormulaValue> {
        self.get(name_or_id).map(|r| r.value)
    }
}

/// Extension trait for Vehicle to add calculation methods
pub trait VehicleCalculationExt {
    /// Calculate all formula fields with default options
    fn calculate(&self, registry: &FieldRegistry) -> CalculationReport;

    /// Calculate all formula fields with custom options
    fn calculate_with_options(
        &self,
        registry: &FieldRegistry,
        options: &CalculationOptions,
    ) -> CalculationReport;
}

impl VehicleCalculationExt for Vehicle {
    fn calculate(&self, registry: &FieldRegistry) -> CalculationReport {
        self.calculate_with_options(registry, &CalculationOptions::default())
    }

    fn calculate_with_options(
        &self,
        registry: &FieldRegistry,
        options: &CalculationOptions,
    ) -> CalculationReport {
        calculate_vehicle(registry, self, options)
    }
}

/// Calculate every formula field of `registry` for one vehicle
pub fn calculate_vehicle(
    registry: &FieldRegistry,
    vehicle: &Vehicle,
    options: &CalculationOptions,
) -> CalculationReport {
    let primary = vehicle.attributes(options.today);
    let formula = options
        .formula
        .clone()
        .unwrap_or_else(|| registry.engine().options().clone());

    let mut engine = CalculationEngine::new(registry, &vehicle.custom_field_values, formula);
    engine.calculate_all(&primary)
}

/// Calculate every formula field of `registry` against explicit records
///
/// `stored` holds custom field values keyed by field id, as they are kept on
/// a vehicle. Formulas are evaluated with the registry's own options.
pub fn calculate_fields(
    registry: &FieldRegistry,
    primary: &FieldRecord,
    stored: &CustomFieldValues,
) -> CalculationReport {
    let options = registry.engine().options().clone();
    let mut engine = CalculationEngine::new(registry, stored, options);
    engine.calculate_all(primary)
}

/// The calculation engine
struct CalculationEngine<'a> {
    registry: &'a FieldRegistry,
    engine: FormulaEngine,
    /// Custom field values visible to formulas, keyed by id and by name
    values: CustomFieldValues,
}

impl<'a> CalculationEngine<'a> {
    fn new(registry: &'a FieldRegistry, stored: &CustomFieldValues, options: FormulaOptions) -> Self {
        Self {
            registry,
            engine: FormulaEngine::new(options),
            values: collect_values(registry, stored),
        }
    }

    fn calculate_all(&mut self, primary: &FieldRecord) -> CalculationReport {
        let registry = self.registry;
        let order = registry.evaluation_order();
        log::debug!(
            "Calculating {} formula fields: {}",
            order.len(),
            order
                .iter()
                .map(|f| f.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut report = CalculationReport::default();
        report.stats.formula_count = order.len();

        for field in order {
            let result = self.calculate_field(field, primary);

            if result.value.is_number() {
                report.stats.fields_calculated += 1;
            } else if result.value.is_error() {
                report.stats.errors += 1;
            }
            report.stats.unresolved_references += result.unresolved.len();
            report.results.push(result);
        }

        report
    }

    fn calculate_field(&mut self, field: &CustomField, primary: &FieldRecord) -> FieldResult {
        let formula = field.formula_text().unwrap_or_default();
        let evaluation = self
            .engine
            .evaluate_detailed(formula, primary, Some(&self.values));

        if !evaluation.unresolved.is_empty() {
            log::debug!(
                "Field '{}' references unknown names: {}",
                field.name,
                evaluation.unresolved.join(", ")
            );
        }

        // Later formula fields read this result like a stored value
        if let Some(n) = evaluation.value.as_number() {
            let text = format_number(n);
            if owns_reference(self.registry, field, &field.id) {
                self.values.insert(field.id.clone(), text.clone());
            }
            self.values.insert(field.name.clone(), text);
        }

        FieldResult {
            field_id: field.id.clone(),
            name: field.name.clone(),
            value: evaluation.value,
            unresolved: evaluation.unresolved,
        }
    }
}

/// Stored values keyed the way the registry resolves references
///
/// Values stored under a formula field are dropped: formula results are only
/// ever computed. A field name shadows an id of the same spelling.
fn collect_values(registry: &FieldRegistry, stored: &CustomFieldValues) -> CustomFieldValues {
    let mut values: CustomFieldValues = stored
        .iter()
        .filter(|(key, _)| registry.get(key).map_or(true, |f| !f.is_formula()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    for field in registry.fields() {
        values.remove(&field.name);
    }
    for field in registry.fields().iter().filter(|f| !f.is_formula()) {
        if let Some(value) = stored.get(&field.id) {
            values.insert(field.name.clone(), value.clone());
        }
    }
    values
}

/// Whether `reference` resolves to `field` in the registry
fn owns_reference(registry: &FieldRegistry, field: &CustomField, reference: &str) -> bool {
    registry
        .find(reference)
        .map_or(false, |found| found.id == field.id)
}
