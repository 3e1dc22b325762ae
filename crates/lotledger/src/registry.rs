//! Custom field definitions shared by every vehicle
//!
//! [`FieldRegistry`] is where field definitions are saved. Saving checks the
//! definition, validates formulas and refuses formulas that would make formula
//! fields depend on each other in a loop, so every registry that exists can be
//! evaluated in a fixed order.

use crate::{
    get_field_references, CustomField, DependencyGraph, Error, FormulaEngine, FormulaOptions,
    Result, ATTRIBUTE_NAMES, NUMERIC_ATTRIBUTES,
};

/// A name that can be offered when building a formula
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AvailableField {
    /// Name to write between braces
    pub name: String,
    /// Human-readable label
    pub label: String,
}

/// The set of custom field definitions
#[derive(Debug, Clone, Default)]
pub struct FieldRegistry {
    /// Definitions in the order they were first saved
    fields: Vec<CustomField>,
    /// Edges between field ids, built from formula references
    graph: DependencyGraph,
    engine: FormulaEngine,
}

impl FieldRegistry {
    /// Create an empty registry using default formula options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry that validates formulas with `options`
    pub fn with_options(options: FormulaOptions) -> Self {
        Self {
            engine: FormulaEngine::new(options),
            ..Self::default()
        }
    }

    /// Build a registry by saving each field in turn
    pub fn from_fields<I: IntoIterator<Item = CustomField>>(fields: I) -> Result<Self> {
        let mut registry = Self::new();
        for field in fields {
            registry.save(field)?;
        }
        Ok(registry)
    }

    /// Insert a field, or replace the field with the same id
    pub fn save(&mut self, field: CustomField) -> Result<&CustomField> {
        let field = field.normalize()?;

        if ATTRIBUTE_NAMES.contains(&field.name.as_str()) {
            return Err(Error::ReservedFieldName(field.name));
        }

        let lowered = field.name.to_lowercase();
        if self
            .fields
            .iter()
            .any(|f| f.id != field.id && f.name.to_lowercase() == lowered)
        {
            return Err(Error::DuplicateFieldName(field.name));
        }

        if let Some(formula) = field.formula_text() {
            self.engine
                .validate(formula)
                .map_err(|e| Error::InvalidFormula {
                    field: field.name.clone(),
                    message: e.to_string(),
                })?;
        }

        let mut candidate = self.fields.clone();
        let index = match candidate.iter().position(|f| f.id == field.id) {
            Some(index) => {
                candidate[index] = field;
                index
            }
            None => {
                candidate.push(field);
                candidate.len() - 1
            }
        };

        // A rename can close a loop just like a formula edit can
        let graph = build_graph(&candidate);
        let saved = &candidate[index];
        if let Some(cycle) = graph.find_cycle(&saved.id) {
            let path = cycle
                .iter()
                .map(|id| field_name(&candidate, id))
                .collect::<Vec<_>>()
                .join(" -> ");
            log::warn!("Rejected field '{}': circular reference {}", saved.name, path);
            return Err(Error::CircularReference(path));
        }

        log::info!(
            "Saved {} field '{}' ({})",
            saved.field_type,
            saved.name,
            saved.id
        );

        self.fields = candidate;
        self.graph = graph;
        Ok(&self.fields[index])
    }

    /// Remove a field by id
    ///
    /// Formulas that referenced the field keep working; the reference then
    /// resolves to nothing and counts as zero.
    pub fn remove(&mut self, id: &str) -> Result<CustomField> {
        let index = self
            .fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| Error::FieldNotFound(id.to_string()))?;

        let dependents: Vec<&str> = self.dependents(id).iter().map(|f| f.name.as_str()).collect();
        if !dependents.is_empty() {
            log::warn!(
                "Removing field '{}' still referenced by: {}",
                self.fields[index].name,
                dependents.join(", ")
            );
        }

        let removed = self.fields.remove(index);
        self.graph = build_graph(&self.fields);
        Ok(removed)
    }

    /// Get a field by id
    pub fn get(&self, id: &str) -> Option<&CustomField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Find the field a formula reference points at
    ///
    /// Matches the field name first, then the field id.
    pub fn find(&self, name_or_id: &str) -> Option<&CustomField> {
        resolve(&self.fields, name_or_id)
    }

    /// All fields in the order they were first saved
    pub fn fields(&self) -> &[CustomField] {
        &self.fields
    }

    /// Formula fields in the order they were first saved
    pub fn formula_fields(&self) -> impl Iterator<Item = &CustomField> {
        self.fields.iter().filter(|f| f.is_formula())
    }

    /// Formula fields whose formulas reference the given field
    pub fn dependents(&self, id: &str) -> Vec<&CustomField> {
        let mut dependents: Vec<&CustomField> = self
            .graph
            .get_dependents(id)
            .filter_map(|dep| self.get(dep))
            .collect();
        dependents.sort_by(|a, b| self.position(&a.id).cmp(&self.position(&b.id)));
        dependents
    }

    /// Formula fields ordered so every field comes after the fields it uses
    pub fn evaluation_order(&self) -> Vec<&CustomField> {
        let ids: Vec<&str> = self.formula_fields().map(|f| f.id.as_str()).collect();
        self.graph
            .evaluation_order(&ids)
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    /// Names a formula can reference
    ///
    /// Built-in numeric vehicle attributes come first, followed by every
    /// number and formula custom field.
    pub fn available_formula_fields(&self) -> Vec<AvailableField> {
        let builtin = NUMERIC_ATTRIBUTES.iter().map(|(name, label)| AvailableField {
            name: name.to_string(),
            label: label.to_string(),
        });
        let custom = self
            .fields
            .iter()
            .filter(|f| f.field_type.is_numeric())
            .map(|f| AvailableField {
                name: f.name.clone(),
                label: f.name.clone(),
            });
        builtin.chain(custom).collect()
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if there are no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Get the engine used to validate formulas
    pub fn engine(&self) -> &FormulaEngine {
        &self.engine
    }

    fn position(&self, id: &str) -> usize {
        self.fields
            .iter()
            .position(|f| f.id == id)
            .unwrap_or(usize::MAX)
    }
}

fn resolve<'a>(fields: &'a [CustomField], reference: &str) -> Option<&'a CustomField> {
    fields
        .iter()
        .find(|f| f.name == reference)
        .or_else(|| fields.iter().find(|f| f.id == reference))
}

fn field_name<'a>(fields: &'a [CustomField], id: &'a str) -> &'a str {
    fields
        .iter()
        .find(|f| f.id == id)
        .map_or(id, |f| f.name.as_str())
}

/// Build the graph of field ids from every formula's references
///
/// References to vehicle attributes are read from the vehicle itself and
/// never point at a field.
fn build_graph(fields: &[CustomField]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for field in fields {
        let formula = match field.formula_text() {
            Some(formula) => formula,
            None => continue,
        };
        let precedents: Vec<&str> = get_field_references(formula)
            .iter()
            .filter(|name| !ATTRIBUTE_NAMES.contains(&name.as_str()))
            .filter_map(|name| resolve(fields, name))
            .map(|f| f.id.as_str())
            .collect();
        graph.set_precedents(&field.id, precedents);
    }
    graph
}
