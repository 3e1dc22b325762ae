//! Custom field definitions

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Kind of value a custom field holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
    /// One of a fixed list of options
    Select,
    /// Computed at read time from other fields, never stored
    Formula,
}

impl FieldType {
    /// Get the lowercase name used in stored definitions
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Select => "select",
            FieldType::Formula => "formula",
        }
    }

    /// Whether values of this type can be referenced from a formula
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Number | FieldType::Formula)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "boolean" => Ok(FieldType::Boolean),
            "select" => Ok(FieldType::Select),
            "formula" => Ok(FieldType::Formula),
            other => Err(Error::other(format!("Unknown field type: {}", other))),
        }
    }
}

/// A user-defined attribute attachable to every vehicle
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CustomField {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub field_type: FieldType,
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: bool,
    /// Choices for [`FieldType::Select`] fields
    #[cfg_attr(feature = "serde", serde(default))]
    pub options: Vec<String>,
    /// Formula text for [`FieldType::Formula`] fields
    #[cfg_attr(feature = "serde", serde(default))]
    pub formula: Option<String>,
}

impl CustomField {
    /// Create a new field of the given type
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            field_type,
            required: false,
            options: Vec::new(),
            formula: None,
        }
    }

    /// Create a new formula field
    pub fn formula<I: Into<String>, N: Into<String>, F: Into<String>>(
        id: I,
        name: N,
        formula: F,
    ) -> Self {
        Self {
            formula: Some(formula.into()),
            ..Self::new(id, name, FieldType::Formula)
        }
    }

    /// Create a new select field
    pub fn select<I, N, O, S>(id: I, name: N, options: O) -> Self
    where
        I: Into<String>,
        N: Into<String>,
        O: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            ..Self::new(id, name, FieldType::Select)
        }
    }

    /// Builder-style setter for the required flag
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Check if this is a formula field
    pub fn is_formula(&self) -> bool {
        self.field_type == FieldType::Formula
    }

    /// Get the formula text, if this is a formula field
    pub fn formula_text(&self) -> Option<&str> {
        if self.is_formula() {
            self.formula.as_deref()
        } else {
            None
        }
    }

    /// Check that the definition is self-consistent and clean it up
    ///
    /// Trims the name, drops blank select options, clears the required flag
    /// on formula fields and the formula on every other field type.
    pub fn normalize(mut self) -> Result<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::EmptyFieldName);
        }
        self.name = name.to_string();

        match self.field_type {
            FieldType::Formula => {
                let has_formula = self
                    .formula
                    .as_deref()
                    .map_or(false, |f| !f.trim().is_empty());
                if !has_formula {
                    return Err(Error::MissingFormula(self.name));
                }
                self.required = false;
                self.options.clear();
            }
            FieldType::Select => {
                self.options = self
                    .options
                    .into_iter()
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect();
                if self.options.is_empty() {
                    return Err(Error::MissingOptions(self.name));
                }
                self.formula = None;
            }
            _ => {
                self.options.clear();
                self.formula = None;
            }
        }

        Ok(self)
    }
}
