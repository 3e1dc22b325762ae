//! Vehicle inventory records
//!
//! A [`Vehicle`] carries its stored attributes plus the expenses logged
//! against it. [`Vehicle::attributes`] flattens it into the [`FieldRecord`]
//! that formulas read from, including the derived financial figures.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::value::{CustomFieldValues, FieldRecord, FieldValue};

/// Built-in numeric attributes that formulas can reference
///
/// Pairs of (attribute name, label).
pub const NUMERIC_ATTRIBUTES: &[(&str, &str)] = &[
    ("purchasePrice", "Purchase Price"),
    ("listingPrice", "Listing Price"),
    ("totalExpenses", "Total Expenses"),
    ("daysInInventory", "Days in Inventory"),
    ("mileage", "Mileage"),
    ("year", "Year"),
];

/// Every attribute name produced by [`Vehicle::attributes`]
pub const ATTRIBUTE_NAMES: &[&str] = &[
    "id",
    "vin",
    "make",
    "model",
    "trim",
    "color",
    "status",
    "year",
    "mileage",
    "purchasePrice",
    "listingPrice",
    "totalExpenses",
    "totalCost",
    "estimatedProfit",
    "daysInInventory",
];

/// A cost logged against a vehicle
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Expense {
    pub id: String,
    pub category: String,
    pub amount: Decimal,
    #[cfg_attr(feature = "serde", serde(default))]
    pub description: Option<String>,
    pub date: NaiveDate,
}

impl Expense {
    /// Create a new expense
    pub fn new<I: Into<String>, C: Into<String>>(
        id: I,
        category: C,
        amount: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            amount,
            description: None,
            date,
        }
    }
}

/// A vehicle held in inventory
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Vehicle {
    pub id: String,
    pub vin: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub make: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub model: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub year: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub trim: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub color: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub mileage: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub purchase_price: Option<Decimal>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub purchase_date: Option<NaiveDate>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub listing_price: Option<Decimal>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: Option<String>,
    pub created_at: NaiveDate,
    #[cfg_attr(feature = "serde", serde(default))]
    pub expenses: Vec<Expense>,
    /// Stored custom field values, keyed by field id
    #[cfg_attr(feature = "serde", serde(default))]
    pub custom_field_values: CustomFieldValues,
}

impl Vehicle {
    /// Create a vehicle with only the required attributes set
    pub fn new<I: Into<String>, V: Into<String>>(id: I, vin: V, created_at: NaiveDate) -> Self {
        Self {
            id: id.into(),
            vin: vin.into(),
            make: None,
            model: None,
            year: None,
            trim: None,
            color: None,
            mileage: None,
            purchase_price: None,
            purchase_date: None,
            listing_price: None,
            status: None,
            created_at,
            expenses: Vec::new(),
            custom_field_values: CustomFieldValues::new(),
        }
    }

    /// Sum of all expense amounts
    pub fn total_expenses(&self) -> Decimal {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    /// Purchase price plus expenses
    pub fn total_cost(&self) -> Decimal {
        self.purchase_price.unwrap_or_default() + self.total_expenses()
    }

    /// Listing price minus total cost
    pub fn estimated_profit(&self) -> Decimal {
        self.listing_price.unwrap_or_default() - self.total_cost()
    }

    /// Whole days between acquisition and `today`
    ///
    /// Uses the purchase date, or the creation date if none was recorded.
    pub fn days_in_inventory(&self, today: NaiveDate) -> i64 {
        let since = self.purchase_date.unwrap_or(self.created_at);
        (today - since).num_days()
    }

    /// Flatten into the attribute record formulas are evaluated against
    pub fn attributes(&self, today: NaiveDate) -> FieldRecord {
        FieldRecord::new()
            .with("id", self.id.as_str())
            .with("vin", self.vin.as_str())
            .with("make", self.make.clone())
            .with("model", self.model.clone())
            .with("trim", self.trim.clone())
            .with("color", self.color.clone())
            .with("status", self.status.clone())
            .with("year", self.year)
            .with("mileage", self.mileage)
            .with("purchasePrice", self.purchase_price.map(money))
            .with("listingPrice", self.listing_price.map(money))
            .with("totalExpenses", money(self.total_expenses()))
            .with("totalCost", money(self.total_cost()))
            .with("estimatedProfit", money(self.estimated_profit()))
            .with("daysInInventory", self.days_in_inventory(today))
    }
}

fn money(amount: Decimal) -> FieldValue {
    amount
        .to_f64()
        .map(FieldValue::Number)
        .unwrap_or(FieldValue::Null)
}
