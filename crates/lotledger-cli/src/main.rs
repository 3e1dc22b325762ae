//! lotledger CLI - evaluate and check custom-field formulas

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use lotledger::prelude::*;
use lotledger::{AvailableField, Validation};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lotledger")]
#[command(author, version, about = "Custom-field formula tool for vehicle inventory")]
struct Cli {
    #[command(flatten)]
    formula: FormulaArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Formula engine settings shared by every subcommand
#[derive(Args)]
struct FormulaArgs {
    /// Decimal places results are rounded to
    #[arg(long, global = true, default_value_t = 2)]
    decimals: u32,

    /// Tie-breaking rule: half-up or half-even
    #[arg(long, global = true, default_value = "half-up")]
    rounding: RoundingMode,

    /// Maximum nesting of parentheses and signs
    #[arg(long, global = true, default_value_t = 64)]
    max_depth: usize,

    /// Maximum formula length in characters
    #[arg(long, global = true, default_value_t = 4096)]
    max_length: usize,
}

impl FormulaArgs {
    fn options(&self) -> FormulaOptions {
        FormulaOptions {
            decimal_places: self.decimals,
            rounding: self.rounding,
            max_depth: self.max_depth,
            max_length: self.max_length,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a formula and print the result
    Eval {
        /// Formula text, e.g. "{listingPrice} - {purchasePrice}"
        formula: String,

        /// JSON object of vehicle attributes
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// JSON object of custom field values
        #[arg(short, long)]
        custom: Option<PathBuf>,

        /// Set a vehicle attribute (repeatable)
        #[arg(short, long = "set", value_name = "NAME=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
    },

    /// Check a formula before saving it
    Validate {
        /// Formula text
        formula: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the field names a formula references
    Refs {
        /// Formula text
        formula: String,

        /// Print each name once
        #[arg(short, long)]
        unique: bool,
    },

    /// Calculate every formula field of a vehicle
    Calc {
        /// Vehicle JSON file
        #[arg(long)]
        vehicle: PathBuf,

        /// JSON array of custom field definitions
        #[arg(long)]
        fields: PathBuf,

        /// Date days in inventory are counted to (default: today)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the names formulas can reference
    Fields {
        /// JSON array of custom field definitions
        #[arg(long)]
        fields: PathBuf,
    },
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();
    let options = cli.formula.options();

    match cli.command {
        Commands::Eval {
            formula,
            data,
            custom,
            set,
        } => eval(&formula, data.as_deref(), custom.as_deref(), set, options),
        Commands::Validate { formula, json } => validate(&formula, json, options),
        Commands::Refs { formula, unique } => refs(&formula, unique),
        Commands::Calc {
            vehicle,
            fields,
            today,
            json,
        } => calc(&vehicle, &fields, today, json, options),
        Commands::Fields { fields } => list_fields(&fields, options),
    }
}

fn eval(
    formula: &str,
    data: Option<&Path>,
    custom: Option<&Path>,
    set: Vec<(String, String)>,
    options: FormulaOptions,
) -> Result<ExitCode> {
    let mut primary = match data {
        Some(path) => read_json::<FieldRecord>(path)?,
        None => FieldRecord::new(),
    };
    for (name, value) in set {
        primary.insert(name, FieldValue::Text(value));
    }

    let custom = custom.map(read_custom_values).transpose()?;

    let evaluation = FormulaEngine::new(options).evaluate_detailed(formula, &primary, custom.as_ref());
    if !evaluation.unresolved.is_empty() {
        log::warn!(
            "Unresolved references counted as 0: {}",
            evaluation.unresolved.join(", ")
        );
    }

    println!("{}", evaluation.value);
    Ok(ExitCode::SUCCESS)
}

fn validate(formula: &str, json: bool, options: FormulaOptions) -> Result<ExitCode> {
    let validation = Validation::from(FormulaEngine::new(options).validate(formula));

    if json {
        let text = serde_json::to_string_pretty(&validation).context("Failed to encode result")?;
        println!("{}", text);
    } else if let Some(error) = &validation.error {
        println!("{}", error);
    } else {
        println!("valid");
    }

    Ok(if validation.valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn refs(formula: &str, unique: bool) -> Result<ExitCode> {
    let mut names = lotledger::get_field_references(formula);
    if unique {
        let mut seen = std::collections::HashSet::new();
        names.retain(|name| seen.insert(name.clone()));
    }

    for name in names {
        println!("{}", name);
    }
    Ok(ExitCode::SUCCESS)
}

fn calc(
    vehicle: &Path,
    fields: &Path,
    today: Option<NaiveDate>,
    json: bool,
    options: FormulaOptions,
) -> Result<ExitCode> {
    let vehicle: Vehicle = read_json(vehicle)?;
    let registry = load_registry(fields, options)?;

    // The registry already carries the engine options
    let options = CalculationOptions {
        today: today.unwrap_or_else(|| chrono::Local::now().date_naive()),
        formula: None,
    };
    let report = vehicle.calculate_with_options(&registry, &options);

    if json {
        let text = serde_json::to_string_pretty(&report).context("Failed to encode report")?;
        println!("{}", text);
    } else {
        for result in &report.results {
            println!("{}\t{}", result.name, result.value);
        }
    }

    eprintln!(
        "Calculated {} formula fields ({} errors)",
        report.stats.formula_count, report.stats.errors
    );
    Ok(ExitCode::SUCCESS)
}

fn list_fields(fields: &Path, options: FormulaOptions) -> Result<ExitCode> {
    let registry = load_registry(fields, options)?;

    for AvailableField { name, label } in registry.available_formula_fields() {
        if name == label {
            println!("{}", name);
        } else {
            println!("{}\t{}", name, label);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Save every definition in the file, in order, into a fresh registry
fn load_registry(path: &Path, options: FormulaOptions) -> Result<FieldRegistry> {
    let definitions: Vec<CustomField> = read_json(path)?;

    let mut registry = FieldRegistry::with_options(options);
    for field in definitions {
        let name = field.name.clone();
        registry
            .save(field)
            .with_context(|| format!("Invalid field '{}' in '{}'", name, path.display()))?;
    }
    Ok(registry)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse '{}'", path.display()))
}

/// Read stored custom values, accepting JSON numbers and booleans as text
fn read_custom_values(path: &Path) -> Result<CustomFieldValues> {
    let raw: HashMap<String, serde_json::Value> = read_json(path)?;

    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| {
            let text = match value {
                serde_json::Value::Null => return None,
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            Some((name, text))
        })
        .collect())
}

fn parse_assignment(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", s))?;
    if name.trim().is_empty() {
        return Err(format!("missing name in '{}'", s));
    }
    Ok((name.trim().to_string(), value.to_string()))
}
