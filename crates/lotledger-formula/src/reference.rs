//! Field references
//!
//! A field reference is a `{name}` token: an opening brace, one or more
//! characters other than `}`, and a closing brace. References are resolved
//! against the primary record first and the custom field values second, then
//! replaced in the formula text by the decimal form of their numeric value.

use lazy_regex::{regex, Regex};
use lotledger_core::{CustomFieldValues, FieldRecord, FieldValue};

fn reference_pattern() -> &'static Regex {
    regex!(r"\{([^}]+)\}")
}

/// Get all field names referenced by a formula
///
/// Names are returned in order of appearance, duplicates included.
///
/// # Example
/// ```rust
/// use lotledger_formula::get_field_references;
///
/// let refs = get_field_references("{a} + {b} + {a}");
/// assert_eq!(refs, vec!["a", "b", "a"]);
/// ```
pub fn get_field_references(formula: &str) -> Vec<String> {
    reference_pattern()
        .captures_iter(formula)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Replace every field reference with `placeholder`
pub fn replace_references(formula: &str, placeholder: &str) -> String {
    reference_pattern().replace_all(formula, placeholder).into_owned()
}

/// Result of substituting field values into a formula
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    /// Formula text with every reference replaced by a number
    pub expression: String,
    /// Referenced names found in neither record, in order of appearance
    pub unresolved: Vec<String>,
}

/// Substitute field values for every reference in a formula
///
/// A name present in `primary` (even as [`FieldValue::Null`]) is taken from
/// there; only absent names are looked up in `secondary`. Values that are
/// missing or not numeric count as zero.
pub fn substitute_references(
    formula: &str,
    primary: &FieldRecord,
    secondary: Option<&CustomFieldValues>,
) -> Substitution {
    let mut expression = String::with_capacity(formula.len());
    let mut unresolved = Vec::new();
    let mut last = 0;

    for caps in reference_pattern().captures_iter(formula) {
        let (whole, name) = match (caps.get(0), caps.get(1)) {
            (Some(whole), Some(name)) => (whole, name.as_str()),
            _ => continue,
        };

        let value = match primary.get(name) {
            Some(value) => coerce_number(value),
            None => match secondary.and_then(|values| values.get(name)) {
                Some(text) => parse_numeric_text(text),
                None => {
                    unresolved.push(name.to_string());
                    0.0
                }
            },
        };

        expression.push_str(&formula[last..whole.start()]);
        expression.push_str(&format_number(value));
        last = whole.end();
    }
    expression.push_str(&formula[last..]);

    Substitution {
        expression,
        unresolved,
    }
}

/// Check that text contains only digits, whitespace, `+ - * / ( ) .`
///
/// Empty text does not pass.
pub fn is_arithmetic_only(text: &str) -> bool {
    !text.is_empty()
        && text.chars().all(|c| {
            c.is_ascii_digit() || c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.')
        })
}

/// Coerce an attribute value to a number
///
/// Booleans count as 1 or 0, text is parsed, and anything that does not
/// yield a non-zero number (null, NaN, unparseable text) becomes `0`.
pub fn coerce_number(value: &FieldValue) -> f64 {
    let n = match value {
        FieldValue::Null => 0.0,
        FieldValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        FieldValue::Number(n) => *n,
        FieldValue::Text(s) => return parse_numeric_text(s),
    };
    or_zero(n)
}

/// Parse text the way a stored field value is read as a number
///
/// Accepts surrounding whitespace, signed decimal literals with optional
/// fraction and exponent, unsigned `0x`/`0o`/`0b` integers and `Infinity`.
/// Blank or unparseable text becomes `0`.
pub fn parse_numeric_text(text: &str) -> f64 {
    let s = text.trim();

    let n = match s {
        "" => 0.0,
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => parse_radix_integer(s).unwrap_or_else(|| parse_decimal(s)),
    };
    or_zero(n)
}

/// Format a number for insertion into an arithmetic expression
///
/// Finite values use plain positional notation, never exponent form.
pub fn format_number(n: f64) -> String {
    if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        format!("{}", n)
    }
}

fn or_zero(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        0.0
    } else {
        n
    }
}

fn parse_decimal(s: &str) -> f64 {
    // Rust also accepts "inf" and "nan", which are not numbers here
    let literal = s
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !literal {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

fn parse_radix_integer(s: &str) -> Option<f64> {
    let prefix = s.get(..2)?;
    let radix = match prefix {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };

    let digits = &s[2..];
    if digits.is_empty() {
        return Some(f64::NAN);
    }

    let value = digits
        .chars()
        .try_fold(0f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * radix as f64 + d as f64)
        })
        .unwrap_or(f64::NAN);
    Some(value)
}
