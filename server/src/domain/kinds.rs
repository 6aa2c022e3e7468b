//! Value kinds and their per-kind strategy table
//!
//! Every kind registers a `parse` (lexical coercion of raw text), a
//! `validate` (range and shape checks on an already typed value) and a
//! `format` (canonical text that parses back to the same value). The set of
//! kinds is closed; lookups of any other tag fail with `UnknownKind`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::error::StoreError;

/// Maximum stored length of a string value, in characters
pub const STRING_MAX_CHARS: usize = 5000;

/// Fractional digits kept by the decimal kind
pub const DECIMAL_PLACES: u32 = 6;

/// Total significant digits allowed by the decimal kind
pub const DECIMAL_MAX_DIGITS: u32 = 15;

const DECIMAL_SCALE: i64 = 10i64.pow(DECIMAL_PLACES);
const DECIMAL_MAX_INTEGRAL_DIGITS: usize = (DECIMAL_MAX_DIGITS - DECIMAL_PLACES) as usize;
const DECIMAL_LIMIT: i64 = 10i64.pow(DECIMAL_MAX_DIGITS);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Int,
    Float,
    Decimal,
    String,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Int, Kind::Float, Kind::Decimal, Kind::String];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Decimal => "decimal",
            Kind::String => "string",
        }
    }

    /// Value table holding this kind's records
    pub fn table_name(&self) -> &'static str {
        match self {
            Kind::Int => "int_values",
            Kind::Float => "float_values",
            Kind::Decimal => "decimal_values",
            Kind::String => "string_values",
        }
    }

    /// Free text may begin with something timestamp-like, so only strings
    /// fall back to "now" when the leading token is not a timestamp.
    pub fn allows_embedded_timestamp(&self) -> bool {
        matches!(self, Kind::String)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Kind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| StoreError::UnknownKind(s.to_string()))
    }
}

/// Exact fixed-point decimal stored as an integer count of millionths
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal {
    micros: i64,
}

impl Decimal {
    pub fn from_micros(micros: i64) -> Self {
        Self { micros }
    }

    pub fn micros(&self) -> i64 {
        self.micros
    }

    pub fn to_f64(&self) -> f64 {
        self.micros as f64 / DECIMAL_SCALE as f64
    }

    /// Parse `[+-]digits[.digits][(e|E)[+-]digits]`
    ///
    /// The exponent only moves the decimal point, so `1.5e3` is `1500`.
    /// Returns `None` for malformed text, for more integral digits than the
    /// decimal precision leaves room for, and for non-zero digits beyond the
    /// sixth fractional place.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, unsigned) = match text.as_bytes().first()? {
            b'-' => (true, &text[1..]),
            b'+' => (false, &text[1..]),
            _ => (false, text),
        };
        let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
            Some((m, e)) => (m, Some(e)),
            None => (unsigned, None),
        };
        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((i, f)) => (i, f),
            None => (mantissa, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return None;
        }

        let (int_part, frac_part) = match exponent {
            Some(exp) => shift_point(int_part, frac_part, parse_exponent(exp)?),
            None => (int_part.to_string(), frac_part.to_string()),
        };

        let int_digits = int_part.trim_start_matches('0');
        let frac_digits = frac_part.trim_end_matches('0');
        if int_digits.len() > DECIMAL_MAX_INTEGRAL_DIGITS
            || frac_digits.len() > DECIMAL_PLACES as usize
        {
            return None;
        }

        let int_value: i64 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().ok()?
        };
        let frac_value: i64 = if frac_digits.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac_digits, width = DECIMAL_PLACES as usize);
            padded.parse().ok()?
        };

        let magnitude = int_value * DECIMAL_SCALE + frac_value;
        Some(Self {
            micros: if negative { -magnitude } else { magnitude },
        })
    }
}

/// Exponents beyond this cannot produce a representable decimal
const DECIMAL_MAX_EXPONENT: i64 = 64;

fn parse_exponent(text: &str) -> Option<i64> {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let exp: i64 = text.parse().ok()?;
    (exp.abs() <= DECIMAL_MAX_EXPONENT).then_some(exp)
}

/// Move the decimal point of `int.frac` by `exp` places
fn shift_point(int_part: &str, frac_part: &str, exp: i64) -> (String, String) {
    let digits = format!("{int_part}{frac_part}");
    let point = int_part.len() as i64 + exp;
    if point <= 0 {
        let zeros = "0".repeat(point.unsigned_abs() as usize);
        (String::new(), format!("{zeros}{digits}"))
    } else if point as usize >= digits.len() {
        let zeros = "0".repeat(point as usize - digits.len());
        (format!("{digits}{zeros}"), String::new())
    } else {
        let (i, f) = digits.split_at(point as usize);
        (i.to_string(), f.to_string())
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.micros < 0 { "-" } else { "" };
        let magnitude = self.micros.unsigned_abs();
        let scale = DECIMAL_SCALE as u64;
        let int_part = magnitude / scale;
        let frac_part = magnitude % scale;
        if frac_part == 0 {
            return write!(f, "{sign}{int_part}");
        }
        let frac = format!("{:0width$}", frac_part, width = DECIMAL_PLACES as usize);
        write!(f, "{sign}{int_part}.{}", frac.trim_end_matches('0'))
    }
}

/// A value coerced to one of the registered kinds
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
}

impl TypedValue {
    pub fn kind(&self) -> Kind {
        match self {
            TypedValue::Int(_) => Kind::Int,
            TypedValue::Float(_) => Kind::Float,
            TypedValue::Decimal(_) => Kind::Decimal,
            TypedValue::String(_) => Kind::String,
        }
    }

    /// Canonical text through the kind's formatter
    pub fn format(&self) -> String {
        (TypeRegistry::ops(self.kind()).format)(self)
    }

    /// JSON form for chart and series exports; decimals become plain numbers
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            TypedValue::Int(v) => serde_json::Value::from(*v),
            TypedValue::Float(v) => serde_json::Value::from(*v),
            TypedValue::Decimal(d) => serde_json::Value::from(d.to_f64()),
            TypedValue::String(s) => serde_json::Value::from(s.as_str()),
        }
    }

    /// Total order: by kind first, then natural order within the kind
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (TypedValue::Int(a), TypedValue::Int(b)) => a.cmp(b),
            (TypedValue::Float(a), TypedValue::Float(b)) => a.total_cmp(b),
            (TypedValue::Decimal(a), TypedValue::Decimal(b)) => a.cmp(b),
            (TypedValue::String(a), TypedValue::String(b)) => a.cmp(b),
            (a, b) => a.kind().cmp(&b.kind()),
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

/// Per-kind parse / validate / format operations
pub struct KindOps {
    pub kind: Kind,
    /// Lexical coercion of raw text; `None` when the text is not of this kind
    pub parse: fn(&str) -> Option<TypedValue>,
    /// Shape and range checks; may coerce a compatible value into this kind
    pub validate: fn(TypedValue) -> Option<TypedValue>,
    pub format: fn(&TypedValue) -> String,
}

impl KindOps {
    /// Parse and validate raw text, failing with `InvalidValue`
    pub fn coerce(&self, raw: &str) -> Result<TypedValue, StoreError> {
        (self.parse)(raw)
            .and_then(self.validate)
            .ok_or_else(|| StoreError::invalid_value(self.kind, raw))
    }
}

static REGISTRY: [KindOps; 4] = [
    KindOps {
        kind: Kind::Int,
        parse: parse_int,
        validate: validate_int,
        format: format_value,
    },
    KindOps {
        kind: Kind::Float,
        parse: parse_float,
        validate: validate_float,
        format: format_value,
    },
    KindOps {
        kind: Kind::Decimal,
        parse: parse_decimal,
        validate: validate_decimal,
        format: format_value,
    },
    KindOps {
        kind: Kind::String,
        parse: parse_string,
        validate: validate_string,
        format: format_value,
    },
];

/// Closed registry mapping kind tags to their operations
pub struct TypeRegistry;

impl TypeRegistry {
    /// Resolve a textual kind tag
    pub fn lookup(tag: &str) -> Result<&'static KindOps, StoreError> {
        let kind: Kind = tag.parse()?;
        Ok(Self::ops(kind))
    }

    pub fn ops(kind: Kind) -> &'static KindOps {
        match kind {
            Kind::Int => &REGISTRY[0],
            Kind::Float => &REGISTRY[1],
            Kind::Decimal => &REGISTRY[2],
            Kind::String => &REGISTRY[3],
        }
    }
}

fn parse_int(raw: &str) -> Option<TypedValue> {
    raw.trim().parse().ok().map(TypedValue::Int)
}

fn validate_int(value: TypedValue) -> Option<TypedValue> {
    match value {
        TypedValue::Int(_) => Some(value),
        _ => None,
    }
}

fn parse_float(raw: &str) -> Option<TypedValue> {
    raw.trim().parse().ok().map(TypedValue::Float)
}

fn validate_float(value: TypedValue) -> Option<TypedValue> {
    match value {
        TypedValue::Float(v) if v.is_finite() => Some(value),
        TypedValue::Int(v) => Some(TypedValue::Float(v as f64)),
        _ => None,
    }
}

fn parse_decimal(raw: &str) -> Option<TypedValue> {
    Decimal::parse(raw).map(TypedValue::Decimal)
}

fn validate_decimal(value: TypedValue) -> Option<TypedValue> {
    match value {
        TypedValue::Decimal(d) if d.micros().unsigned_abs() < DECIMAL_LIMIT as u64 => Some(value),
        TypedValue::Int(v) => v
            .checked_mul(DECIMAL_SCALE)
            .filter(|m| m.unsigned_abs() < DECIMAL_LIMIT as u64)
            .map(|m| TypedValue::Decimal(Decimal::from_micros(m))),
        _ => None,
    }
}

fn parse_string(raw: &str) -> Option<TypedValue> {
    Some(TypedValue::String(raw.to_string()))
}

fn validate_string(value: TypedValue) -> Option<TypedValue> {
    match value {
        TypedValue::String(s) if s.chars().count() > STRING_MAX_CHARS => Some(TypedValue::String(
            s.chars().take(STRING_MAX_CHARS).collect(),
        )),
        TypedValue::String(s) => Some(TypedValue::String(s)),
        _ => None,
    }
}

fn format_value(value: &TypedValue) -> String {
    match value {
        TypedValue::Int(v) => v.to_string(),
        // Debug keeps a fractional part on integral floats ("777.0")
        TypedValue::Float(v) => format!("{v:?}"),
        TypedValue::Decimal(d) => d.to_string(),
        TypedValue::String(s) => s.clone(),
    }
}
