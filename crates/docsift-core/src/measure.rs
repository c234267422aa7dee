//! Measurement normalization: raw quantity mentions into canonical units.
//!
//! The unit table here is also the source of the built-in quantity patterns,
//! so every unit the flexible matcher can find is one this module converts.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dictionary::PatternTable;
use crate::matcher::{Match, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    Length,
    Mass,
    Volume,
    Area,
    Duration,
    Currency,
    Percent,
    Data,
}

impl MeasureKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Mass => "mass",
            Self::Volume => "volume",
            Self::Area => "area",
            Self::Duration => "duration",
            Self::Currency => "currency",
            Self::Percent => "percent",
            Self::Data => "data",
        }
    }

    #[must_use]
    pub fn canonical_unit(&self) -> CanonicalUnit {
        match self {
            Self::Length => CanonicalUnit::Meter,
            Self::Mass => CanonicalUnit::Kilogram,
            Self::Volume => CanonicalUnit::Liter,
            Self::Area => CanonicalUnit::SquareMeter,
            Self::Duration => CanonicalUnit::Second,
            Self::Currency => CanonicalUnit::Usd,
            Self::Percent => CanonicalUnit::Ratio,
            Self::Data => CanonicalUnit::Byte,
        }
    }
}

impl std::fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MeasureKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "length" => Ok(Self::Length),
            "mass" => Ok(Self::Mass),
            "volume" => Ok(Self::Volume),
            "area" => Ok(Self::Area),
            "duration" => Ok(Self::Duration),
            "currency" => Ok(Self::Currency),
            "percent" => Ok(Self::Percent),
            "data" => Ok(Self::Data),
            _ => Err(crate::Error::InvalidMeasureKind(s.to_string())),
        }
    }
}

/// The one unit each measurement kind is normalized into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalUnit {
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "kg")]
    Kilogram,
    #[serde(rename = "L")]
    Liter,
    #[serde(rename = "m2")]
    SquareMeter,
    #[serde(rename = "s")]
    Second,
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "ratio")]
    Ratio,
    #[serde(rename = "B")]
    Byte,
}

impl CanonicalUnit {
    #[must_use]
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Meter => "m",
            Self::Kilogram => "kg",
            Self::Liter => "L",
            Self::SquareMeter => "m2",
            Self::Second => "s",
            Self::Usd => "USD",
            Self::Ratio => "ratio",
            Self::Byte => "B",
        }
    }
}

impl std::fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

struct UnitDef {
    token: &'static str,
    kind: MeasureKind,
    multiplier: f64,
}

const fn unit(token: &'static str, kind: MeasureKind, multiplier: f64) -> UnitDef {
    UnitDef {
        token,
        kind,
        multiplier,
    }
}

const MILE: f64 = 1_609.344;
const FOOT: f64 = 0.304_8;
const POUND: f64 = 0.453_592_37;
const GALLON: f64 = 3.785_411_784;

#[rustfmt::skip]
static UNITS: &[UnitDef] = &[
    unit("km", MeasureKind::Length, 1_000.0),
    unit("kilometers", MeasureKind::Length, 1_000.0),
    unit("kilometres", MeasureKind::Length, 1_000.0),
    unit("m", MeasureKind::Length, 1.0),
    unit("meters", MeasureKind::Length, 1.0),
    unit("metres", MeasureKind::Length, 1.0),
    unit("cm", MeasureKind::Length, 0.01),
    unit("mm", MeasureKind::Length, 0.001),
    unit("mi", MeasureKind::Length, MILE),
    unit("mile", MeasureKind::Length, MILE),
    unit("miles", MeasureKind::Length, MILE),
    unit("ft", MeasureKind::Length, FOOT),
    unit("feet", MeasureKind::Length, FOOT),
    unit("foot", MeasureKind::Length, FOOT),
    unit("inch", MeasureKind::Length, 0.025_4),
    unit("inches", MeasureKind::Length, 0.025_4),
    unit("yd", MeasureKind::Length, 0.914_4),
    unit("yards", MeasureKind::Length, 0.914_4),

    unit("kg", MeasureKind::Mass, 1.0),
    unit("kilograms", MeasureKind::Mass, 1.0),
    unit("g", MeasureKind::Mass, 0.001),
    unit("grams", MeasureKind::Mass, 0.001),
    unit("mg", MeasureKind::Mass, 0.000_001),
    unit("tonne", MeasureKind::Mass, 1_000.0),
    unit("tonnes", MeasureKind::Mass, 1_000.0),
    unit("lb", MeasureKind::Mass, POUND),
    unit("lbs", MeasureKind::Mass, POUND),
    unit("pounds", MeasureKind::Mass, POUND),
    unit("oz", MeasureKind::Mass, 0.028_349_523_125),
    unit("ounces", MeasureKind::Mass, 0.028_349_523_125),

    unit("L", MeasureKind::Volume, 1.0),
    unit("l", MeasureKind::Volume, 1.0),
    unit("liters", MeasureKind::Volume, 1.0),
    unit("litres", MeasureKind::Volume, 1.0),
    unit("mL", MeasureKind::Volume, 0.001),
    unit("ml", MeasureKind::Volume, 0.001),
    unit("gal", MeasureKind::Volume, GALLON),
    unit("gallons", MeasureKind::Volume, GALLON),

    unit("m²", MeasureKind::Area, 1.0),
    unit("m2", MeasureKind::Area, 1.0),
    unit("sq m", MeasureKind::Area, 1.0),
    unit("km²", MeasureKind::Area, 1_000_000.0),
    unit("km2", MeasureKind::Area, 1_000_000.0),
    unit("sq ft", MeasureKind::Area, 0.092_903_04),
    unit("acres", MeasureKind::Area, 4_046.856_422_4),
    unit("hectares", MeasureKind::Area, 10_000.0),
    unit("ha", MeasureKind::Area, 10_000.0),

    unit("ms", MeasureKind::Duration, 0.001),
    unit("sec", MeasureKind::Duration, 1.0),
    unit("seconds", MeasureKind::Duration, 1.0),
    unit("min", MeasureKind::Duration, 60.0),
    unit("minutes", MeasureKind::Duration, 60.0),
    unit("hours", MeasureKind::Duration, 3_600.0),
    unit("hrs", MeasureKind::Duration, 3_600.0),
    unit("days", MeasureKind::Duration, 86_400.0),
    unit("weeks", MeasureKind::Duration, 604_800.0),
    unit("years", MeasureKind::Duration, 31_557_600.0),

    unit("USD", MeasureKind::Currency, 1.0),
    unit("dollars", MeasureKind::Currency, 1.0),
    unit("dollar", MeasureKind::Currency, 1.0),

    unit("%", MeasureKind::Percent, 0.01),
    unit("percent", MeasureKind::Percent, 0.01),
    unit("per cent", MeasureKind::Percent, 0.01),

    unit("KB", MeasureKind::Data, 1e3),
    unit("MB", MeasureKind::Data, 1e6),
    unit("GB", MeasureKind::Data, 1e9),
    unit("TB", MeasureKind::Data, 1e12),
    unit("KiB", MeasureKind::Data, 1_024.0),
    unit("MiB", MeasureKind::Data, 1_048_576.0),
    unit("GiB", MeasureKind::Data, 1_073_741_824.0),
];

/// Unit tokens recognized for `kind`, in table order.
pub fn unit_tokens(kind: MeasureKind) -> impl Iterator<Item = &'static str> {
    UNITS.iter().filter(move |u| u.kind == kind).map(|u| u.token)
}

/// Exact token first, then a lowercase fallback for spelled-out units.
fn lookup_unit(token: &str) -> Option<&'static UnitDef> {
    UNITS.iter().find(|u| u.token == token).or_else(|| {
        let lower = token.to_lowercase();
        UNITS.iter().find(|u| u.token == lower)
    })
}

fn scale_factor(token: &str, after_currency: bool) -> Option<f64> {
    match token {
        "thousand" => Some(1e3),
        "million" => Some(1e6),
        "billion" => Some(1e9),
        "trillion" => Some(1e12),
        "K" | "k" if after_currency => Some(1e3),
        "M" | "m" | "mn" if after_currency => Some(1e6),
        "B" | "b" | "bn" if after_currency => Some(1e9),
        "T" if after_currency => Some(1e12),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitConversionError {
    #[error("No quantity found in {0:?}")]
    NoQuantity(String),

    #[error("Invalid number {0:?}")]
    InvalidNumber(String),

    #[error("Missing unit in {0:?}")]
    MissingUnit(String),

    #[error("Unrecognized unit {0:?}")]
    UnknownUnit(String),

    #[error("Unsupported currency {0:?}, amounts are only normalized from USD")]
    UnsupportedCurrency(String),

    #[error("Range mixes {low} and {high}")]
    MixedKinds { low: MeasureKind, high: MeasureKind },

    #[error("Unit {unit:?} measures {found}, category expects {expected}")]
    KindMismatch {
        unit: String,
        found: MeasureKind,
        expected: MeasureKind,
    },
}

/// A point value or an inclusive `(low, high)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Point(f64),
    Range(f64, f64),
}

impl Quantity {
    #[must_use]
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range(..))
    }

    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        match self {
            Self::Point(v) => Self::Point(v * factor),
            Self::Range(low, high) => Self::Range(low * factor, high * factor),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementValue {
    pub raw_text: String,
    pub span: Span,
    pub kind: MeasureKind,
    pub value: Quantity,
    pub unit: String,
    pub canonical_value: Quantity,
    pub canonical_unit: CanonicalUnit,
}

/// A measurement mention that could not be converted.
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedMeasurement {
    pub raw_text: String,
    pub span: Span,
    pub error: UnitConversionError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationOutput {
    pub measurements: Vec<MeasurementValue>,
    pub dropped: Vec<DroppedMeasurement>,
}

pub struct MeasurementNormalizer<'a> {
    table: &'a PatternTable,
}

impl<'a> MeasurementNormalizer<'a> {
    #[must_use]
    pub fn new(table: &'a PatternTable) -> Self {
        Self { table }
    }

    /// Converts every measurement-category match. Failures drop only the
    /// affected measurement.
    #[must_use]
    pub fn normalize(&self, matches: &[Match]) -> NormalizationOutput {
        let mut output = NormalizationOutput::default();

        for m in matches {
            let Some(expected) = self.table.category(m.category).kind.measure() else {
                continue;
            };

            match convert(&m.text, expected) {
                Ok((kind, value, unit, multiplier)) => {
                    output.measurements.push(MeasurementValue {
                        raw_text: m.text.clone(),
                        span: m.span,
                        kind,
                        value,
                        unit,
                        canonical_value: value.scaled(multiplier),
                        canonical_unit: kind.canonical_unit(),
                    });
                }
                Err(error) => {
                    tracing::warn!(text = %m.text, span = %m.span, %error, "Dropping measurement");
                    output.dropped.push(DroppedMeasurement {
                        raw_text: m.text.clone(),
                        span: m.span,
                        error,
                    });
                }
            }
        }

        output
    }
}

static RANGE_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<low>.*?\d.*?)(?:\s*[-–—]\s*|\s+to\s+)(?P<high>\D*\d.*)$")
        .expect("range split pattern should compile")
});

static SIDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<pre>US\$|\$|€|£|USD|EUR|GBP)?\s*(?P<num>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)\s*(?P<rest>.*)$",
    )
    .expect("quantity side pattern should compile")
});

static SCALE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<scale>thousand|million|billion|trillion|bn|mn|[KMBTkmb])(?:\s+|$)(?P<rest>.*)$")
        .expect("scale prefix pattern should compile")
});

/// One side of a (possibly ranged) quantity, before unit resolution.
#[derive(Debug, Default)]
struct Side {
    currency: Option<String>,
    number: f64,
    scale: Option<f64>,
    unit: Option<String>,
}

/// Scale letters (`M`, `bn`) only count after a currency, either on this side
/// or, for the high end of a range, on the low side.
fn parse_side(raw: &str, currency_context: bool) -> Result<Side, UnitConversionError> {
    let caps = SIDE
        .captures(raw.trim())
        .ok_or_else(|| UnitConversionError::NoQuantity(raw.to_string()))?;

    let digits = caps["num"].replace(',', "");
    let number: f64 = digits
        .parse()
        .map_err(|_| UnitConversionError::InvalidNumber(caps["num"].to_string()))?;

    let currency = caps.name("pre").map(|m| m.as_str().to_string());
    let mut rest = caps["rest"].trim().to_string();
    let mut scale = None;

    if let Some(scaled) = SCALE_PREFIX.captures(&rest) {
        if let Some(factor) = scale_factor(&scaled["scale"], currency_context || currency.is_some()) {
            scale = Some(factor);
            rest = scaled["rest"].trim().to_string();
        }
    }

    Ok(Side {
        currency,
        number,
        scale,
        unit: (!rest.is_empty()).then_some(rest),
    })
}

/// Resolves a side's unit to `(kind, token, multiplier)`.
fn resolve_unit(side: &Side, raw: &str) -> Result<(MeasureKind, String, f64), UnitConversionError> {
    if let Some(currency) = &side.currency {
        return match currency.as_str() {
            "$" | "US$" | "USD" => Ok((MeasureKind::Currency, "USD".to_string(), 1.0)),
            other => Err(UnitConversionError::UnsupportedCurrency(other.to_string())),
        };
    }

    let token = side
        .unit
        .as_deref()
        .ok_or_else(|| UnitConversionError::MissingUnit(raw.to_string()))?;
    let def = lookup_unit(token).ok_or_else(|| UnitConversionError::UnknownUnit(token.to_string()))?;

    let token = if def.kind == MeasureKind::Currency {
        "USD".to_string()
    } else {
        token.to_string()
    };
    Ok((def.kind, token, def.multiplier))
}

/// Returns `(kind, raw value, unit token, multiplier to canonical)`.
fn convert(
    raw: &str,
    expected: MeasureKind,
) -> Result<(MeasureKind, Quantity, String, f64), UnitConversionError> {
    let (value, kind, unit, multiplier) = if let Some(caps) = RANGE_SPLIT.captures(raw.trim()) {
        let mut low = parse_side(&caps["low"], false)?;
        let mut high = parse_side(&caps["high"], low.currency.is_some())?;

        // "$10-20M" and "10-15 kg": the bare side borrows what it lacks.
        if low.currency.is_none() && low.unit.is_none() {
            low.currency.clone_from(&high.currency);
            low.unit.clone_from(&high.unit);
        }
        if high.currency.is_none() && high.unit.is_none() {
            high.currency.clone_from(&low.currency);
            high.unit.clone_from(&low.unit);
        }
        if low.scale.is_none() {
            low.scale = high.scale;
        }
        if high.scale.is_none() {
            high.scale = low.scale;
        }

        let (low_kind, _, low_mult) = resolve_unit(&low, raw)?;
        let (high_kind, unit, high_mult) = resolve_unit(&high, raw)?;
        if low_kind != high_kind {
            return Err(UnitConversionError::MixedKinds {
                low: low_kind,
                high: high_kind,
            });
        }

        // Express the low side in the high side's unit so one multiplier applies.
        let low_value = low.number * low.scale.unwrap_or(1.0) * low_mult / high_mult;
        let high_value = high.number * high.scale.unwrap_or(1.0);
        let (a, b) = if low_value <= high_value {
            (low_value, high_value)
        } else {
            (high_value, low_value)
        };

        (Quantity::Range(a, b), high_kind, unit, high_mult)
    } else {
        let side = parse_side(raw, false)?;
        let (kind, unit, multiplier) = resolve_unit(&side, raw)?;
        (
            Quantity::Point(side.number * side.scale.unwrap_or(1.0)),
            kind,
            unit,
            multiplier,
        )
    };

    if kind != expected {
        return Err(UnitConversionError::KindMismatch {
            unit,
            found: kind,
            expected,
        });
    }

    Ok((kind, value, unit, multiplier))
}
