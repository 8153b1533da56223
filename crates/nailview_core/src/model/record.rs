//! Domain record model.
//!
//! # Responsibility
//! - Define the persisted record shape (`RawRecord`) and its typed projection
//!   (`DomainRecord`).
//! - Resolve category and nail-role labels into closed enums exactly once.
//!
//! # Invariants
//! - Lenient conversion never fails; every defaulted field yields a warning.
//! - Strict conversion rejects the record before anything is persisted.
//! - Unknown JSON keys survive a `RawRecord` round-trip unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Research category of one record.
///
/// The eight known labels map to dedicated variants; anything else lands in
/// `Other`, which is the single explicit fallback branch.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    SocialFinancial,
    Health,
    Education,
    CriminalJustice,
    Employment,
    Housing,
    Political,
    Cultural,
    /// Unrecognized label, kept verbatim.
    Other(String),
}

impl Category {
    /// Every known category, in declaration order.
    pub const KNOWN: [Category; 8] = [
        Category::SocialFinancial,
        Category::Health,
        Category::Education,
        Category::CriminalJustice,
        Category::Employment,
        Category::Housing,
        Category::Political,
        Category::Cultural,
    ];

    /// Parses a label, falling back to `Other` for unknown values.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "social_financial" => Self::SocialFinancial,
            "health" => Self::Health,
            "education" => Self::Education,
            "criminal_justice" => Self::CriminalJustice,
            "employment" => Self::Employment,
            "housing" => Self::Housing,
            "political" => Self::Political,
            "cultural" => Self::Cultural,
            _ => Self::Other(label.trim().to_string()),
        }
    }

    /// Wire label used in documents.
    pub fn label(&self) -> &str {
        match self {
            Self::SocialFinancial => "social_financial",
            Self::Health => "health",
            Self::Education => "education",
            Self::CriminalJustice => "criminal_justice",
            Self::Employment => "employment",
            Self::Housing => "housing",
            Self::Political => "political",
            Self::Cultural => "cultural",
            Self::Other(label) => label.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Category {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Alignment group controlling how a record responds to the reveal transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NailRole {
    /// Pulled onto the vertical bar of the cross.
    Vertical,
    /// Pulled onto the horizontal bar of the cross.
    Horizontal,
    /// Fixed pivot at the origin.
    Intersection,
    /// Background element with minimal drift.
    Peripheral,
}

impl NailRole {
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "vertical" => Some(Self::Vertical),
            "horizontal" => Some(Self::Horizontal),
            "intersection" => Some(Self::Intersection),
            "peripheral" => Some(Self::Peripheral),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Vertical => "vertical",
            Self::Horizontal => "horizontal",
            Self::Intersection => "intersection",
            Self::Peripheral => "peripheral",
        }
    }
}

impl Display for NailRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Persisted record exactly as the authoring workflow writes it.
///
/// Numeric fields are kept as raw JSON values so that a record with a typo in
/// one number still loads; interpretation happens in the conversions below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect_size_r: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_metric: Option<String>,
    #[serde(default)]
    pub primary_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nail_role: Option<String>,
    #[serde(default, alias = "tag", skip_serializing_if = "Option::is_none")]
    pub violence_type: Option<String>,
    /// Keys this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Typed, immutable record consumed by the rendering pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainRecord {
    pub name: String,
    pub category: Category,
    pub effect_size_r: f64,
    pub p_value: f64,
    pub sample_size: u64,
    pub key_metric: String,
    pub primary_names: Vec<String>,
    pub mechanism: String,
    pub nail_role: NailRole,
    pub tag: String,
}

/// Non-fatal issue found while loading one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWarning {
    /// A numeric field was missing, invalid or out of range; it is 0 now.
    MalformedRecord { name: String, field: &'static str },
    /// The category has no entry in the color table.
    UnknownCategory { name: String, category: String },
    /// The role label was missing or unrecognized and became `peripheral`.
    UnknownRole { name: String, role: Option<String> },
}

impl Display for RecordWarning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedRecord { name, field } => {
                write!(f, "record `{name}`: field `{field}` missing, invalid or not positive, using 0")
            }
            Self::UnknownCategory { name, category } => {
                write!(f, "record `{name}`: category `{category}` has no color, using default")
            }
            Self::UnknownRole { name, role } => match role {
                Some(role) => write!(f, "record `{name}`: unknown nail_role `{role}`, using peripheral"),
                None => write!(f, "record `{name}`: nail_role missing, using peripheral"),
            },
        }
    }
}

/// Strict validation failure used by the append workflow.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValidationError {
    EmptyName,
    MissingField(&'static str),
    InvalidNumber { field: &'static str, value: String },
    NonPositive { field: &'static str, value: f64 },
    UnknownCategory(String),
    UnknownRole(String),
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "record name must not be empty"),
            Self::MissingField(field) => write!(f, "required field `{field}` is missing"),
            Self::InvalidNumber { field, value } => {
                write!(f, "field `{field}` is not a valid number: {value}")
            }
            Self::NonPositive { field, value } => {
                write!(f, "field `{field}` must be positive, got {value}")
            }
            Self::UnknownCategory(label) => write!(f, "unknown category `{label}`"),
            Self::UnknownRole(label) => write!(f, "unknown nail_role `{label}`"),
        }
    }
}

impl Error for RecordValidationError {}

impl RawRecord {
    /// Display name, or a placeholder for unnamed records.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => "<unnamed>".to_string(),
        }
    }

    /// Builds a typed record, defaulting anything unusable.
    ///
    /// Category lookups against the color table are the normalizer's concern;
    /// this only reports numeric and role problems.
    pub fn to_record_lenient(&self) -> (DomainRecord, Vec<RecordWarning>) {
        let name = self.display_name();
        let mut warnings = Vec::new();

        // `positive` fields also warn on 0 but keep it, so normalization
        // saturates instead of skipping the record.
        let mut number = |field: &'static str, value: &Option<Value>, positive: bool| -> f64 {
            match value.as_ref().and_then(number_from_value) {
                Some(parsed) if parsed > 0.0 && parsed.is_finite() => parsed,
                Some(parsed) if parsed == 0.0 && !positive => parsed,
                _ => {
                    warnings.push(RecordWarning::MalformedRecord {
                        name: name.clone(),
                        field,
                    });
                    0.0
                }
            }
        };
        let effect_size_r = number("effect_size_r", &self.effect_size_r, false);
        let p_value = number("p_value", &self.p_value, true);
        let sample_size = number("sample_size", &self.sample_size, true).round() as u64;

        let nail_role = match self.nail_role.as_deref().and_then(NailRole::parse) {
            Some(role) => role,
            None => {
                warnings.push(RecordWarning::UnknownRole {
                    name: name.clone(),
                    role: self.nail_role.clone(),
                });
                NailRole::Peripheral
            }
        };

        let record = DomainRecord {
            name,
            category: Category::from_label(self.category.as_deref().unwrap_or_default()),
            effect_size_r,
            p_value,
            sample_size,
            key_metric: self.key_metric.clone().unwrap_or_default(),
            primary_names: self.primary_names.clone(),
            mechanism: self.mechanism.clone().unwrap_or_default(),
            nail_role,
            tag: self.violence_type.clone().unwrap_or_default(),
        };
        (record, warnings)
    }

    /// Builds a typed record or rejects it.
    ///
    /// # Errors
    /// - Empty name, unknown category or role.
    /// - Missing/non-numeric `effect_size_r`, `p_value`, `sample_size`.
    /// - Negative effect size, non-positive `p_value` or `sample_size`.
    pub fn to_record_strict(&self) -> Result<DomainRecord, RecordValidationError> {
        let name = match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(RecordValidationError::EmptyName),
        };

        let category_label = self
            .category
            .as_deref()
            .ok_or(RecordValidationError::MissingField("category"))?;
        let category = Category::from_label(category_label);
        if !category.is_known() {
            return Err(RecordValidationError::UnknownCategory(
                category_label.to_string(),
            ));
        }

        let effect_size_r = strict_number("effect_size_r", &self.effect_size_r)?;
        if effect_size_r < 0.0 {
            return Err(RecordValidationError::InvalidNumber {
                field: "effect_size_r",
                value: effect_size_r.to_string(),
            });
        }
        let p_value = strict_number("p_value", &self.p_value)?;
        if p_value <= 0.0 {
            return Err(RecordValidationError::NonPositive {
                field: "p_value",
                value: p_value,
            });
        }
        let sample_size = strict_number("sample_size", &self.sample_size)?;
        if sample_size <= 0.0 {
            return Err(RecordValidationError::NonPositive {
                field: "sample_size",
                value: sample_size,
            });
        }
        if sample_size.fract() != 0.0 {
            return Err(RecordValidationError::InvalidNumber {
                field: "sample_size",
                value: sample_size.to_string(),
            });
        }

        let role_label = self
            .nail_role
            .as_deref()
            .ok_or(RecordValidationError::MissingField("nail_role"))?;
        let nail_role = NailRole::parse(role_label)
            .ok_or_else(|| RecordValidationError::UnknownRole(role_label.to_string()))?;

        Ok(DomainRecord {
            name,
            category,
            effect_size_r,
            p_value,
            sample_size: sample_size as u64,
            key_metric: self.key_metric.clone().unwrap_or_default(),
            primary_names: self.primary_names.clone(),
            mechanism: self.mechanism.clone().unwrap_or_default(),
            nail_role,
            tag: self.violence_type.clone().unwrap_or_default(),
        })
    }
}

fn strict_number(field: &'static str, value: &Option<Value>) -> Result<f64, RecordValidationError> {
    let value = value
        .as_ref()
        .filter(|value| !value.is_null())
        .ok_or(RecordValidationError::MissingField(field))?;
    match number_from_value(value) {
        Some(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(RecordValidationError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

/// Accepts JSON numbers and numeric strings (`"0.05"`, `" 1200 "`).
fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{number_from_value, Category, NailRole, RawRecord, RecordWarning};
    use serde_json::json;

    #[test]
    fn category_labels_round_trip_and_unknown_is_kept() {
        for category in Category::KNOWN {
            assert_eq!(Category::from_label(category.label()), category);
        }
        let other = Category::from_label("astrology");
        assert_eq!(other, Category::Other("astrology".to_string()));
        assert!(!other.is_known());
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!(NailRole::parse(" Vertical "), Some(NailRole::Vertical));
        assert_eq!(NailRole::parse("diagonal"), None);
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        assert_eq!(number_from_value(&json!("0.05")), Some(0.05));
        assert_eq!(number_from_value(&json!(12)), Some(12.0));
        assert_eq!(number_from_value(&json!("n/a")), None);
        assert_eq!(number_from_value(&json!(null)), None);
    }

    #[test]
    fn lenient_conversion_defaults_and_warns() {
        let raw: RawRecord = serde_json::from_value(json!({
            "name": "broken",
            "category": "health",
            "effect_size_r": "oops",
            "sample_size": 100,
            "nail_role": "diagonal"
        }))
        .unwrap();

        let (record, warnings) = raw.to_record_lenient();
        assert_eq!(record.effect_size_r, 0.0);
        assert_eq!(record.p_value, 0.0);
        assert_eq!(record.sample_size, 100);
        assert_eq!(record.nail_role, NailRole::Peripheral);
        assert_eq!(warnings.len(), 3);
        assert!(matches!(
            warnings[0],
            RecordWarning::MalformedRecord { field: "effect_size_r", .. }
        ));
    }

    #[test]
    fn lenient_conversion_warns_on_zero_p_value_and_sample_size() {
        let raw: RawRecord = serde_json::from_value(json!({
            "name": "degenerate",
            "category": "housing",
            "effect_size_r": 0,
            "p_value": 0,
            "sample_size": "0",
            "nail_role": "vertical"
        }))
        .unwrap();

        let (record, warnings) = raw.to_record_lenient();
        assert_eq!(record.p_value, 0.0);
        assert_eq!(record.sample_size, 0);
        let fields: Vec<&str> = warnings
            .iter()
            .map(|warning| match warning {
                RecordWarning::MalformedRecord { field, .. } => *field,
                other => panic!("unexpected warning {other:?}"),
            })
            .collect();
        assert_eq!(fields, ["p_value", "sample_size"]);
    }

    #[test]
    fn tag_alias_and_extra_keys_survive() {
        let raw: RawRecord = serde_json::from_value(json!({
            "name": "aliased",
            "tag": "structural",
            "source_url": "https://example.org/paper"
        }))
        .unwrap();
        assert_eq!(raw.violence_type.as_deref(), Some("structural"));

        let back = serde_json::to_value(&raw).unwrap();
        assert_eq!(back["violence_type"], "structural");
        assert_eq!(back["source_url"], "https://example.org/paper");
    }
}
