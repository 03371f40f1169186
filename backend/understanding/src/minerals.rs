//! Mineral extractor: pulls labeled milligram values out of free-form model text.
//!
//! Each field is described by a label token ("Cálcio") and compiled once into a
//! case-insensitive pattern: label, optional separators, a run of ASCII digits,
//! optional `mg` unit. The first match in the text wins. A field whose label
//! never matches is reported as `MineralValue::NotFound`.
//!
//! Text and labels are compared in NFC, so a decomposed "Ca\u{301}lcio" in model
//! output still matches "Cálcio".

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use unicode_normalization::{is_nfc, UnicodeNormalization};

/// Text shown for a field whose label was not located.
pub const NOT_FOUND: &str = "Not found";

/// Characters allowed between a label and its digits: whitespace, colon,
/// equals sign, table pipes and markdown emphasis.
const SEPARATOR_CLASS: &str = r"[\s:=|*]*";

/// The minerals printed on a water-composition label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mineral {
    Bicarbonate,
    Calcium,
    Magnesium,
}

impl Mineral {
    pub const ALL: [Mineral; 3] = [Mineral::Bicarbonate, Mineral::Calcium, Mineral::Magnesium];

    /// Field key used in label sets and readings.
    pub fn field(&self) -> &'static str {
        match self {
            Mineral::Bicarbonate => "bicarbonate",
            Mineral::Calcium => "calcium",
            Mineral::Magnesium => "magnesium",
        }
    }

    /// Label as printed on Brazilian mineral water bottles.
    pub fn default_label(&self) -> &'static str {
        match self {
            Mineral::Bicarbonate => "Bicarbonato",
            Mineral::Calcium => "Cálcio",
            Mineral::Magnesium => "Magnésio",
        }
    }
}

static REFERENCE_LABELS: Lazy<LabelSet> = Lazy::new(|| {
    LabelSet::new(Mineral::ALL.iter().map(|m| (m.field(), m.default_label()))).unwrap()
});

/// Errors raised while building a label set.
#[derive(Debug, Error)]
pub enum LabelError {
    #[error("label field name cannot be empty")]
    EmptyField,

    #[error("label for field '{0}' cannot be empty")]
    EmptyLabel(String),

    #[error("field '{0}' is configured more than once")]
    DuplicateField(String),

    #[error("invalid label pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One field → label mapping with its compiled pattern.
#[derive(Debug, Clone)]
pub struct LabelRule {
    field: String,
    label: String,
    pattern: Regex,
}

impl LabelRule {
    fn compile(field: String, label: String) -> Result<Self, LabelError> {
        if field.trim().is_empty() {
            return Err(LabelError::EmptyField);
        }
        if label.trim().is_empty() {
            return Err(LabelError::EmptyLabel(field));
        }
        let source = format!(
            r"(?i){}{}([0-9]+)\s*(?:mg)?",
            regex::escape(&nfc(label.trim())),
            SEPARATOR_CLASS
        );
        let pattern = Regex::new(&source)?;
        Ok(Self { field, label, pattern })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Digits following the first occurrence of this label, if any.
    pub fn find(&self, text: &str) -> Option<String> {
        self.pattern
            .captures(&nfc(text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Ordered, declarative table of fields to extract.
#[derive(Debug, Clone)]
pub struct LabelSet {
    rules: Vec<LabelRule>,
}

impl LabelSet {
    pub fn new<I, F, L>(pairs: I) -> Result<Self, LabelError>
    where
        I: IntoIterator<Item = (F, L)>,
        F: Into<String>,
        L: Into<String>,
    {
        let mut rules: Vec<LabelRule> = Vec::new();
        for (field, label) in pairs {
            let field = field.into();
            if rules.iter().any(|r| r.field == field) {
                return Err(LabelError::DuplicateField(field));
            }
            rules.push(LabelRule::compile(field, label.into())?);
        }
        Ok(Self { rules })
    }

    /// Bicarbonato / Cálcio / Magnésio.
    pub fn water_minerals() -> Self {
        REFERENCE_LABELS.clone()
    }

    pub fn rules(&self) -> &[LabelRule] {
        &self.rules
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.field.as_str())
    }

    pub fn label_for(&self, field: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|r| r.field == field)
            .map(|r| r.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self::water_minerals()
    }
}

/// Extracted value for one field: the literal digit run, or the NotFound sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum MineralValue {
    Found(String),
    NotFound,
}

impl MineralValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MineralValue::Found(digits) => Some(digits),
            MineralValue::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, MineralValue::Found(_))
    }
}

impl From<Option<String>> for MineralValue {
    fn from(value: Option<String>) -> Self {
        value.map(MineralValue::Found).unwrap_or(MineralValue::NotFound)
    }
}

impl From<MineralValue> for Option<String> {
    fn from(value: MineralValue) -> Self {
        match value {
            MineralValue::Found(digits) => Some(digits),
            MineralValue::NotFound => None,
        }
    }
}

impl std::fmt::Display for MineralValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MineralValue::Found(digits) => f.write_str(digits),
            MineralValue::NotFound => f.write_str(NOT_FOUND),
        }
    }
}

/// Field → value mapping, in label-set order. Always has one entry per configured field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MineralReadings {
    entries: Vec<(String, MineralValue)>,
}

impl MineralReadings {
    pub fn get(&self, field: &str) -> Option<&MineralValue> {
        self.entries
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v)
    }

    pub fn mineral(&self, mineral: Mineral) -> Option<&MineralValue> {
        self.get(mineral.field())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MineralValue)> {
        self.entries.iter().map(|(f, v)| (f.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn found_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_found()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.found_count() == self.entries.len()
    }
}

impl Serialize for MineralReadings {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (field, value) in &self.entries {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

fn nfc(text: &str) -> Cow<'_, str> {
    if is_nfc(text) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.nfc().collect())
    }
}

/// Extract every field of `labels` from `text`.
pub fn extract(text: &str, labels: &LabelSet) -> MineralReadings {
    let text = nfc(text);
    let entries = labels
        .rules
        .iter()
        .map(|rule| {
            let value = rule
                .find(&text)
                .map(MineralValue::Found)
                .unwrap_or(MineralValue::NotFound);
            (rule.field.clone(), value)
        })
        .collect();
    MineralReadings { entries }
}
