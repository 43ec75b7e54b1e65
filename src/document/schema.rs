//! Record schema: the fixed, known set of input fields.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::error::{CreaseError, Result};

/// How a field takes part in indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    /// Normalized into terms.
    Textual,
    /// Carried through untouched; always stored.
    Passthrough,
}

/// One field of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field (CSV column) name.
    pub name: String,

    /// Textual or passthrough.
    pub role: FieldRole,

    /// A record without this field is malformed. Null values are still fine.
    #[serde(default)]
    pub required: bool,

    /// Keep the raw value in the document store.
    #[serde(default)]
    pub stored: bool,
}

impl FieldSpec {
    /// An optional textual field.
    pub fn textual<S: Into<String>>(name: S) -> Self {
        FieldSpec {
            name: name.into(),
            role: FieldRole::Textual,
            required: false,
            stored: false,
        }
    }

    /// An optional passthrough field.
    pub fn passthrough<S: Into<String>>(name: S) -> Self {
        FieldSpec {
            name: name.into(),
            role: FieldRole::Passthrough,
            required: false,
            stored: true,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn stored(mut self) -> Self {
        self.stored = true;
        self
    }

    pub fn is_textual(&self) -> bool {
        self.role == FieldRole::Textual
    }

    pub fn is_stored(&self) -> bool {
        self.stored || self.role == FieldRole::Passthrough
    }
}

/// The ordered field list. Textual fields contribute terms in this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        RecordSchema { fields }
    }

    /// The IPL ball-by-ball dataset layout.
    pub fn ipl() -> Self {
        RecordSchema::new(vec![
            FieldSpec::textual("match_name").required().stored(),
            FieldSpec::textual("home_team").stored(),
            FieldSpec::textual("away_team").stored(),
            FieldSpec::textual("batsman1_name"),
            FieldSpec::textual("batsman2_name"),
            FieldSpec::textual("bowler1_name"),
            FieldSpec::textual("bowler2_name"),
            FieldSpec::textual("shortText"),
            FieldSpec::textual("text").required(),
            FieldSpec::textual("wkt_batsman_name"),
            FieldSpec::textual("wkt_bowler_name"),
            FieldSpec::textual("wkt_text"),
            FieldSpec::passthrough("season"),
            FieldSpec::passthrough("over"),
            FieldSpec::passthrough("ball"),
        ])
    }

    /// Check the schema once, before any record is read.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(CreaseError::invalid_config("schema has no fields"));
        }

        let mut seen = AHashSet::with_capacity(self.fields.len());
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(CreaseError::invalid_config("schema field with empty name"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(CreaseError::invalid_config(format!(
                    "duplicate schema field `{}`",
                    field.name
                )));
            }
        }

        if !self.fields.iter().any(FieldSpec::is_textual) {
            return Err(CreaseError::invalid_config("schema has no textual field"));
        }

        Ok(())
    }

    pub fn textual_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_textual())
    }

    pub fn stored_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.is_stored())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl Default for RecordSchema {
    fn default() -> Self {
        Self::ipl()
    }
}
