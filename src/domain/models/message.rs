//! Structured messages attached to measurements.
//!
//! A probe reports more than pass/fail through [`Message`]s. Each probe
//! declares the schema of the messages it may emit as a list of
//! [`MessageDescription`]s; the executor binds every returned message to its
//! description by name so renderers can label and format values without the
//! probe repeating presentation metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Datatype of a message value as declared in its description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Datatype {
    Bool,
    Integer,
    Float,
    Text,
    Timestamp,
    Duration,
}

/// Whether renderers should show a message by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Shown,
    Hidden,
}

/// How many instances of a message a single measurement may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Cardinality {
    /// Exactly one
    #[default]
    Singular,
    /// Zero or one
    Optional,
    /// Any number, distinguished by position
    List,
    /// Any number, distinguished by `parameter`
    Keyed,
}

/// Static schema metadata for one kind of message a probe can emit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageDescription {
    /// Schema key matched against [`Message::name`]
    pub name: String,
    /// Short display label
    pub label: String,
    /// Long description
    pub description: String,
    pub datatype: Datatype,
    /// Unit suffix for display, e.g. `ms`
    pub unit: Option<String>,
    /// Free-form display hint for renderers
    pub hint: Option<String>,
    pub visibility: Visibility,
    pub cardinality: Cardinality,
}

impl MessageDescription {
    /// Create a shown, singular description.
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
        datatype: Datatype,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: description.into(),
            datatype,
            unit: None,
            hint: None,
            visibility: Visibility::Shown,
            cardinality: Cardinality::Singular,
        }
    }

    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    #[must_use]
    pub const fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.visibility = Visibility::Hidden;
        self
    }
}

/// A typed message value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MessageValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Duration(Duration),
}

impl MessageValue {
    pub fn datatype(&self) -> Datatype {
        match self {
            Self::Bool(_) => Datatype::Bool,
            Self::Integer(_) => Datatype::Integer,
            Self::Float(_) => Datatype::Float,
            Self::Text(_) => Datatype::Text,
            Self::Timestamp(_) => Datatype::Timestamp,
            Self::Duration(_) => Datatype::Duration,
        }
    }
}

impl fmt::Display for MessageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Timestamp(t) => f.write_str(&t.to_rfc3339()),
            Self::Duration(d) => write!(f, "{}s", d.as_secs()),
        }
    }
}

impl From<bool> for MessageValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for MessageValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<usize> for MessageValue {
    fn from(v: usize) -> Self {
        Self::Integer(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for MessageValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for MessageValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for MessageValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for MessageValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl From<Duration> for MessageValue {
    fn from(v: Duration) -> Self {
        Self::Duration(v)
    }
}

/// Either a value or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessagePayload {
    Value(MessageValue),
    Error(String),
}

/// A single structured fact attached to a measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Schema key
    pub name: String,
    /// Disambiguates repeated facts, e.g. one message per mountpoint
    pub parameter: Option<String>,
    pub payload: MessagePayload,
    /// Bound by the executor after the probe returns
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub description: Option<Arc<MessageDescription>>,
}

impl Message {
    /// Message carrying a value.
    pub fn value(name: impl Into<String>, value: impl Into<MessageValue>) -> Self {
        Self {
            name: name.into(),
            parameter: None,
            payload: MessagePayload::Value(value.into()),
            description: None,
        }
    }

    /// Message carrying an error string.
    pub fn error(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameter: None,
            payload: MessagePayload::Error(error.into()),
            description: None,
        }
    }

    /// Attach a parameter, for keyed or repeated messages.
    #[must_use]
    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    pub fn get_value(&self) -> Option<&MessageValue> {
        match &self.payload {
            MessagePayload::Value(v) => Some(v),
            MessagePayload::Error(_) => None,
        }
    }

    pub fn get_error(&self) -> Option<&str> {
        match &self.payload {
            MessagePayload::Value(_) => None,
            MessagePayload::Error(e) => Some(e),
        }
    }

    /// Label for display: the bound description's label, else the name.
    pub fn label(&self) -> &str {
        self.description
            .as_ref()
            .map_or(self.name.as_str(), |d| d.label.as_str())
    }

    /// False when the bound description is hidden. Errors are always shown.
    pub fn is_shown(&self) -> bool {
        self.get_error().is_some()
            || self
                .description
                .as_ref()
                .is_none_or(|d| d.visibility == Visibility::Shown)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(p) = &self.parameter {
            write!(f, ".{p}")?;
        }
        match &self.payload {
            MessagePayload::Value(v) => write!(f, "={v}"),
            MessagePayload::Error(e) => write!(f, "=ERROR: {e}"),
        }
    }
}
