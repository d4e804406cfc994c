//! Scalar parameter values.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::ValueType;

/// A scalar value held by a parameter: an ideal, a bound or a user edit.
///
/// Serialized untagged, so it reads and writes plain JSON scalars.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Text(String),
}

impl ParamValue {
    /// Returns the natural [`ValueType`] of this value.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Bool(_) => ValueType::Bool,
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Text(_) => ValueType::String,
        }
    }

    /// Returns the value as `f64` if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as `bool` if it is a flag.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as `&str` if it is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Strictly converts the value to `target`.
    ///
    /// Integers widen to floats and integral floats narrow to integers.
    /// Every other cross-type conversion fails, so a document that puts a
    /// string where a number belongs is rejected rather than reinterpreted.
    #[must_use]
    pub fn coerce(&self, target: ValueType) -> Option<Self> {
        match (self, target) {
            (Self::Int(value), ValueType::Int) => Some(Self::Int(*value)),
            (Self::Int(value), ValueType::Float) => Some(Self::Float(*value as f64)),
            (Self::Float(value), ValueType::Float) => Some(Self::Float(*value)),
            (Self::Float(value), ValueType::Int) => integral(*value).map(Self::Int),
            (Self::Bool(value), ValueType::Bool) => Some(Self::Bool(*value)),
            (Self::Text(value), ValueType::String) => Some(Self::Text(value.clone())),
            _ => None,
        }
    }

    /// Leniently converts a user-supplied value to `target`.
    ///
    /// Strings parse to numbers, floats truncate to integers, numbers become
    /// flags by being non-zero and strings become flags when they read as
    /// `1`, `true`, `yes` or `on`. Anything converts to a string.
    #[must_use]
    pub fn cast(&self, target: ValueType) -> Option<Self> {
        match target {
            ValueType::Int => match self {
                Self::Int(value) => Some(Self::Int(*value)),
                Self::Float(value) => truncated(*value).map(Self::Int),
                Self::Bool(value) => Some(Self::Int(i64::from(*value))),
                Self::Text(value) => value.trim().parse().ok().map(Self::Int),
            },
            ValueType::Float => match self {
                Self::Int(value) => Some(Self::Float(*value as f64)),
                Self::Float(value) => Some(Self::Float(*value)),
                Self::Bool(value) => Some(Self::Float(f64::from(u8::from(*value)))),
                Self::Text(value) => value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|parsed| parsed.is_finite())
                    .map(Self::Float),
            },
            ValueType::Bool => Some(Self::Bool(match self {
                Self::Bool(value) => *value,
                Self::Int(value) => *value != 0,
                Self::Float(value) => *value != 0.0,
                Self::Text(value) => {
                    let value = value.trim().to_ascii_lowercase();
                    matches!(value.as_str(), "1" | "true" | "yes" | "on")
                }
            })),
            ValueType::String => Some(Self::Text(self.to_string())),
        }
    }
}

fn integral(value: f64) -> Option<i64> {
    (value.fract() == 0.0).then(|| truncated(value)).flatten()
}

fn truncated(value: f64) -> Option<i64> {
    let value = value.trunc();
    (value.is_finite() && value >= i64::MIN as f64 && value <= i64::MAX as f64)
        .then_some(value as i64)
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_plain_scalars() {
        let values: Vec<ParamValue> = serde_json::from_str(r#"[true, 3, 0.5, "cls"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                ParamValue::Bool(true),
                ParamValue::Int(3),
                ParamValue::Float(0.5),
                ParamValue::Text("cls".into()),
            ]
        );
    }

    #[test]
    fn serializes_floats_with_fraction() {
        let json = serde_json::to_string(&ParamValue::Float(1.0)).unwrap();
        assert_eq!(json, "1.0");
    }

    #[test]
    fn coerce_is_strict() {
        assert_eq!(
            ParamValue::Int(2).coerce(ValueType::Float),
            Some(ParamValue::Float(2.0))
        );
        assert_eq!(
            ParamValue::Float(4.0).coerce(ValueType::Int),
            Some(ParamValue::Int(4))
        );
        assert_eq!(ParamValue::Float(4.5).coerce(ValueType::Int), None);
        assert_eq!(ParamValue::Text("5".into()).coerce(ValueType::Int), None);
        assert_eq!(ParamValue::Int(1).coerce(ValueType::Bool), None);
    }

    #[test]
    fn cast_is_lenient() {
        assert_eq!(
            ParamValue::Text(" 42 ".into()).cast(ValueType::Int),
            Some(ParamValue::Int(42))
        );
        assert_eq!(
            ParamValue::Float(3.9).cast(ValueType::Int),
            Some(ParamValue::Int(3))
        );
        assert_eq!(
            ParamValue::Text("0.25".into()).cast(ValueType::Float),
            Some(ParamValue::Float(0.25))
        );
        assert_eq!(
            ParamValue::Text("Yes".into()).cast(ValueType::Bool),
            Some(ParamValue::Bool(true))
        );
        assert_eq!(
            ParamValue::Text("nope".into()).cast(ValueType::Bool),
            Some(ParamValue::Bool(false))
        );
        assert_eq!(
            ParamValue::Int(0).cast(ValueType::Bool),
            Some(ParamValue::Bool(false))
        );
        assert_eq!(
            ParamValue::Float(0.7).cast(ValueType::String),
            Some(ParamValue::Text("0.7".into()))
        );
        assert_eq!(ParamValue::Text("many".into()).cast(ValueType::Int), None);
        assert_eq!(ParamValue::Text("NaN".into()).cast(ValueType::Float), None);
    }
}
