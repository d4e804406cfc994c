//! Parameter specifications and their construction rules.

use serde::ser::{Serialize, Serializer};
use strum::{AsRefStr, Display, IntoStaticStr};

use super::{ParamValue, ValueType, WidgetKind};

/// A field of a parameter specification that a document can set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[derive(serde::Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SpecField {
    DefaultValue,
    Rationale,
    Min,
    Max,
    Step,
    Options,
}

/// Inclusive numeric range with an optional increment.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min: ParamValue,
    pub max: ParamValue,
    pub step: Option<ParamValue>,
}

impl Bounds {
    /// Creates bounds without a step.
    pub fn new(min: impl Into<ParamValue>, max: impl Into<ParamValue>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
            step: None,
        }
    }

    /// Sets the increment.
    #[must_use]
    pub fn with_step(mut self, step: impl Into<ParamValue>) -> Self {
        self.step = Some(step.into());
        self
    }

    /// Returns `true` if `min <= max`.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        match (self.min.as_f64(), self.max.as_f64()) {
            (Some(min), Some(max)) => min <= max,
            _ => false,
        }
    }

    /// Returns `true` if `value` lies within `[min, max]`.
    #[must_use]
    pub fn contains(&self, value: &ParamValue) -> bool {
        match (self.min.as_f64(), self.max.as_f64(), value.as_f64()) {
            (Some(min), Some(max), Some(value)) => min <= value && value <= max,
            _ => false,
        }
    }
}

/// Shape shared by slider and number controls.
#[derive(Debug, Clone, PartialEq)]
pub struct Numeric {
    pub value_type: ValueType,
    pub bounds: Bounds,
    pub default: ParamValue,
}

impl Numeric {
    /// Creates a numeric shape.
    pub fn new(value_type: ValueType, bounds: Bounds, default: impl Into<ParamValue>) -> Self {
        Self {
            value_type,
            bounds,
            default: default.into(),
        }
    }

    fn violations(&self, widget: WidgetKind, found: &mut Vec<SpecViolation>) {
        if !self.value_type.is_numeric() {
            found.push(SpecViolation::WidgetTypeMismatch {
                widget,
                value_type: self.value_type,
            });
            return;
        }

        if let Some(step) = &self.bounds.step
            && step.as_f64().is_none_or(|step| step <= 0.0)
        {
            found.push(SpecViolation::InvalidStep { step: step.clone() });
        }

        if !self.bounds.is_ordered() {
            found.push(SpecViolation::InvertedBounds {
                min: self.bounds.min.clone(),
                max: self.bounds.max.clone(),
            });
        } else if !self.bounds.contains(&self.default) {
            found.push(SpecViolation::DefaultOutOfBounds {
                default: self.default.clone(),
                min: self.bounds.min.clone(),
                max: self.bounds.max.clone(),
            });
        }
    }
}

/// The widget-specific part of a parameter.
///
/// Each variant carries exactly the metadata its widget needs, so a
/// checkbox can never hold bounds and a dropdown always has options.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Slider(Numeric),
    Number(Numeric),
    Checkbox { default: bool },
    Dropdown { options: Vec<String>, default: String },
    Text { default: String },
}

impl Control {
    /// Returns the widget this control renders as.
    #[must_use]
    pub const fn widget_kind(&self) -> WidgetKind {
        match self {
            Self::Slider(_) => WidgetKind::Slider,
            Self::Number(_) => WidgetKind::Number,
            Self::Checkbox { .. } => WidgetKind::Checkbox,
            Self::Dropdown { .. } => WidgetKind::Dropdown,
            Self::Text { .. } => WidgetKind::Text,
        }
    }

    /// Returns the data type of the control's values.
    #[must_use]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::Slider(numeric) | Self::Number(numeric) => numeric.value_type,
            Self::Checkbox { .. } => ValueType::Bool,
            Self::Dropdown { .. } | Self::Text { .. } => ValueType::String,
        }
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> ParamValue {
        match self {
            Self::Slider(numeric) | Self::Number(numeric) => numeric.default.clone(),
            Self::Checkbox { default } => ParamValue::Bool(*default),
            Self::Dropdown { default, .. } | Self::Text { default } => {
                ParamValue::Text(default.clone())
            }
        }
    }

    /// Returns the numeric shape of slider and number controls.
    #[must_use]
    pub const fn numeric(&self) -> Option<&Numeric> {
        match self {
            Self::Slider(numeric) | Self::Number(numeric) => Some(numeric),
            _ => None,
        }
    }

    pub(crate) fn numeric_mut(&mut self) -> Option<&mut Numeric> {
        match self {
            Self::Slider(numeric) | Self::Number(numeric) => Some(numeric),
            _ => None,
        }
    }

    /// Returns the bounds of numeric controls.
    #[must_use]
    pub fn bounds(&self) -> Option<&Bounds> {
        self.numeric().map(|numeric| &numeric.bounds)
    }

    /// Returns the options of a dropdown.
    #[must_use]
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Dropdown { options, .. } => Some(options),
            _ => None,
        }
    }

    /// Returns every rule the control breaks, in a stable order.
    #[must_use]
    pub fn violations(&self) -> Vec<SpecViolation> {
        let mut found = Vec::new();
        match self {
            Self::Slider(numeric) | Self::Number(numeric) => {
                numeric.violations(self.widget_kind(), &mut found);
            }
            Self::Dropdown { options, default } => {
                if options.is_empty() {
                    found.push(SpecViolation::EmptyOptions);
                } else {
                    for (index, option) in options.iter().enumerate() {
                        if options[..index].contains(option) {
                            found.push(SpecViolation::DuplicateOption {
                                option: option.clone(),
                            });
                        }
                    }
                    if !options.contains(default) {
                        found.push(SpecViolation::DefaultNotInOptions {
                            default: default.clone(),
                        });
                    }
                }
            }
            Self::Checkbox { .. } | Self::Text { .. } => {}
        }
        found
    }
}

/// A rule broken by a parameter definition.
///
/// Loading a catalog fails on the first violation. Resolving an override
/// collects every violation for the parameter and keeps going.
#[derive(Debug, Clone, PartialEq, thiserror::Error, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum SpecViolation {
    #[error("default value {default} is outside [{min}, {max}]")]
    DefaultOutOfBounds {
        default: ParamValue,
        min: ParamValue,
        max: ParamValue,
    },
    #[error("min {min} is greater than max {max}")]
    InvertedBounds { min: ParamValue, max: ParamValue },
    #[error("step {step} must be a positive number")]
    InvalidStep { step: ParamValue },
    #[error("default value '{default}' is not one of the options")]
    DefaultNotInOptions { default: String },
    #[error("dropdown has no options")]
    EmptyOptions,
    #[error("option '{option}' is listed more than once")]
    DuplicateOption { option: String },
    #[error("{field} expects a {expected} value, found {found}")]
    TypeMismatch {
        field: SpecField,
        expected: ValueType,
        found: ParamValue,
    },
    #[error("{field} does not apply to a {widget} parameter")]
    InapplicableField { field: SpecField, widget: WidgetKind },
    #[error("{widget} parameter requires {field}")]
    MissingField { field: SpecField, widget: WidgetKind },
    #[error("{widget} parameter cannot hold {value_type} values")]
    WidgetTypeMismatch {
        widget: WidgetKind,
        value_type: ValueType,
    },
}

impl SpecViolation {
    /// Returns the stable snake_case name of the violation.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.into()
    }
}

/// Immutable description of one tunable parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub(crate) name: String,
    pub(crate) label: String,
    pub(crate) info: Option<String>,
    pub(crate) rationale: Option<String>,
    pub(crate) control: Control,
}

impl ParameterSpec {
    /// Creates a parameter labelled by its name.
    ///
    /// # Errors
    ///
    /// Returns the first rule `control` breaks.
    pub fn new(name: impl Into<String>, control: Control) -> Result<Self, SpecViolation> {
        if let Some(violation) = control.violations().into_iter().next() {
            return Err(violation);
        }

        let name = name.into();
        Ok(Self {
            label: name.clone(),
            name,
            info: None,
            rationale: None,
            control,
        })
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the explanatory text.
    #[must_use]
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    /// Sets the justification for the default value.
    #[must_use]
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn info(&self) -> Option<&str> {
        self.info.as_deref()
    }

    pub fn rationale(&self) -> Option<&str> {
        self.rationale.as_deref()
    }

    pub const fn control(&self) -> &Control {
        &self.control
    }

    pub const fn widget_kind(&self) -> WidgetKind {
        self.control.widget_kind()
    }

    pub const fn value_type(&self) -> ValueType {
        self.control.value_type()
    }

    /// Returns the recommended ("ideal") value.
    pub fn default_value(&self) -> ParamValue {
        self.control.default_value()
    }

    pub fn bounds(&self) -> Option<&Bounds> {
        self.control.bounds()
    }

    pub fn options(&self) -> Option<&[String]> {
        self.control.options()
    }
}

#[derive(serde::Serialize)]
struct SpecView<'a> {
    name: &'a str,
    label: &'a str,
    widget_kind: WidgetKind,
    value_type: ValueType,
    default_value: ParamValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<&'a ParamValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<&'a ParamValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    step: Option<&'a ParamValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<&'a [String]>,
    rationale: Option<&'a str>,
    info: Option<&'a str>,
}

impl Serialize for ParameterSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let bounds = self.bounds();
        SpecView {
            name: &self.name,
            label: &self.label,
            widget_kind: self.widget_kind(),
            value_type: self.value_type(),
            default_value: self.default_value(),
            min: bounds.map(|bounds| &bounds.min),
            max: bounds.map(|bounds| &bounds.max),
            step: bounds.and_then(|bounds| bounds.step.as_ref()),
            options: self.options(),
            rationale: self.rationale(),
            info: self.info(),
        }
        .serialize(serializer)
    }
}
