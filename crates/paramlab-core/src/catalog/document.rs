//! Catalog document entries and their conversion into [`ParameterSpec`]s.

use serde::Deserialize;

use crate::param::{
    Bounds, Control, Numeric, ParamValue, ParameterSpec, SpecField, SpecViolation, ValueType,
    WidgetKind,
};

/// One parameter entry exactly as the catalog document spells it.
#[derive(Debug, Deserialize)]
pub(crate) struct RawParameter {
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type")]
    widget: WidgetKind,
    #[serde(default)]
    value_type: Option<ValueType>,
    #[serde(default)]
    ideal: Option<ParamValue>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    min: Option<ParamValue>,
    #[serde(default)]
    max: Option<ParamValue>,
    #[serde(default)]
    step: Option<ParamValue>,
    #[serde(default)]
    info: Option<String>,
    #[serde(default, rename = "ideal_value_reason")]
    rationale: Option<String>,
}

impl RawParameter {
    /// Builds a validated specification named `name`.
    pub(crate) fn into_spec(self, name: &str) -> Result<ParameterSpec, SpecViolation> {
        let value_type = self.value_type.unwrap_or_else(|| self.inferred_value_type());
        let widget = self.widget;

        let control = match widget {
            WidgetKind::Slider | WidgetKind::Number => {
                if !value_type.is_numeric() {
                    return Err(SpecViolation::WidgetTypeMismatch { widget, value_type });
                }
                reject(self.options.is_some(), SpecField::Options, widget)?;

                let min = required(self.min, SpecField::Min, widget)?;
                let min = coerce(&min, SpecField::Min, value_type)?;
                let max = required(self.max, SpecField::Max, widget)?;
                let max = coerce(&max, SpecField::Max, value_type)?;
                let step = self
                    .step
                    .map(|step| coerce(&step, SpecField::Step, value_type))
                    .transpose()?;
                let ideal = required(self.ideal, SpecField::DefaultValue, widget)?;
                let default = coerce(&ideal, SpecField::DefaultValue, value_type)?;

                let numeric = Numeric {
                    value_type,
                    bounds: Bounds { min, max, step },
                    default,
                };
                if widget == WidgetKind::Slider {
                    Control::Slider(numeric)
                } else {
                    Control::Number(numeric)
                }
            }
            WidgetKind::Checkbox => {
                if value_type != ValueType::Bool {
                    return Err(SpecViolation::WidgetTypeMismatch { widget, value_type });
                }
                self.reject_bounds()?;
                reject(self.options.is_some(), SpecField::Options, widget)?;

                let ideal = required(self.ideal, SpecField::DefaultValue, widget)?;
                let default = coerce(&ideal, SpecField::DefaultValue, value_type)?
                    .as_bool()
                    .unwrap_or_default();
                Control::Checkbox { default }
            }
            WidgetKind::Dropdown => {
                if value_type != ValueType::String {
                    return Err(SpecViolation::WidgetTypeMismatch { widget, value_type });
                }
                self.reject_bounds()?;

                let options = required(self.options, SpecField::Options, widget)?;
                let ideal = required(self.ideal, SpecField::DefaultValue, widget)?;
                let default = text(&ideal, value_type)?;
                Control::Dropdown { options, default }
            }
            WidgetKind::Text => {
                if value_type != ValueType::String {
                    return Err(SpecViolation::WidgetTypeMismatch { widget, value_type });
                }
                self.reject_bounds()?;
                reject(self.options.is_some(), SpecField::Options, widget)?;

                let ideal = required(self.ideal, SpecField::DefaultValue, widget)?;
                let default = text(&ideal, value_type)?;
                Control::Text { default }
            }
        };

        let mut spec = ParameterSpec::new(name, control)?;
        if let Some(label) = self.label {
            spec = spec.with_label(label);
        }
        if let Some(info) = self.info {
            spec = spec.with_info(info);
        }
        if let Some(rationale) = self.rationale {
            spec = spec.with_rationale(rationale);
        }
        Ok(spec)
    }

    /// Picks a value type for entries that do not declare one.
    fn inferred_value_type(&self) -> ValueType {
        match self.widget {
            WidgetKind::Checkbox => ValueType::Bool,
            WidgetKind::Dropdown | WidgetKind::Text => ValueType::String,
            WidgetKind::Slider | WidgetKind::Number => {
                let all_integers = [&self.ideal, &self.min, &self.max, &self.step]
                    .into_iter()
                    .flatten()
                    .all(|value| matches!(value, ParamValue::Int(_)));
                if all_integers {
                    ValueType::Int
                } else {
                    ValueType::Float
                }
            }
        }
    }

    fn reject_bounds(&self) -> Result<(), SpecViolation> {
        reject(self.min.is_some(), SpecField::Min, self.widget)?;
        reject(self.max.is_some(), SpecField::Max, self.widget)?;
        reject(self.step.is_some(), SpecField::Step, self.widget)
    }
}

fn required<T>(value: Option<T>, field: SpecField, widget: WidgetKind) -> Result<T, SpecViolation> {
    value.ok_or(SpecViolation::MissingField { field, widget })
}

fn reject(present: bool, field: SpecField, widget: WidgetKind) -> Result<(), SpecViolation> {
    if present {
        Err(SpecViolation::InapplicableField { field, widget })
    } else {
        Ok(())
    }
}

/// Strictly converts a document value for `field`.
pub(crate) fn coerce(
    value: &ParamValue,
    field: SpecField,
    expected: ValueType,
) -> Result<ParamValue, SpecViolation> {
    value
        .coerce(expected)
        .ok_or_else(|| SpecViolation::TypeMismatch {
            field,
            expected,
            found: value.clone(),
        })
}

fn text(value: &ParamValue, expected: ValueType) -> Result<String, SpecViolation> {
    match value {
        ParamValue::Text(text) => Ok(text.clone()),
        other => Err(SpecViolation::TypeMismatch {
            field: SpecField::DefaultValue,
            expected,
            found: other.clone(),
        }),
    }
}
