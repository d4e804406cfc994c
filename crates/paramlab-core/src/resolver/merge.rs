//! Field-by-field merge of an override record into a catalog parameter.

use crate::catalog::coerce;
use crate::overrides::OverrideRecord;
use crate::param::{Control, ParamValue, ParameterSpec, SpecField, SpecViolation};

/// Outcome of applying one override record.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Merged {
    pub spec: ParameterSpec,
    pub overridden: Vec<SpecField>,
    pub violations: Vec<SpecViolation>,
}

/// Applies `record` on top of `spec`.
///
/// Fields present in the record replace the catalog's; absent fields are
/// inherited. A field that cannot be applied (wrong type, or not meaningful
/// for the widget) is reported and the catalog value is kept. The merged
/// control is then checked again, so a narrowed range or option list that
/// no longer admits the inherited default is reported, never clamped.
pub(crate) fn merge(spec: &ParameterSpec, record: &OverrideRecord) -> Merged {
    let mut control = spec.control.clone();
    let mut overridden = Vec::new();
    let mut violations = Vec::new();
    let widget = control.widget_kind();

    if let Some(value) = &record.default_value {
        match coerce(value, SpecField::DefaultValue, control.value_type()) {
            Ok(value) => {
                set_default(&mut control, value);
                overridden.push(SpecField::DefaultValue);
            }
            Err(violation) => violations.push(violation),
        }
    }

    if record.rationale.is_some() {
        overridden.push(SpecField::Rationale);
    }

    let bounds = [
        (SpecField::Min, &record.min),
        (SpecField::Max, &record.max),
        (SpecField::Step, &record.step),
    ];
    for (field, value) in bounds {
        let Some(value) = value else {
            continue;
        };
        let Some(numeric) = control.numeric_mut() else {
            violations.push(SpecViolation::InapplicableField { field, widget });
            continue;
        };

        match coerce(value, field, numeric.value_type) {
            Ok(value) => {
                match field {
                    SpecField::Min => numeric.bounds.min = value,
                    SpecField::Max => numeric.bounds.max = value,
                    _ => numeric.bounds.step = Some(value),
                }
                overridden.push(field);
            }
            Err(violation) => violations.push(violation),
        }
    }

    if let Some(options) = &record.options {
        match &mut control {
            Control::Dropdown {
                options: current, ..
            } => {
                current.clone_from(options);
                overridden.push(SpecField::Options);
            }
            _ => violations.push(SpecViolation::InapplicableField {
                field: SpecField::Options,
                widget,
            }),
        }
    }

    violations.extend(control.violations());

    let spec = ParameterSpec {
        rationale: record.rationale.clone().or_else(|| spec.rationale.clone()),
        control,
        ..spec.clone()
    };
    Merged {
        spec,
        overridden,
        violations,
    }
}

/// Replaces the default of `control` with an already coerced value.
fn set_default(control: &mut Control, value: ParamValue) {
    match (control, value) {
        (Control::Slider(numeric) | Control::Number(numeric), value) => numeric.default = value,
        (Control::Checkbox { default }, ParamValue::Bool(value)) => *default = value,
        (Control::Dropdown { default, .. } | Control::Text { default }, ParamValue::Text(value)) => {
            *default = value;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Bounds, Numeric, ValueType};

    fn top_k() -> ParameterSpec {
        ParameterSpec::new(
            "top_k",
            Control::Slider(Numeric::new(ValueType::Int, Bounds::new(0, 100).with_step(1), 50)),
        )
        .unwrap()
        .with_rationale("Balanced sampling.")
    }

    fn pooling() -> ParameterSpec {
        ParameterSpec::new(
            "pooling",
            Control::Dropdown {
                options: vec!["mean".into(), "max".into(), "cls".into()],
                default: "mean".into(),
            },
        )
        .unwrap()
    }

    #[test]
    fn empty_record_is_identity() {
        let merged = merge(&top_k(), &OverrideRecord::default());
        assert_eq!(merged.spec, top_k());
        assert!(merged.overridden.is_empty());
        assert!(merged.violations.is_empty());
    }

    #[test]
    fn present_fields_replace_absent_fields_inherit() {
        let record = OverrideRecord::default()
            .with_default_value(20)
            .with_max(60);
        let merged = merge(&top_k(), &record);

        let bounds = merged.spec.bounds().unwrap();
        assert_eq!(merged.spec.default_value(), ParamValue::Int(20));
        assert_eq!(bounds.max, ParamValue::Int(60));
        assert_eq!(bounds.min, ParamValue::Int(0));
        assert_eq!(merged.spec.rationale(), Some("Balanced sampling."));
        assert_eq!(merged.overridden, vec![SpecField::DefaultValue, SpecField::Max]);
        assert!(merged.violations.is_empty());
    }

    #[test]
    fn narrowed_bounds_are_reported_not_clamped() {
        let merged = merge(&top_k(), &OverrideRecord::default().with_max(40));
        assert_eq!(merged.spec.default_value(), ParamValue::Int(50));
        assert_eq!(merged.spec.bounds().unwrap().max, ParamValue::Int(40));
        assert_eq!(
            merged.violations,
            vec![SpecViolation::DefaultOutOfBounds {
                default: ParamValue::Int(50),
                min: ParamValue::Int(0),
                max: ParamValue::Int(40),
            }]
        );
    }

    #[test]
    fn narrowed_options_are_reported() {
        let record = OverrideRecord::default().with_options(["max", "cls"]);
        let merged = merge(&pooling(), &record);
        assert_eq!(merged.spec.options().unwrap(), ["max", "cls"]);
        assert_eq!(merged.violations[0].kind(), "default_not_in_options");
    }

    #[test]
    fn mistyped_value_keeps_catalog_value() {
        let record = OverrideRecord::default().with_default_value("many");
        let merged = merge(&top_k(), &record);
        assert_eq!(merged.spec.default_value(), ParamValue::Int(50));
        assert!(merged.overridden.is_empty());
        assert_eq!(merged.violations[0].kind(), "type_mismatch");
    }

    #[test]
    fn bounds_on_dropdown_are_inapplicable() {
        let record = OverrideRecord::default()
            .with_default_value("cls")
            .with_rationale("captures whole sequence")
            .with_min(1);
        let merged = merge(&pooling(), &record);
        assert_eq!(merged.spec.default_value(), ParamValue::Text("cls".into()));
        assert_eq!(merged.spec.rationale(), Some("captures whole sequence"));
        assert_eq!(
            merged.violations,
            vec![SpecViolation::InapplicableField {
                field: SpecField::Min,
                widget: crate::param::WidgetKind::Dropdown,
            }]
        );
    }

    #[test]
    fn float_parameter_accepts_integer_override() {
        let temperature = ParameterSpec::new(
            "temperature",
            Control::Slider(Numeric::new(ValueType::Float, Bounds::new(0.0, 1.5), 0.7)),
        )
        .unwrap();
        let merged = merge(&temperature, &OverrideRecord::default().with_default_value(1));
        assert_eq!(merged.spec.default_value(), ParamValue::Float(1.0));
    }
}
