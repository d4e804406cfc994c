//! Parameter vocabulary: stages, widgets, values and specifications.

mod kind;
mod spec;
mod value;

pub use kind::{Stage, ValueType, WidgetKind};
pub use spec::{Bounds, Control, Numeric, ParameterSpec, SpecField, SpecViolation};
pub use value::ParamValue;
