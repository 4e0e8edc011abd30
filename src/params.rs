// SPDX: CC0-1.0

use crate::{
    annotate::{ParamKind, ParamValue, ParameterSpec, Scale},
    Number,
};
use core::fmt;
use tracing::debug;

/// Value from a normalized slider position `u` in `[0, 1]`.
pub fn linear_to_value(u: Number, min: Number, max: Number, scale: Scale, is_integer: bool) -> Number {
    match scale {
        Scale::Linear => {
            let raw = min + u * (max - min);
            if is_integer {
                raw.round()
            } else {
                raw
            }
        }
        Scale::Log => {
            let (log_min, log_max) = (min.ln(), max.ln());
            (log_min + u * (log_max - log_min)).exp()
        }
    }
}

/// Normalized slider position of `value`; the inverse of [`linear_to_value`]
/// (without rounding).
pub fn value_to_linear(value: Number, min: Number, max: Number, scale: Scale) -> Number {
    match scale {
        Scale::Linear => (value - min) / (max - min),
        Scale::Log => {
            let (log_min, log_max) = (min.ln(), max.ln());
            (value.ln() - log_min) / (log_max - log_min)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub spec: ParameterSpec,
    pub value: ParamValue,
}

impl Parameter {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Slider position of the current value, `None` for checkboxes.
    pub fn normalized(&self) -> Option<Number> {
        match (self.spec.kind, self.value) {
            (ParamKind::Range { min, max, scale, .. }, ParamValue::Number(value)) => {
                Some(value_to_linear(value, min, max, scale))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ParamErr {
    Unknown { name: String },
    KindMismatch { name: String, expected: &'static str },
    NotASlider { name: String },
}

impl fmt::Display for ParamErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown { name } => write!(f, "no parameter named '{name}'"),
            Self::KindMismatch { name, expected } => {
                write!(f, "parameter '{name}' takes a {expected}")
            }
            Self::NotASlider { name } => write!(f, "parameter '{name}' is not a slider"),
        }
    }
}

const fn kind_name(kind: &ParamKind) -> &'static str {
    match kind {
        ParamKind::Range { .. } => "number",
        ParamKind::Checkbox => "boolean",
    }
}

const fn fits(kind: &ParamKind, value: &ParamValue) -> bool {
    matches!(
        (kind, value),
        (ParamKind::Range { .. }, ParamValue::Number(_)) | (ParamKind::Checkbox, ParamValue::Bool(_))
    )
}

/// Current values of the discovered parameters, in declaration order.
#[derive(Clone, Debug, Default)]
pub struct ParameterStore {
    params: Vec<Parameter>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the parameter set with `specs`. A name seen before keeps its
    /// current value as long as the value still fits the parameter's kind;
    /// new names start at their default.
    pub fn merge(&mut self, specs: Vec<ParameterSpec>) -> &[Parameter] {
        let old = core::mem::take(&mut self.params);
        self.params = specs
            .into_iter()
            .map(|spec| {
                let value = old
                    .iter()
                    .find(|p| p.spec.name == spec.name)
                    .map(|p| p.value)
                    .filter(|value| fits(&spec.kind, value))
                    .unwrap_or(spec.default);
                Parameter { spec, value }
            })
            .collect();
        debug!(count = self.params.len(), "merged parameters");
        &self.params
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Parameter> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name() == name)
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Parameter, ParamErr> {
        self.params
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| ParamErr::Unknown {
                name: name.to_string(),
            })
    }

    /// Direct edit of a value; the source text is left alone.
    pub fn set(&mut self, name: &str, value: ParamValue) -> Result<(), ParamErr> {
        let param = self.get_mut(name)?;
        if !fits(&param.spec.kind, &value) {
            return Err(ParamErr::KindMismatch {
                name: name.to_string(),
                expected: kind_name(&param.spec.kind),
            });
        }
        param.value = value;
        Ok(())
    }

    /// Moves a slider to normalized position `u`.
    pub fn set_normalized(&mut self, name: &str, u: Number) -> Result<Number, ParamErr> {
        let param = self.get_mut(name)?;
        let ParamKind::Range {
            min,
            max,
            scale,
            is_integer,
        } = param.spec.kind
        else {
            return Err(ParamErr::NotASlider {
                name: name.to_string(),
            });
        };
        let value = linear_to_value(u.clamp(0.0, 1.0), min, max, scale, is_integer);
        param.value = ParamValue::Number(value);
        Ok(value)
    }

    /// Flips a checkbox and returns its new state.
    pub fn toggle(&mut self, name: &str) -> Result<bool, ParamErr> {
        let param = self.get_mut(name)?;
        match param.value {
            ParamValue::Bool(b) => {
                param.value = ParamValue::Bool(!b);
                Ok(!b)
            }
            ParamValue::Number(_) => Err(ParamErr::KindMismatch {
                name: name.to_string(),
                expected: kind_name(&param.spec.kind),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn range(name: &str, min: Number, max: Number, default: Number) -> ParameterSpec {
        ParameterSpec {
            name: name.to_string(),
            kind: ParamKind::Range {
                min,
                max,
                scale: Scale::Linear,
                is_integer: false,
            },
            default: ParamValue::Number(default),
        }
    }

    #[test]
    fn slider_round_trip() {
        for scale in [Scale::Linear, Scale::Log] {
            for (min, max) in [(0.1, 5.0), (1.0, 1000.0), (0.001, 0.002)] {
                for v in [min, (min + max) / 2.0, max * 0.9] {
                    let u = value_to_linear(v, min, max, scale);
                    assert_relative_eq!(linear_to_value(u, min, max, scale, false), v, max_relative = 1e-9);
                }
            }
        }
    }

    #[test]
    fn log_slider_midpoint_is_geometric_mean() {
        assert_relative_eq!(linear_to_value(0.5, 0.1, 10.0, Scale::Log, false), 1.0, epsilon = 1e-12);
        assert_relative_eq!(value_to_linear(1.0, 0.1, 10.0, Scale::Log), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn integer_sliders_round() {
        assert_eq!(linear_to_value(0.52, 2.0, 16.0, Scale::Linear, true), 9.0);
        // the reverse direction does not round
        assert_relative_eq!(value_to_linear(9.0, 2.0, 16.0, Scale::Linear), 0.5);
    }

    #[test]
    fn merge_preserves_values_by_name() {
        let mut store = ParameterStore::new();
        store.merge(vec![range("a", 0.0, 1.0, 0.5), range("b", 0.0, 1.0, 0.5)]);
        store.set("a", ParamValue::Number(0.9)).unwrap();

        // bounds of `a` changed, `b` renamed to `c`
        store.merge(vec![range("a", 0.0, 10.0, 5.0), range("c", 0.0, 1.0, 0.25)]);
        assert_eq!(store.get("a").unwrap().value, ParamValue::Number(0.9));
        assert_eq!(store.get("c").unwrap().value, ParamValue::Number(0.25));
        assert!(store.get("b").is_none());
    }

    #[test]
    fn merge_resets_value_of_changed_kind() {
        let mut store = ParameterStore::new();
        store.merge(vec![range("a", 0.0, 1.0, 0.5)]);
        store.merge(vec![ParameterSpec {
            name: "a".to_string(),
            kind: ParamKind::Checkbox,
            default: ParamValue::Bool(true),
        }]);
        assert_eq!(store.get("a").unwrap().value, ParamValue::Bool(true));
    }

    #[test]
    fn set_checks_kind_and_name() {
        let mut store = ParameterStore::new();
        store.merge(vec![range("a", 0.0, 1.0, 0.5)]);
        assert_eq!(
            store.set("a", ParamValue::Bool(true)),
            Err(ParamErr::KindMismatch {
                name: "a".to_string(),
                expected: "number"
            })
        );
        assert!(matches!(
            store.set("z", ParamValue::Number(1.0)),
            Err(ParamErr::Unknown { .. })
        ));
        assert!(store.toggle("a").is_err());
    }

    #[test]
    fn set_normalized_moves_slider() {
        let mut store = ParameterStore::new();
        store.merge(vec![range("a", -1.0, 1.0, 0.0)]);
        assert_relative_eq!(store.set_normalized("a", 0.75).unwrap(), 0.5);
        assert_relative_eq!(store.get("a").unwrap().normalized().unwrap(), 0.75);
    }
}
