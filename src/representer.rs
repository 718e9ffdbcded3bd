use std::any::TypeId;
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::SecondsFormat;

use crate::node::{Node, NodeValue, UserValue};
use crate::SerializerError;

/// A representer hook: turns a user value back into a plain node.
pub type RepresentFn = Box<dyn Fn(&dyn UserValue) -> Node>;

/// User-defined representations, keyed by the concrete type of the value.
///
/// The serializer consults the registry whenever it meets a
/// [`NodeValue::User`] in the tree; a value whose type has no registered
/// representer cannot be serialized.
#[derive(Default)]
pub struct RepresenterRegistry {
    hooks: HashMap<TypeId, RepresentFn>,
}

impl RepresenterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the representer for values of type `T`.
    pub fn register<T: UserValue + 'static>(&mut self, hook: RepresentFn) {
        self.hooks.insert(TypeId::of::<T>(), hook);
    }

    pub(crate) fn represent(&self, value: &dyn UserValue) -> Result<Node, SerializerError> {
        match self.hooks.get(&value.as_any().type_id()) {
            Some(hook) => Ok(hook(value)),
            None => Err(SerializerError::UnrepresentableValue {
                type_name: value.type_name(),
            }),
        }
    }
}

/// Render a scalar value to its YAML text form.
///
/// The spellings are chosen so that re-resolving the text yields the original
/// tag wherever the YAML 1.1 grammar allows it; floats always carry a decimal
/// point and a signed exponent for that reason.
pub(crate) fn render_scalar(value: &NodeValue) -> String {
    match value {
        NodeValue::Null => String::from("null"),
        NodeValue::Bool(true) => String::from("true"),
        NodeValue::Bool(false) => String::from("false"),
        NodeValue::Int(value) => {
            let mut buffer = itoa::Buffer::new();
            String::from(buffer.format(*value))
        }
        NodeValue::Float(value) => render_float(*value),
        NodeValue::String(value) => value.clone(),
        NodeValue::Bytes(bytes) => BASE64.encode(bytes),
        NodeValue::Timestamp(value) => value.to_rfc3339_opts(SecondsFormat::AutoSi, false),
        NodeValue::Sequence(_) | NodeValue::Mapping(_) | NodeValue::User(_) => {
            unreachable!("render_scalar on a non-scalar value")
        }
    }
}

fn render_float(value: f64) -> String {
    if value.is_nan() {
        return String::from(".nan");
    }
    if value.is_infinite() {
        return String::from(if value > 0.0 { ".inf" } else { "-.inf" });
    }
    let mut buffer = ryu::Buffer::new();
    let rendered = buffer.format(value);
    match rendered.find(|ch| ch == 'e' || ch == 'E') {
        Some(position) => {
            let (mantissa, exponent) = rendered.split_at(position);
            let exponent = &exponent[1..];
            let mantissa = if mantissa.contains('.') {
                String::from(mantissa)
            } else {
                format!("{mantissa}.0")
            };
            let exponent = if exponent.starts_with('-') || exponent.starts_with('+') {
                String::from(exponent)
            } else {
                format!("+{exponent}")
            };
            format!("{mantissa}e{exponent}")
        }
        None if !rendered.contains('.') => format!("{rendered}.0"),
        None => String::from(rendered),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::resolver::Resolver;
    use crate::{FLOAT_TAG, INT_TAG, TIMESTAMP_TAG};

    #[test]
    fn rendered_scalars_re_resolve_to_their_tags() {
        let resolver = Resolver::new();
        let cases: Vec<(NodeValue, &str)> = vec![
            (NodeValue::Int(42), INT_TAG),
            (NodeValue::Int(-7), INT_TAG),
            (NodeValue::Float(1.5), FLOAT_TAG),
            (NodeValue::Float(1e300), FLOAT_TAG),
            (NodeValue::Float(f64::NAN), FLOAT_TAG),
            (NodeValue::Float(f64::NEG_INFINITY), FLOAT_TAG),
        ];
        for (value, expected_tag) in cases {
            let rendered = render_scalar(&value);
            assert_eq!(
                resolver.resolve(NodeKind::Scalar, None, &rendered, true),
                expected_tag,
                "rendered {rendered:?}"
            );
        }
    }

    #[test]
    fn timestamps_render_and_re_resolve() {
        let resolver = Resolver::new();
        let timestamp = chrono::DateTime::parse_from_rfc3339("2001-12-14T21:59:43.10-05:00")
            .unwrap();
        let rendered = render_scalar(&NodeValue::Timestamp(timestamp));
        assert_eq!(
            resolver.resolve(NodeKind::Scalar, None, &rendered, true),
            TIMESTAMP_TAG,
            "rendered {rendered:?}"
        );
    }

    #[test]
    fn floats_keep_roundtrip_precision() {
        for value in [0.1, -2.5e-10, 1e300, 3.0] {
            let rendered = render_float(value);
            assert_eq!(rendered.parse::<f64>().unwrap(), value, "rendered {rendered:?}");
        }
    }

    #[test]
    fn bytes_render_as_base64() {
        assert_eq!(render_scalar(&NodeValue::Bytes(b"GIF89a".to_vec())), "R0lGODlh");
    }
}
