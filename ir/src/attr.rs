//! Attribute values attached to operation nodes.
//!
//! Attributes are a closed tagged variant over the categories the import
//! layer produces: scalars, scalar lists, shapes, tensor constants, type
//! tags, and nested lists. `Opaque` carries raw payloads stored under
//! reserved-prefix keys without conversion; it is rejected under ordinary
//! keys at node construction.

use crate::dtype::DType;
use crate::types::{ScalarValue, TensorShape, RESERVED_ATTR_PREFIX};

/// Generic typed attribute value.
#[derive(Debug, Clone, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub enum AttrValue {
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
    Shape(TensorShape),
    TensorConst { dtype: DType, shape: TensorShape, data: Vec<u8> },
    TypeTag(DType),
    NestedList(Vec<AttrValue>),
    /// Raw payload, stored as given. Only legal under reserved-prefix keys.
    Opaque(Vec<u8>),
}

impl AttrValue {
    /// Whether this value may be stored under the given attribute key.
    ///
    /// Opaque payloads are restricted to reserved internal keys; every other
    /// variant is legal anywhere.
    pub fn permitted_under(&self, key: &str) -> bool {
        !matches!(self, AttrValue::Opaque(_)) || key.starts_with(RESERVED_ATTR_PREFIX)
    }

    /// The scalar string payload, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Scalar(ScalarValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// The scalar integer payload, if this is an integer scalar.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Scalar(ScalarValue::Int(v)) => Some(*v),
            _ => None,
        }
    }
}

impl From<ScalarValue> for AttrValue {
    fn from(v: ScalarValue) -> Self {
        AttrValue::Scalar(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Scalar(ScalarValue::Int(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Scalar(ScalarValue::Float(v))
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Scalar(ScalarValue::Bool(v))
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Scalar(ScalarValue::Str(v.to_string()))
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Scalar(ScalarValue::Str(v))
    }
}

impl From<DType> for AttrValue {
    fn from(v: DType) -> Self {
        AttrValue::TypeTag(v)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::List(v.into_iter().map(ScalarValue::Int).collect())
    }
}

impl From<Vec<f64>> for AttrValue {
    fn from(v: Vec<f64>) -> Self {
        AttrValue::List(v.into_iter().map(ScalarValue::Float).collect())
    }
}
