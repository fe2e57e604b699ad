use std::{collections::BTreeMap, fmt};

use geo::{Geometry, LineString, Point};
use serde::{Serialize, Serializer};
use wkt::ToWkt;

/// Attribute mapping of a node or an edge, ordered by key.
pub type Attrs = BTreeMap<String, Value>;

/// A single attribute value carried by a node or an edge.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Geometry(Geometry<f64>),
}

impl Value {
    /// Numeric view of the value. Numeric text is parsed; NaN, booleans and geometries are not numbers.
    pub fn as_f64(&self) -> Option<f64> {
        let number = match self {
            Value::Int(value) => *value as f64,
            Value::Float(value) => *value,
            Value::Text(text) => text.trim().parse::<f64>().ok()?,
            Value::Bool(_) | Value::Geometry(_) => return None,
        };
        (!number.is_nan()).then_some(number)
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self { Value::Text(text) => Some(text), _ => None }
    }

    #[inline]
    pub fn as_geometry(&self) -> Option<&Geometry<f64>> {
        match self { Value::Geometry(geometry) => Some(geometry), _ => None }
    }

    #[inline] pub fn is_geometry(&self) -> bool { matches!(self, Value::Geometry(_)) }

    /// Replace a structured geometry by its WKT text. Other values pass through.
    pub fn into_wkt(self) -> Value {
        match self {
            Value::Geometry(geometry) => Value::Text(geometry.wkt_string()),
            other => other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Text(text) => f.write_str(text),
            Value::Geometry(geometry) => f.write_str(&geometry.wkt_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::Text(text) => serializer.serialize_str(text),
            Value::Geometry(geometry) => serializer.serialize_str(&geometry.wkt_string()),
        }
    }
}

impl From<bool> for Value { fn from(value: bool) -> Self { Value::Bool(value) } }
impl From<i32> for Value { fn from(value: i32) -> Self { Value::Int(value as i64) } }
impl From<i64> for Value { fn from(value: i64) -> Self { Value::Int(value) } }
impl From<f64> for Value { fn from(value: f64) -> Self { Value::Float(value) } }
impl From<&str> for Value { fn from(value: &str) -> Self { Value::Text(value.to_string()) } }
impl From<String> for Value { fn from(value: String) -> Self { Value::Text(value) } }
impl From<Geometry<f64>> for Value { fn from(value: Geometry<f64>) -> Self { Value::Geometry(value) } }
impl From<LineString<f64>> for Value { fn from(value: LineString<f64>) -> Self { Value::Geometry(value.into()) } }
impl From<Point<f64>> for Value { fn from(value: Point<f64>) -> Self { Value::Geometry(value.into()) } }
