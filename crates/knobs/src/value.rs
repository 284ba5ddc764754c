//! Dynamic option values.
//!
//! Options are type-erased at the store level: every entry is a [`Value`], and
//! semantic typing is applied later by named type filters. There is no null variant;
//! an option without a value is simply absent from the store.

use crate::error::OptionsError;
use indexmap::IndexMap;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// An opaque, shared host object stored as an option value.
///
/// Objects compare by identity: two `Object`s are equal only if they share the same allocation.
#[derive(Clone)]
pub struct Object {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl Object {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self { type_name: std::any::type_name::<T>(), inner: Arc::new(value) }
    }

    /// Rust type name of the wrapped value.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({})", self.type_name)
    }
}

/// A single option value.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Self>),
    Map(IndexMap<String, Self>),
    Object(Object),
}

impl Value {
    /// Wraps an arbitrary host value as an opaque [`Value::Object`].
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self::Object(Object::new(value))
    }

    /// Short lowercase name of the variant, used in diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    #[must_use]
    pub const fn is_int(&self) -> bool {
        matches!(self, Self::Int(_))
    }

    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float(_))
    }

    #[must_use]
    pub const fn is_str(&self) -> bool {
        matches!(self, Self::Str(_))
    }

    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// Maps and opaque host objects both count as objects.
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Self::Map(_) | Self::Object(_))
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns floats as-is and widens integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Object(obj) => obj.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Equality used for allow-lists.
    ///
    /// Identical variants compare structurally, integers and floats compare numerically, and a
    /// string equals a number when its trimmed text parses to that number. Nothing else coerces.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(i), Self::Float(f)) | (Self::Float(f), Self::Int(i)) => *i as f64 == *f,
            (Self::Str(s), n @ (Self::Int(_) | Self::Float(_)))
            | (n @ (Self::Int(_) | Self::Float(_)), Self::Str(s)) => {
                parse_number(s).is_some_and(|parsed| parsed.loose_eq(n))
            },
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            },
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.loose_eq(w)))
            },
            _ => self == other,
        }
    }
}

fn parse_number(text: &str) -> Option<Value> {
    let text = text.trim();
    text.parse::<i64>()
        .map(Value::Int)
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|f| f.is_finite()).map(Value::Float))
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            },
            Self::Map(map) => {
                f.write_str("{")?;
                for (idx, (key, item)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            },
            Self::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

// --- Conversions ---

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Int(value.into())
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl From<IndexMap<String, Self>> for Value {
    fn from(value: IndexMap<String, Self>) -> Self {
        Self::Map(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl TryFrom<serde_json::Value> for Value {
    type Error = OptionsError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value as Json;

        Ok(match value {
            Json::Null => {
                return Err(OptionsError::invalid_argument(
                    "null is not a storable option value",
                ));
            },
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .ok_or_else(|| {
                    OptionsError::invalid_argument(format!("number {n} is out of range"))
                })?,
            Json::String(s) => Self::Str(s),
            Json::Array(items) => {
                Self::List(items.into_iter().map(Self::try_from).collect::<Result<_, _>>()?)
            },
            Json::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, item)| Ok((key, Self::try_from(item)?)))
                    .collect::<Result<_, OptionsError>>()?,
            ),
        })
    }
}

// --- Serde ---

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
            Self::Object(obj) => Err(S::Error::custom(format!(
                "opaque object `{}` cannot be serialized",
                obj.type_name()
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a boolean, number, string, sequence or map")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(i64::try_from(v).map_or(Value::Float(v as f64), Value::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::Str(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::Str(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Value, A::Error> {
        let mut map = IndexMap::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, item)) = access.next_entry::<String, Value>()? {
            map.insert(key, item);
        }
        Ok(Value::Map(map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, PartialEq)]
    struct Photo(&'static str);

    #[test]
    fn loose_eq_coerces_numbers_and_numeric_strings() {
        assert!(Value::Int(80).loose_eq(&Value::Float(80.0)));
        assert!(Value::from("80").loose_eq(&Value::Int(80)));
        assert!(Value::Float(0.5).loose_eq(&Value::from(" 0.5 ")));
        assert!(!Value::from("80a").loose_eq(&Value::Int(80)));
        assert!(!Value::Bool(true).loose_eq(&Value::from("tokopedia.com")));
        assert!(Value::from("a").loose_eq(&Value::from("a")));
    }

    #[test]
    fn loose_eq_never_coerces_bools() {
        assert!(!Value::Bool(true).loose_eq(&Value::from("1")));
        assert!(!Value::from("1").loose_eq(&Value::Bool(true)));
        assert!(!Value::Bool(false).loose_eq(&Value::Int(0)));
        assert!(!Value::Bool(false).loose_eq(&Value::from("")));
        assert!(Value::Bool(true).loose_eq(&Value::Bool(true)));
    }

    #[test]
    fn objects_compare_by_identity() {
        let photo = Value::object(Photo("cat.png"));
        let copy = photo.clone();
        let other = Value::object(Photo("cat.png"));

        assert_eq!(photo, copy);
        assert_ne!(photo, other);
        assert_eq!(photo.downcast_ref::<Photo>(), Some(&Photo("cat.png")));
        assert!(photo.is_object());
        assert!(Value::Map(IndexMap::new()).is_object());
    }

    #[test]
    fn json_conversion_preserves_order_and_rejects_null() {
        let value = Value::try_from(json!({ "b": 1, "a": [true, 2.5, "x"] })).unwrap();
        let map = value.as_map().unwrap();
        assert_eq!(map.keys().collect::<Vec<_>>(), ["b", "a"]);
        assert_eq!(map["a"], Value::List(vec![true.into(), 2.5.into(), "x".into()]));

        let err = Value::try_from(json!({ "a": null })).unwrap_err();
        assert!(matches!(err, OptionsError::InvalidArgument { .. }));
    }

    #[test]
    fn serde_roundtrip_through_json_text() {
        let value = Value::try_from(json!({ "port": 443, "tls": { "on": true } })).unwrap();
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"{"port":443,"tls":{"on":true}}"#);

        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);

        assert!(serde_json::to_string(&Value::object(Photo("x"))).is_err());
    }

    #[test]
    fn display_renders_nested_values() {
        let value = Value::try_from(json!({ "hosts": ["a", "b"], "port": 80 })).unwrap();
        assert_eq!(value.to_string(), "{hosts: [a, b], port: 80}");
    }
}
