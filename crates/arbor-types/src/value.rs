//! Property values: the closed sum type of everything a mergeable
//! property can hold.
//!
//! The merge algorithm dispatches on the variant tag:
//!
//! - scalars (`Null`, `Bool`, `Number`, `Text`) merge atomically;
//! - composites (`Map`, `Seq`) merge recursively;
//! - [`ComponentValue`]s (colors, points) merge component-wise and are
//!   reconstructed from their merged scalar components;
//! - [`OpaqueValue`]s are compared structurally and never taken apart.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A flat (or nested) property mapping: name → value.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single property value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Nested object-shaped mapping, recursively mergeable.
    Map(PropertyMap),
    /// Ordered sequence, merged by value membership rather than position.
    Seq(Vec<PropertyValue>),
    /// Fixed-arity domain value, merged component-wise.
    Component(ComponentValue),
    /// Opaque payload: compared for equality, never merged.
    Opaque(OpaqueValue),
}

impl PropertyValue {
    /// Whether this value is a composite (`Map` or `Seq`).
    pub fn is_composite(&self) -> bool {
        matches!(self, PropertyValue::Map(_) | PropertyValue::Seq(_))
    }

    pub fn as_map(&self) -> Option<&PropertyMap> {
        match self {
            PropertyValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[PropertyValue]> {
        match self {
            PropertyValue::Seq(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            PropertyValue::Null => "null",
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Number(_) => "number",
            PropertyValue::Text(_) => "text",
            PropertyValue::Map(_) => "map",
            PropertyValue::Seq(_) => "seq",
            PropertyValue::Component(_) => "component",
            PropertyValue::Opaque(_) => "opaque",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Null => write!(f, "null"),
            PropertyValue::Bool(b) => write!(f, "{b}"),
            PropertyValue::Number(n) => write!(f, "{n}"),
            PropertyValue::Text(s) => write!(f, "{s:?}"),
            PropertyValue::Map(m) => {
                write!(f, "{{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            PropertyValue::Seq(s) => {
                write!(f, "[")?;
                for (i, v) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v}")?;
                }
                write!(f, "]")
            }
            PropertyValue::Component(c) => write!(f, "{c}"),
            PropertyValue::Opaque(o) => write!(f, "<{}:{}>", o.type_name, o.token),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Number(v as f64)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Text(v)
    }
}

impl From<ComponentValue> for PropertyValue {
    fn from(v: ComponentValue) -> Self {
        PropertyValue::Component(v)
    }
}

impl From<PropertyMap> for PropertyValue {
    fn from(v: PropertyMap) -> Self {
        PropertyValue::Map(v)
    }
}

impl From<Vec<PropertyValue>> for PropertyValue {
    fn from(v: Vec<PropertyValue>) -> Self {
        PropertyValue::Seq(v)
    }
}

/// Tag identifying a component value type. Two component values merge
/// component-wise only when their kinds agree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    Color,
    Point,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Color => write!(f, "color"),
            ComponentKind::Point => write!(f, "point"),
        }
    }
}

/// A fixed-arity typed value merged by recursing into its scalar
/// components and reconstructing the typed value from the merged
/// components.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ComponentValue {
    /// RGBA color, channels in `0.0..=1.0`.
    Color { r: f64, g: f64, b: f64, a: f64 },
    /// 2-D point.
    Point { x: f64, y: f64 },
}

impl ComponentValue {
    /// Opaque RGB color constructor (alpha 1.0).
    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::Color { r, g, b, a: 1.0 }
    }

    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self::Color { r, g, b, a }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::Point { x, y }
    }

    pub fn kind(&self) -> ComponentKind {
        match self {
            ComponentValue::Color { .. } => ComponentKind::Color,
            ComponentValue::Point { .. } => ComponentKind::Point,
        }
    }

    /// Project the value into its named scalar components.
    pub fn components(&self) -> PropertyMap {
        let mut map = PropertyMap::new();
        match *self {
            ComponentValue::Color { r, g, b, a } => {
                map.insert("r".into(), PropertyValue::Number(r));
                map.insert("g".into(), PropertyValue::Number(g));
                map.insert("b".into(), PropertyValue::Number(b));
                map.insert("a".into(), PropertyValue::Number(a));
            }
            ComponentValue::Point { x, y } => {
                map.insert("x".into(), PropertyValue::Number(x));
                map.insert("y".into(), PropertyValue::Number(y));
            }
        }
        map
    }

    /// Rebuild a component value of `kind` from merged components.
    ///
    /// Returns `None` if a component is missing or not a number, which
    /// the merge treats as an irreconcilable component split.
    pub fn from_components(kind: ComponentKind, components: &PropertyMap) -> Option<Self> {
        let num = |name: &str| components.get(name)?.as_number();
        match kind {
            ComponentKind::Color => Some(ComponentValue::Color {
                r: num("r")?,
                g: num("g")?,
                b: num("b")?,
                a: num("a")?,
            }),
            ComponentKind::Point => Some(ComponentValue::Point {
                x: num("x")?,
                y: num("y")?,
            }),
        }
    }
}

impl fmt::Display for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentValue::Color { r, g, b, a } => {
                write!(f, "color({r}, {g}, {b}, {a})")
            }
            ComponentValue::Point { x, y } => write!(f, "point({x}, {y})"),
        }
    }
}

/// An opaque, unmergeable value. The merge only ever compares it for
/// structural equality; disagreement is reported as a conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueValue {
    /// Domain type name, for display only.
    pub type_name: String,
    /// Identity token; two opaque values are equal iff both fields match.
    pub token: String,
}

impl OpaqueValue {
    pub fn new(type_name: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            token: token.into(),
        }
    }
}
