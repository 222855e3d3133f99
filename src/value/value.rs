//! Core value types and their natural semantics.

use std::fmt;
use std::sync::Arc;

use super::instance::Instance;
use crate::model::{ElementKind, PrimitiveKind};

/// Shared handle to an array value. Arrays have reference identity.
pub type ArrayRef = Arc<Array>;

/// Shared handle to an object instance.
pub type ObjectRef = Arc<Instance>;

/// Value is any value a property can hold at runtime.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Array(ArrayRef),
    Object(ObjectRef),
}

/// ArrayShape is the runtime kind of an array: its innermost component and
/// its rank. `int[][]` is `{ element: int, rank: 2 }`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayShape {
    pub element: ElementKind,
    pub rank: usize,
}

impl ArrayShape {
    pub fn new(element: ElementKind, rank: usize) -> Self {
        ArrayShape { element, rank }
    }

    pub fn of(primitive: PrimitiveKind) -> Self {
        ArrayShape::new(ElementKind::Primitive(primitive), 1)
    }

    /// The shape of this array's immediate elements, if they are arrays.
    pub fn component(&self) -> Option<ArrayShape> {
        if self.rank > 1 {
            Some(ArrayShape::new(self.element.clone(), self.rank - 1))
        } else {
            None
        }
    }

    /// Renders the shape with a leading length, as in `int[3][]`.
    pub fn describe(&self, len: usize) -> String {
        let mut out = format!("{}[{}]", self.element, len);
        for _ in 1..self.rank {
            out.push_str("[]");
        }
        out
    }
}

impl fmt::Display for ArrayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.element)?;
        for _ in 0..self.rank {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

/// Array is a typed, fixed-length sequence of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    shape: ArrayShape,
    elements: Vec<Value>,
}

impl Array {
    pub fn new(shape: ArrayShape, elements: Vec<Value>) -> Self {
        Array { shape, elements }
    }

    pub fn shape(&self) -> &ArrayShape {
        &self.shape
    }

    pub fn elements(&self) -> &[Value] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Array(Arc::new(self))
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Runtime type name, as in `int`, `String`, `int[][]` or `billing.Invoice`.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Boolean(_) => PrimitiveKind::Boolean.name().to_string(),
            Value::Byte(_) => PrimitiveKind::Byte.name().to_string(),
            Value::Char(_) => PrimitiveKind::Char.name().to_string(),
            Value::Short(_) => PrimitiveKind::Short.name().to_string(),
            Value::Int(_) => PrimitiveKind::Int.name().to_string(),
            Value::Long(_) => PrimitiveKind::Long.name().to_string(),
            Value::Float(_) => PrimitiveKind::Float.name().to_string(),
            Value::Double(_) => PrimitiveKind::Double.name().to_string(),
            Value::String(_) => "String".to_string(),
            Value::Array(a) => a.shape().to_string(),
            Value::Object(o) => o.type_info().name().to_string(),
        }
    }

    /// Builds a one-dimensional array of `int`s.
    pub fn ints(values: &[i32]) -> Value {
        Array::new(
            ArrayShape::of(PrimitiveKind::Int),
            values.iter().map(|v| Value::Int(*v)).collect(),
        )
        .into_value()
    }

    /// Builds a one-dimensional array of strings with the given component name.
    pub fn strings_as(component: &str, values: &[&str]) -> Value {
        Array::new(
            ArrayShape::new(ElementKind::object(component), 1),
            values.iter().map(|v| Value::String(v.to_string())).collect(),
        )
        .into_value()
    }

    /// Builds a `String[]`.
    pub fn strings(values: &[&str]) -> Value {
        Value::strings_as("String", values)
    }

    /// Builds an array whose elements are arrays of `inner` shape.
    pub fn nested(inner: ArrayShape, rows: Vec<Value>) -> Value {
        let shape = ArrayShape::new(inner.element, inner.rank + 1);
        Array::new(shape, rows).into_value()
    }

    /// Identity check: same array or object reference, or both null.
    pub fn same_reference(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Natural equality: primitives and strings by value (floating point by
    /// canonical bit pattern), arrays and objects by identity.
    pub fn natural_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (Value::Double(a), Value::Double(b)) => double_bits(*a) == double_bits(*b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Natural hash, consistent with [`Value::natural_eq`].
    pub fn natural_hash(&self) -> i32 {
        match self {
            Value::Null => 0,
            Value::Boolean(b) => boolean_hash(*b),
            Value::Byte(v) => *v as i32,
            Value::Char(c) => *c as u32 as i32,
            Value::Short(v) => *v as i32,
            Value::Int(v) => *v,
            Value::Long(v) => long_hash(*v),
            Value::Float(v) => float_bits(*v) as i32,
            Value::Double(v) => long_hash(double_bits(*v) as i64),
            Value::String(s) => string_hash(s),
            Value::Array(a) => identity_hash(Arc::as_ptr(a) as *const ()),
            Value::Object(o) => identity_hash(Arc::as_ptr(o) as *const ()),
        }
    }
}

/// Structural equality: arrays compare element-wise, objects by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            _ => self.natural_eq(other),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Byte(v)
    }
}

impl From<char> for Value {
    fn from(v: char) -> Self {
        Value::Char(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Short(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        v.into_value()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Natural text of a value. Arrays and objects without a structural
/// formatter render as their type and identity hash.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "{}", c),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write_floating(f, v, v.is_nan(), v.is_infinite(), *v > 0.0),
            Value::Double(v) => write_floating(f, v, v.is_nan(), v.is_infinite(), *v > 0.0),
            Value::String(s) => f.write_str(s),
            Value::Array(a) => write!(f, "{}@{:x}", a.shape(), self.natural_hash()),
            Value::Object(o) => {
                write!(f, "{}@{:x}", o.type_info().simple_name(), self.natural_hash())
            }
        }
    }
}

fn write_floating(
    f: &mut fmt::Formatter<'_>,
    v: &dyn fmt::Debug,
    nan: bool,
    infinite: bool,
    positive: bool,
) -> fmt::Result {
    if nan {
        f.write_str("NaN")
    } else if infinite {
        f.write_str(if positive { "Infinity" } else { "-Infinity" })
    } else {
        write!(f, "{:?}", v)
    }
}

pub fn boolean_hash(b: bool) -> i32 {
    if b {
        1231
    } else {
        1237
    }
}

pub fn long_hash(v: i64) -> i32 {
    (v ^ ((v as u64) >> 32) as i64) as i32
}

/// Bit pattern with every NaN collapsed to the canonical one.
pub fn float_bits(v: f32) -> u32 {
    if v.is_nan() {
        0x7fc0_0000
    } else {
        v.to_bits()
    }
}

pub fn double_bits(v: f64) -> u64 {
    if v.is_nan() {
        0x7ff8_0000_0000_0000
    } else {
        v.to_bits()
    }
}

/// Polynomial hash over UTF-16 code units: `s[0]*31^(n-1) + ... + s[n-1]`.
pub fn string_hash(s: &str) -> i32 {
    s.encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32))
}

fn identity_hash(ptr: *const ()) -> i32 {
    let addr = ptr as usize as u64;
    long_hash(addr as i64)
}
