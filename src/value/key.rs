//! Hashable projection of value-typed elements.

use std::fmt;
use std::rc::Rc;

use super::datum::Value;

/// Lookup key for value-typed elements, used by `uniq` and `group_by`.
///
/// Numbers are keyed by bit pattern after folding `-0.0` into `0.0` and all
/// NaNs into one, so `1` and `"1"` are distinct keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Undefined,
    Null,
    Bool(bool),
    Number(u64),
    Text(Rc<str>),
}

impl Key {
    /// `None` for reference-typed values.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Undefined => Some(Key::Undefined),
            Value::Null => Some(Key::Null),
            Value::Bool(b) => Some(Key::Bool(*b)),
            Value::Number(n) => Some(Key::Number(number_bits(*n))),
            Value::Text(s) => Some(Key::Text(Rc::clone(s))),
            Value::List(_) | Value::Record(_) | Value::Func(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Undefined => Value::Undefined,
            Key::Null => Value::Null,
            Key::Bool(b) => Value::Bool(*b),
            Key::Number(bits) => Value::Number(f64::from_bits(*bits)),
            Key::Text(s) => Value::Text(Rc::clone(s)),
        }
    }
}

fn number_bits(n: f64) -> u64 {
    if n == 0.0 {
        0.0f64.to_bits()
    } else if n.is_nan() {
        f64::NAN.to_bits()
    } else {
        n.to_bits()
    }
}

impl From<f64> for Key {
    fn from(n: f64) -> Self {
        Key::Number(number_bits(n))
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::from(n as f64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(Rc::from(s))
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Bool(b)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
