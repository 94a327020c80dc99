//! Dynamically typed pipeline element.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::Result;

/// Runtime kind of a [`Value`] (the `typeof` of an element).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Undefined,
    Null,
    Bool,
    Number,
    Text,
    List,
    Record,
    Func,
}

impl Kind {
    /// Reference-typed kinds are shared and compared by identity.
    pub fn is_reference(self) -> bool {
        matches!(self, Kind::List | Kind::Record | Kind::Func)
    }

    pub fn name(self) -> &'static str {
        match self {
            Kind::Undefined => "undefined",
            Kind::Null => "null",
            Kind::Bool => "bool",
            Kind::Number => "number",
            Kind::Text => "text",
            Kind::List => "list",
            Kind::Record => "record",
            Kind::Func => "func",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared callable stored inside a value, the target of `invoke`.
#[derive(Clone)]
pub struct Func(Rc<dyn Fn(&[Value]) -> Result<Value>>);

impl Func {
    pub fn new(f: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Func(Rc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0)(args)
    }

    pub fn ptr_eq(&self, other: &Func) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Func(..)")
    }
}

/// Named fields with an optional class name.
///
/// Field order is insertion order. The class name plays the role of a
/// constructor for `is(class)` checks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    class: Option<Rc<str>>,
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    pub fn with_class(class: &str) -> Self {
        Record {
            class: Some(Rc::from(class)),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A single element flowing through a chain.
///
/// `Undefined`, `Null`, `Bool`, `Number` and `Text` are value-typed.
/// `List`, `Record` and `Func` are reference-typed: cloning shares the
/// allocation, and [`Value::same`] compares them by identity.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    List(Rc<Vec<Value>>),
    Record(Rc<Record>),
    Func(Func),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(items))
    }

    pub fn record(record: Record) -> Self {
        Value::Record(Rc::new(record))
    }

    pub fn func(f: impl Fn(&[Value]) -> Result<Value> + 'static) -> Self {
        Value::Func(Func::new(f))
    }

    pub fn kind(&self) -> Kind {
        match self {
            Value::Undefined => Kind::Undefined,
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::Text(_) => Kind::Text,
            Value::List(_) => Kind::List,
            Value::Record(_) => Kind::Record,
            Value::Func(_) => Kind::Func,
        }
    }

    /// Class name of a record, `None` for everything else.
    pub fn class(&self) -> Option<&str> {
        match self {
            Value::Record(r) => r.class(),
            _ => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        self.kind().is_reference()
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_ref()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r.as_ref()),
            _ => None,
        }
    }

    /// Field lookup, `Undefined` when absent or when `self` is not a record.
    pub fn get(&self, field: &str) -> Value {
        self.as_record()
            .and_then(|r| r.get(field))
            .cloned()
            .unwrap_or(Value::Undefined)
    }

    /// Identity-style equality: value types compare by value, reference
    /// types only match when they share the same allocation.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Record(a), Value::Record(b)) => Rc::ptr_eq(a, b),
            (Value::Func(a), Value::Func(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// Natural total order used by `sort()`.
    ///
    /// Values of different kinds order by kind. Numbers use `f64::total_cmp`,
    /// lists compare element-wise, records and funcs of the same kind are
    /// considered equal.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    match x.total_cmp(y) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality; funcs compare by identity.
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            _ => self.same(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Record(r) => {
                if let Some(class) = r.class() {
                    write!(f, "{class} ")?;
                }
                f.write_str("{")?;
                for (i, (name, value)) in r.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Func(_) => f.write_str("<func>"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::record(record)
    }
}
