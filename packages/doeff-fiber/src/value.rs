//! Value types that flow through context transfers.

use crate::fault::{Fault, FaultKind, Trace};
use crate::ids::ContextId;

/// A value delivered by a switch, returned by an entry, or carried by a fault.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Tuple(Vec<Value>),
    /// A class-like fault tag, usable as a throw category.
    Kind(FaultKind),
    /// A fault instance, e.g. the clean-kill instance a killed context returns.
    Fault(Fault),
    Trace(Trace),
    Context(ContextId),
}

impl Value {
    /// Pack a transfer's values: nothing is `None`, one value is itself,
    /// several become an ordered tuple.
    pub fn pack(mut values: Vec<Value>) -> Self {
        match values.len() {
            0 => Value::None,
            1 => values.pop().unwrap_or_default(),
            _ => Value::Tuple(values),
        }
    }

    /// Type name used in argument-validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Tuple(_) => "tuple",
            Value::Kind(_) => "type",
            Value::Fault(_) => "fault",
            Value::Trace(_) => "trace",
            Value::Context(_) => "context",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Value::Fault(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_context(&self) -> Option<ContextId> {
        match self {
            Value::Context(id) => Some(*id),
            _ => None,
        }
    }

    /// True when this value is a clean-kill fault instance.
    pub fn is_clean_kill(&self) -> bool {
        self.as_fault().is_some_and(Fault::is_clean_kill)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::None
    }
}

impl From<Vec<Value>> for Value {
    fn from(values: Vec<Value>) -> Self {
        Value::Tuple(values)
    }
}

impl From<FaultKind> for Value {
    fn from(kind: FaultKind) -> Self {
        Value::Kind(kind)
    }
}

impl From<Fault> for Value {
    fn from(fault: Fault) -> Self {
        Value::Fault(fault)
    }
}

impl From<Trace> for Value {
    fn from(trace: Trace) -> Self {
        Value::Trace(trace)
    }
}

impl From<ContextId> for Value {
    fn from(id: ContextId) -> Self {
        Value::Context(id)
    }
}
