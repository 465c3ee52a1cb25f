//! Fault records raised at suspension points and propagated along parent chains.

use std::borrow::Cow;
use std::fmt;

use crate::ids::ContextId;
use crate::value::Value;

/// Class-like fault tag.
///
/// Kinds compare by name. There is no inheritance: a handler matches the
/// exact kind it cares about.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FaultKind(Cow<'static, str>);

impl FaultKind {
    /// Designated termination signal. Uncaught, it ends a context quietly.
    pub const CLEAN_KILL: FaultKind = FaultKind(Cow::Borrowed("ContextExit"));
    /// Malformed transfer arguments; always raised locally to the caller.
    pub const INVALID_ARGUMENT: FaultKind = FaultKind(Cow::Borrowed("InvalidArgument"));
    pub const RUNTIME: FaultKind = FaultKind(Cow::Borrowed("RuntimeError"));
    /// The hub could not provide resources (e.g. an execution stack).
    pub const RESOURCE: FaultKind = FaultKind(Cow::Borrowed("ResourceError"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        FaultKind(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    /// A bare instance of this kind.
    pub fn instance(&self) -> Fault {
        Fault::new(self.clone())
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single context captured in a trace descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceFrame {
    pub context: ContextId,
    pub name: Option<String>,
}

/// Execution-trace descriptor: a context and its parent chain, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Trace {
    frames: Vec<TraceFrame>,
}

impl Trace {
    pub fn new(frames: Vec<TraceFrame>) -> Self {
        Trace { frames }
    }

    pub fn frames(&self) -> &[TraceFrame] {
        &self.frames
    }

    pub fn innermost(&self) -> Option<&TraceFrame> {
        self.frames.first()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// A raised fault: kind, optional value, optional trace.
#[derive(Debug, Clone, PartialEq)]
pub struct Fault {
    kind: FaultKind,
    value: Option<Box<Value>>,
    trace: Option<Trace>,
}

impl Fault {
    pub fn new(kind: FaultKind) -> Self {
        Fault {
            kind,
            value: None,
            trace: None,
        }
    }

    pub fn with_value(kind: FaultKind, value: impl Into<Value>) -> Self {
        Fault {
            kind,
            value: Some(Box::new(value.into())),
            trace: None,
        }
    }

    pub fn clean_kill() -> Self {
        Fault::new(FaultKind::CLEAN_KILL)
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Fault::with_value(FaultKind::INVALID_ARGUMENT, message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Fault::with_value(FaultKind::RUNTIME, message.into())
    }

    pub fn resource(message: impl Into<String>) -> Self {
        Fault::with_value(FaultKind::RESOURCE, message.into())
    }

    /// Attach a trace descriptor, replacing any previous one.
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn kind(&self) -> &FaultKind {
        &self.kind
    }

    pub fn is(&self, kind: &FaultKind) -> bool {
        &self.kind == kind
    }

    pub fn is_clean_kill(&self) -> bool {
        self.is(&FaultKind::CLEAN_KILL)
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_deref()
    }

    /// The value as text, when the fault was raised with a string message.
    pub fn message(&self) -> Option<&str> {
        self.value().and_then(Value::as_str)
    }

    pub fn trace(&self) -> Option<&Trace> {
        self.trace.as_ref()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            None => write!(f, "{}", self.kind),
            Some(Value::Str(message)) => write!(f, "{}: {}", self.kind, message),
            Some(other) => write!(f, "{}: {:?}", self.kind, other),
        }
    }
}

impl std::error::Error for Fault {}
