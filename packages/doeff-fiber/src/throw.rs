//! Throw arguments and their one-time resolution into a fault.

use crate::fault::{Fault, FaultKind};
use crate::value::Value;

const TRACE_ARGUMENT: &str = "throw() third argument must be a trace object";
const INSTANCE_WITH_VALUE: &str = "instance fault may not have a separate value";

/// Dynamically typed arguments of a throw.
///
/// Mirrors the loose calling convention `throw(category?, payload?, trace?)`:
/// any value may be passed in any slot and is validated before the transfer.
#[derive(Debug, Clone, Default)]
pub struct ThrowArgs {
    pub category: Option<Value>,
    pub payload: Option<Value>,
    pub trace: Option<Value>,
}

impl ThrowArgs {
    /// No category: throws a clean kill.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, category: impl Into<Value>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// With a class category the payload becomes the fault's value as is;
    /// a `Value::Tuple` is kept whole, not spread into separate arguments.
    pub fn payload(mut self, payload: impl Into<Value>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    pub fn trace(mut self, trace: impl Into<Value>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Validate and build the fault to raise.
    ///
    /// Fails with an invalid-argument fault without touching any context.
    pub fn into_fault(self) -> Result<Fault, Fault> {
        let trace = match self.trace {
            None | Some(Value::None) => None,
            Some(Value::Trace(trace)) => Some(trace),
            Some(_) => return Err(Fault::invalid_argument(TRACE_ARGUMENT)),
        };
        let category = self
            .category
            .unwrap_or_else(|| Value::Kind(FaultKind::CLEAN_KILL));
        let fault = match FaultSpec::classify(category, self.payload) {
            FaultSpec::Class { kind, payload } => build_from_class(kind, payload),
            FaultSpec::Instance(fault) => fault,
            FaultSpec::Invalid(reason) => return Err(Fault::invalid_argument(reason)),
        };
        Ok(match trace {
            Some(trace) => fault.with_trace(trace),
            None => fault,
        })
    }
}

impl From<FaultKind> for ThrowArgs {
    fn from(kind: FaultKind) -> Self {
        ThrowArgs::new().category(kind)
    }
}

impl From<Fault> for ThrowArgs {
    fn from(fault: Fault) -> Self {
        ThrowArgs::new().category(fault)
    }
}

/// Category dispatch, resolved once at throw entry.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FaultSpec {
    Class {
        kind: FaultKind,
        payload: Option<Value>,
    },
    Instance(Fault),
    Invalid(String),
}

impl FaultSpec {
    pub(crate) fn classify(category: Value, payload: Option<Value>) -> Self {
        let payload = payload.filter(|p| !p.is_none());
        match category {
            Value::Kind(kind) => FaultSpec::Class { kind, payload },
            Value::Fault(fault) => match payload {
                Some(_) => FaultSpec::Invalid(INSTANCE_WITH_VALUE.to_string()),
                None => FaultSpec::Instance(fault),
            },
            other => FaultSpec::Invalid(format!(
                "faults must be classes, or instances, not {}",
                other.type_name()
            )),
        }
    }
}

fn build_from_class(kind: FaultKind, payload: Option<Value>) -> Fault {
    match payload {
        None => Fault::new(kind),
        Some(Value::Fault(instance)) if instance.kind() == &kind => instance,
        Some(value) => Fault::with_value(kind, value),
    }
}
