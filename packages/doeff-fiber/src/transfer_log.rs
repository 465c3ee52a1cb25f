//! Recorded transfer events, for diagnostics and ordering checks.

use crate::fault::{Fault, FaultKind};
use crate::ids::ContextId;
use crate::value::Value;

/// How a context's entry ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Returned,
    /// An uncaught clean kill ended the context.
    Killed,
    Raised(FaultKind),
}

impl ExitOutcome {
    pub(crate) fn of(exit: &Result<Value, Fault>) -> Self {
        match exit {
            Ok(_) => ExitOutcome::Returned,
            Err(fault) if fault.is_clean_kill() => ExitOutcome::Killed,
            Err(fault) => ExitOutcome::Raised(fault.kind().clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    Switch {
        from: ContextId,
        to: ContextId,
    },
    Throw {
        from: ContextId,
        to: ContextId,
        kind: FaultKind,
    },
    /// A switch or throw aimed at a dead context; no transfer happened.
    DeadTarget {
        from: ContextId,
        to: ContextId,
    },
    /// `context` became the running context.
    Resume {
        context: ContextId,
        first: bool,
    },
    Exit {
        context: ContextId,
        outcome: ExitOutcome,
        destination: ContextId,
    },
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TransferLog {
    enabled: bool,
    events: Vec<TransferEvent>,
}

impl TransferLog {
    pub(crate) fn new(enabled: bool) -> Self {
        TransferLog {
            enabled,
            events: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, event: TransferEvent) {
        if self.enabled {
            self.events.push(event);
        }
    }

    pub(crate) fn events(&self) -> &[TransferEvent] {
        &self.events
    }

    pub(crate) fn clear(&mut self) {
        self.events.clear();
    }
}

/// Contexts in the order they became running.
pub fn running_sequence(events: &[TransferEvent]) -> Vec<ContextId> {
    events
        .iter()
        .filter_map(|event| match event {
            TransferEvent::Resume { context, .. } => Some(*context),
            _ => None,
        })
        .collect()
}
