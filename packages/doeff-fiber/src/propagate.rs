//! Fault propagation: where control goes when a context terminates, and
//! what it carries there.

use tracing::{debug, warn};

use crate::context::ContextTable;
use crate::hub::Hub;
use crate::ids::ContextId;
use crate::transfer::Delivery;
use crate::transfer_log::{ExitOutcome, TransferEvent};
use crate::value::Value;

impl Hub {
    /// Mark `dying` dead and pick the destination of its exit.
    pub(crate) fn resolve_exit(&self, dying: ContextId, exit: Delivery) -> (ContextId, Delivery) {
        let outcome = ExitOutcome::of(&exit);
        let (body, destination) = {
            let mut table = self.inner().table.borrow_mut();
            let body = table.get_mut(dying).map(|record| record.finish());
            (body, first_live_ancestor(&table, dying))
        };
        // Dropped outside the borrow: an entry's captures may run arbitrary drops.
        drop(body);

        debug!(
            context = %dying,
            destination = %destination,
            outcome = ?outcome,
            "context finished"
        );
        self.record(TransferEvent::Exit {
            context: dying,
            outcome,
            destination,
        });

        let payload = exit_payload(exit);
        if let Err(fault) = &payload {
            if destination == self.root() {
                warn!(context = %dying, fault = %fault, "fault reached the root uncaught");
            }
        }
        (destination, payload)
    }
}

/// First non-dead context above `id` on its fixed parent chain.
///
/// The root is never dead, so the walk always ends there at the latest.
pub(crate) fn first_live_ancestor(table: &ContextTable, id: ContextId) -> ContextId {
    let mut next = table.get(id).ok().and_then(|record| record.parent);
    while let Some(candidate) = next {
        match table.get(candidate) {
            Ok(record) if !record.state.is_dead() => return candidate,
            Ok(record) => next = record.parent,
            Err(_) => break,
        }
    }
    table.root()
}

/// A clean kill ends a context normally: its instance is the return value.
/// Any other fault is re-raised verbatim at the destination.
pub(crate) fn exit_payload(exit: Delivery) -> Delivery {
    match exit {
        Ok(value) => Ok(value),
        Err(fault) if fault.is_clean_kill() => Ok(Value::Fault(fault)),
        Err(fault) => Err(fault),
    }
}
