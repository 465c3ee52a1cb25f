//! Transfer engine: suspends the caller and resumes the target over
//! per-context coroutine stacks.
//!
//! Every non-root context runs on its own `corosensei` coroutine. The root
//! drives a trampoline: a context transfers by suspending its coroutine with
//! a [`Handoff`] naming the next target, and the trampoline resumes that
//! target. Only the root ever calls `resume`, so at most one trampoline is
//! active per hub.

use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use std::rc::Rc;

use corosensei::stack::DefaultStack;
use corosensei::{Coroutine, CoroutineResult, Yielder};
use tracing::{debug, warn};

use crate::context::{Body, ContextState, EntryFn};
use crate::error::HubError;
use crate::fault::Fault;
use crate::hub::Hub;
use crate::ids::ContextId;
use crate::transfer_log::TransferEvent;
use crate::value::Value;

/// What a resumed suspension point observes: a value, or a fault to raise.
pub(crate) type Delivery = Result<Value, Fault>;

pub type TransferResult = Result<Value, Fault>;

/// Request from a suspending context to the trampoline.
#[derive(Debug)]
pub(crate) struct Handoff {
    pub(crate) target: ContextId,
    pub(crate) delivery: Delivery,
}

pub(crate) type HandoffYielder = Yielder<Delivery, Handoff>;
pub(crate) type ContextCoroutine = Coroutine<Delivery, Handoff, Delivery, DefaultStack>;

impl Hub {
    /// Suspend the running context and resume `target` with `delivery`.
    ///
    /// `target` must not be dead. Returns once something resumes the caller.
    pub(crate) fn transfer(&self, target: ContextId, delivery: Delivery) -> Delivery {
        let origin = self.current();
        if target == origin {
            return delivery;
        }
        if origin == self.root() {
            return self.drive(origin, target, delivery);
        }
        let yielder = self
            .inner()
            .table
            .borrow()
            .get(origin)
            .ok()
            .and_then(|record| record.yielder);
        let Some(yielder) = yielder else {
            return Err(Fault::runtime(format!(
                "{origin} is running without a bound stack"
            )));
        };
        // SAFETY: the yielder was bound by `origin`'s own coroutine body, which
        // is the code executing right now, so the reference is still live.
        let yielder = unsafe { yielder.as_ref() };
        yielder.suspend(Handoff { target, delivery })
    }

    /// Trampoline run on the root's stack until something transfers back to it.
    fn drive(&self, root: ContextId, mut target: ContextId, mut delivery: Delivery) -> Delivery {
        self.set_state(root, ContextState::Suspended);
        let mut requester = root;
        loop {
            if target == root {
                self.enter(root, false);
                return delivery;
            }

            let first = self.state(target).ok() == Some(ContextState::NotStarted);
            if first && delivery.is_err() {
                // Raises at its first statement: the entry never runs.
                debug!(context = %target, "context killed before starting");
                let (next, payload) = self.resolve_exit(target, delivery);
                requester = root;
                target = next;
                delivery = payload;
                continue;
            }

            let mut coroutine = match self.take_coroutine(target) {
                Ok(coroutine) => coroutine,
                Err(fault) => {
                    warn!(context = %target, fault = %fault, "context could not be resumed");
                    target = requester;
                    delivery = Err(fault);
                    continue;
                }
            };

            self.enter(target, first);
            let step = panic::catch_unwind(AssertUnwindSafe(|| coroutine.resume(delivery)));
            match step {
                Ok(CoroutineResult::Yield(handoff)) => {
                    self.park(target, coroutine);
                    requester = target;
                    target = handoff.target;
                    delivery = handoff.delivery;
                }
                Ok(CoroutineResult::Return(exit)) => {
                    drop(coroutine);
                    let (next, payload) = self.resolve_exit(target, exit);
                    requester = root;
                    target = next;
                    delivery = payload;
                }
                Err(payload) => {
                    warn!(context = %target, "context panicked");
                    let body = self
                        .inner()
                        .table
                        .borrow_mut()
                        .get_mut(target)
                        .map(|record| record.finish());
                    drop(body);
                    drop(coroutine);
                    self.enter(root, false);
                    panic::resume_unwind(payload);
                }
            }
        }
    }

    /// Mark `id` running and make it current.
    fn enter(&self, id: ContextId, first: bool) {
        self.set_state(id, ContextState::Running);
        self.inner().current.set(id);
        self.record(TransferEvent::Resume { context: id, first });
        if first {
            debug!(context = %id, "context started");
        }
    }

    fn park(&self, id: ContextId, coroutine: Box<ContextCoroutine>) {
        let mut table = self.inner().table.borrow_mut();
        if let Ok(record) = table.get_mut(id) {
            record.set_state(ContextState::Suspended);
            record.body = Body::Parked(coroutine);
        }
    }

    pub(crate) fn set_state(&self, id: ContextId, state: ContextState) {
        if let Ok(record) = self.inner().table.borrow_mut().get_mut(id) {
            record.set_state(state);
        }
    }

    /// Take the parked coroutine of `id`, building it on first resume.
    fn take_coroutine(&self, id: ContextId) -> Result<Box<ContextCoroutine>, Fault> {
        let mut table = self.inner().table.borrow_mut();
        let record = table.get_mut(id)?;
        let stack_size = record.stack_size.unwrap_or(self.config().stack_size);
        match std::mem::replace(&mut record.body, Body::Active) {
            Body::Parked(coroutine) => Ok(coroutine),
            Body::Entry(entry) => match DefaultStack::new(stack_size) {
                Ok(stack) => Ok(Box::new(self.build_coroutine(id, entry, stack))),
                Err(source) => {
                    record.body = Body::Entry(entry);
                    Err(HubError::stack_allocation(id, stack_size, source).into())
                }
            },
            other => {
                record.body = other;
                Err(Fault::runtime(format!("{id} cannot be resumed")))
            }
        }
    }

    fn build_coroutine(&self, id: ContextId, entry: EntryFn, stack: DefaultStack) -> ContextCoroutine {
        let weak = Rc::downgrade(self.inner());
        Coroutine::with_stack(stack, move |yielder: &HandoffYielder, first: Delivery| {
            let Some(hub) = Hub::attach(&weak) else {
                return Err(Fault::runtime("hub dropped before the context started"));
            };
            hub.bind_yielder(id, yielder);
            let args = first?;
            entry(&hub, args)
        })
    }

    fn bind_yielder(&self, id: ContextId, yielder: &HandoffYielder) {
        if let Ok(record) = self.inner().table.borrow_mut().get_mut(id) {
            record.yielder = Some(NonNull::from(yielder));
        }
    }
}
