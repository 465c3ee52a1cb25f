//! The hub: root context, context table and the public transfer API.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::config::HubConfig;
use crate::context::{ContextInfo, ContextOptions, ContextRecord, ContextState, ContextTable};
use crate::error::HubError;
use crate::fault::{Fault, Trace, TraceFrame};
use crate::ids::{ContextId, HubId};
use crate::throw::ThrowArgs;
use crate::transfer::TransferResult;
use crate::transfer_log::{TransferEvent, TransferLog};
use crate::value::Value;

pub(crate) struct HubInner {
    pub(crate) id: HubId,
    pub(crate) config: HubConfig,
    pub(crate) table: RefCell<ContextTable>,
    pub(crate) current: Cell<ContextId>,
    pub(crate) log: RefCell<TransferLog>,
}

/// Handle to a set of cooperatively scheduled contexts.
///
/// The hub returned by [`Hub::new`] owns the contexts: dropping it tears
/// them down. Entries receive a borrowed handle to the same hub. A hub is
/// bound to the thread that created it, and contexts of one hub must not
/// transfer into another hub's contexts.
pub struct Hub {
    inner: Rc<HubInner>,
    owner: bool,
}

impl Hub {
    pub fn new() -> Self {
        Self::build(HubConfig::default())
    }

    pub fn with_config(config: HubConfig) -> Result<Self, HubError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: HubConfig) -> Self {
        let id = HubId::fresh();
        let table = ContextTable::new(id);
        let root = table.root();
        let log = TransferLog::new(config.record_transfers);
        Hub {
            inner: Rc::new(HubInner {
                id,
                config,
                table: RefCell::new(table),
                current: Cell::new(root),
                log: RefCell::new(log),
            }),
            owner: true,
        }
    }

    /// Non-owning handle for code running inside a context.
    pub(crate) fn attach(inner: &Weak<HubInner>) -> Option<Hub> {
        inner.upgrade().map(|inner| Hub {
            inner,
            owner: false,
        })
    }

    pub(crate) fn inner(&self) -> &Rc<HubInner> {
        &self.inner
    }

    pub fn id(&self) -> HubId {
        self.inner.id
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    /// The always-alive context standing for the hub owner's thread of control.
    pub fn root(&self) -> ContextId {
        self.inner.table.borrow().root()
    }

    /// The running context (the root when no other context runs).
    pub fn current(&self) -> ContextId {
        self.inner.current.get()
    }

    /// Create a context parented to the current one.
    pub fn create<F>(&self, entry: F) -> ContextId
    where
        F: FnOnce(&Hub, Value) -> Result<Value, Fault> + 'static,
    {
        let parent = self.current();
        let record = ContextRecord::new(parent, None, Box::new(entry));
        self.register(record)
    }

    pub fn create_with<F>(&self, options: ContextOptions, entry: F) -> Result<ContextId, HubError>
    where
        F: FnOnce(&Hub, Value) -> Result<Value, Fault> + 'static,
    {
        let parent = match options.parent {
            Some(parent) => {
                self.inner.table.borrow().check(parent)?;
                parent
            }
            None => self.current(),
        };
        if let Some(size) = options.stack_size {
            self.config().clone().with_stack_size(size).validate()?;
        }
        let record = ContextRecord::new(parent, options.name, Box::new(entry))
            .with_stack_size(options.stack_size);
        Ok(self.register(record))
    }

    fn register(&self, record: ContextRecord) -> ContextId {
        let parent = record.parent;
        let id = self.inner.table.borrow_mut().alloc(record);
        debug!(context = %id, parent = ?parent, "context created");
        id
    }

    pub fn state(&self, id: ContextId) -> Result<ContextState, HubError> {
        self.inner.table.borrow().state(id)
    }

    /// `None` only for the root.
    pub fn parent(&self, id: ContextId) -> Result<Option<ContextId>, HubError> {
        Ok(self.inner.table.borrow().get(id)?.parent)
    }

    pub fn name(&self, id: ContextId) -> Result<Option<String>, HubError> {
        Ok(self.inner.table.borrow().get(id)?.name.clone())
    }

    pub fn info(&self, id: ContextId) -> Result<ContextInfo, HubError> {
        self.inner.table.borrow().info(id)
    }

    /// False for ids this hub does not know.
    pub fn is_dead(&self, id: ContextId) -> bool {
        self.state(id).map(|s| s.is_dead()).unwrap_or(false)
    }

    pub fn is_started(&self, id: ContextId) -> bool {
        self.state(id).map(|s| s.is_started()).unwrap_or(false)
    }

    /// Started and not yet dead.
    pub fn is_active(&self, id: ContextId) -> bool {
        self.state(id)
            .map(|s| s.is_started() && !s.is_dead())
            .unwrap_or(false)
    }

    /// Snapshot of every context, root first.
    pub fn contexts(&self) -> Vec<ContextInfo> {
        let table = self.inner.table.borrow();
        table.ids().filter_map(|id| table.info(id).ok()).collect()
    }

    /// Trace descriptor of the running context and its parent chain.
    pub fn capture_trace(&self) -> Trace {
        let table = self.inner.table.borrow();
        let frames = table
            .lineage(self.current())
            .into_iter()
            .map(|context| TraceFrame {
                context,
                name: table.get(context).ok().and_then(|r| r.name.clone()),
            })
            .collect();
        Trace::new(frames)
    }

    /// Events recorded so far; empty unless `record_transfers` is set.
    pub fn transfer_log(&self) -> Vec<TransferEvent> {
        self.inner.log.borrow().events().to_vec()
    }

    pub fn clear_transfer_log(&self) {
        self.inner.log.borrow_mut().clear();
    }

    pub(crate) fn record(&self, event: TransferEvent) {
        self.inner.log.borrow_mut().record(event);
    }

    /// Switch to `target`, delivering a single value.
    ///
    /// Returns whatever is delivered when this context is next resumed, or
    /// the fault raised at that point.
    pub fn switch(&self, target: ContextId, value: impl Into<Value>) -> TransferResult {
        self.switch_all(target, vec![value.into()])
    }

    /// Switch to `target`, delivering the packed values.
    pub fn switch_all(&self, target: ContextId, values: Vec<Value>) -> TransferResult {
        let state = self.state(target)?;
        let from = self.current();
        if state.is_dead() {
            tracing::trace!(from = %from, to = %target, "switch to dead context ignored");
            self.record(TransferEvent::DeadTarget { from, to: target });
            return Ok(Value::None);
        }
        tracing::trace!(from = %from, to = %target, "switch");
        self.record(TransferEvent::Switch { from, to: target });
        self.transfer(target, Ok(Value::pack(values)))
    }

    /// Switch to the running context's parent.
    pub fn switch_to_parent(&self, value: impl Into<Value>) -> TransferResult {
        let current = self.current();
        match self.parent(current)? {
            Some(parent) => self.switch(parent, value),
            None => Err(Fault::invalid_argument("the root context has no parent")),
        }
    }

    /// Raise `fault` at `target`'s suspension point.
    pub fn throw(&self, target: ContextId, fault: Fault) -> TransferResult {
        self.throw_with(target, ThrowArgs::from(fault))
    }

    /// Validate `args` and raise the resulting fault at `target`.
    ///
    /// Invalid arguments fail here without touching `target`. A dead target
    /// yields a clean-kill instance instead of transferring.
    pub fn throw_with(&self, target: ContextId, args: ThrowArgs) -> TransferResult {
        let fault = args.into_fault()?;
        let state = self.state(target)?;
        let from = self.current();
        if state.is_dead() {
            tracing::trace!(from = %from, to = %target, "throw into dead context ignored");
            self.record(TransferEvent::DeadTarget { from, to: target });
            return Ok(Value::Fault(Fault::clean_kill()));
        }
        tracing::trace!(from = %from, to = %target, kind = %fault.kind(), "throw");
        self.record(TransferEvent::Throw {
            from,
            to: target,
            kind: fault.kind().clone(),
        });
        self.transfer(target, Err(fault))
    }

    /// Throw a clean kill into `target`.
    pub fn kill(&self, target: ContextId) -> TransferResult {
        self.throw_with(target, ThrowArgs::new())
    }

    fn teardown(&mut self) {
        let at_root = self.current() == self.root();
        if self.inner.config.kill_on_drop && at_root && !std::thread::panicking() {
            let live: Vec<ContextId> = self
                .contexts()
                .into_iter()
                .filter(|info| info.state == ContextState::Suspended)
                .map(|info| info.id)
                .collect();
            for id in live {
                if !self.is_active(id) {
                    continue;
                }
                if let Err(fault) = self.kill(id) {
                    debug!(context = %id, fault = %fault, "fault while killing context on drop");
                }
            }
        }
        // Suspended stacks unwind here, outside any table borrow.
        let bodies = self.inner.table.borrow_mut().drain_bodies();
        drop(bodies);
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Hub {
    fn clone(&self) -> Self {
        Hub {
            inner: Rc::clone(&self.inner),
            owner: false,
        }
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        if self.owner {
            self.teardown();
        }
    }
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("id", &self.inner.id)
            .field("current", &self.current())
            .field("contexts", &self.inner.table.borrow().len())
            .field("owner", &self.owner)
            .finish()
    }
}

#[cfg(test)]
#[path = "hub_tests.rs"]
mod tests;
