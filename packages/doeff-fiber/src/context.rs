//! Context records and the hub's context table.

use std::ptr::NonNull;

use crate::error::HubError;
use crate::fault::Fault;
use crate::hub::Hub;
use crate::ids::{ContextId, HubId};
use crate::transfer::{ContextCoroutine, HandoffYielder};
use crate::value::Value;

/// Body of a context: receives the hub and the packed values of the
/// transfer that started it.
pub type EntryFn = Box<dyn FnOnce(&Hub, Value) -> Result<Value, Fault>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    NotStarted,
    Suspended,
    Running,
    Dead,
}

impl ContextState {
    pub fn is_dead(&self) -> bool {
        matches!(self, ContextState::Dead)
    }

    pub fn is_started(&self) -> bool {
        !matches!(self, ContextState::NotStarted)
    }
}

/// Creation options for a context.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Defaults to the context running at creation time.
    pub parent: Option<ContextId>,
    pub name: Option<String>,
    /// Overrides the hub's configured stack size for this context.
    pub stack_size: Option<usize>,
}

impl ContextOptions {
    pub fn parent(mut self, parent: ContextId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}

/// Snapshot of a context for inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextInfo {
    pub id: ContextId,
    pub state: ContextState,
    pub parent: Option<ContextId>,
    pub name: Option<String>,
}

pub(crate) enum Body {
    Root,
    Entry(EntryFn),
    Parked(Box<ContextCoroutine>),
    /// Coroutine is held by the trampoline while it runs.
    Active,
    Finished,
}

pub(crate) struct ContextRecord {
    pub(crate) state: ContextState,
    pub(crate) parent: Option<ContextId>,
    pub(crate) name: Option<String>,
    pub(crate) body: Body,
    pub(crate) stack_size: Option<usize>,
    /// Set by the context's own coroutine on start; only dereferenced while
    /// that context is running on its stack.
    pub(crate) yielder: Option<NonNull<HandoffYielder>>,
}

impl ContextRecord {
    fn root() -> Self {
        ContextRecord {
            state: ContextState::Running,
            parent: None,
            name: Some("root".to_string()),
            body: Body::Root,
            stack_size: None,
            yielder: None,
        }
    }

    pub(crate) fn new(parent: ContextId, name: Option<String>, entry: EntryFn) -> Self {
        ContextRecord {
            state: ContextState::NotStarted,
            parent: Some(parent),
            name,
            body: Body::Entry(entry),
            stack_size: None,
            yielder: None,
        }
    }

    pub(crate) fn with_stack_size(mut self, stack_size: Option<usize>) -> Self {
        self.stack_size = stack_size;
        self
    }

    pub(crate) fn set_state(&mut self, state: ContextState) {
        debug_assert!(
            !self.state.is_dead() || state.is_dead(),
            "a dead context never changes state"
        );
        if !self.state.is_dead() {
            self.state = state;
        }
    }

    /// Dead: drops whatever body is left and forgets the yielder.
    pub(crate) fn finish(&mut self) -> Body {
        self.state = ContextState::Dead;
        self.yielder = None;
        std::mem::replace(&mut self.body, Body::Finished)
    }
}

pub(crate) struct ContextTable {
    hub: HubId,
    records: Vec<ContextRecord>,
}

impl ContextTable {
    pub(crate) fn new(hub: HubId) -> Self {
        ContextTable {
            hub,
            records: vec![ContextRecord::root()],
        }
    }

    pub(crate) fn root(&self) -> ContextId {
        ContextId::new(self.hub, 0)
    }

    pub(crate) fn alloc(&mut self, record: ContextRecord) -> ContextId {
        let id = ContextId::new(self.hub, self.records.len());
        self.records.push(record);
        id
    }

    pub(crate) fn check(&self, id: ContextId) -> Result<(), HubError> {
        if id.hub() != self.hub {
            return Err(HubError::foreign_context(id));
        }
        if id.index() >= self.records.len() {
            return Err(HubError::unknown_context(id));
        }
        Ok(())
    }

    pub(crate) fn get(&self, id: ContextId) -> Result<&ContextRecord, HubError> {
        self.check(id)?;
        Ok(&self.records[id.index()])
    }

    pub(crate) fn get_mut(&mut self, id: ContextId) -> Result<&mut ContextRecord, HubError> {
        self.check(id)?;
        Ok(&mut self.records[id.index()])
    }

    pub(crate) fn state(&self, id: ContextId) -> Result<ContextState, HubError> {
        self.get(id).map(|record| record.state)
    }

    pub(crate) fn info(&self, id: ContextId) -> Result<ContextInfo, HubError> {
        let record = self.get(id)?;
        Ok(ContextInfo {
            id,
            state: record.state,
            parent: record.parent,
            name: record.name.clone(),
        })
    }

    pub(crate) fn ids(&self) -> impl Iterator<Item = ContextId> + '_ {
        (0..self.records.len()).map(move |index| ContextId::new(self.hub, index))
    }

    /// `id` followed by each ancestor up to the root.
    pub(crate) fn lineage(&self, id: ContextId) -> Vec<ContextId> {
        let mut chain = Vec::new();
        let mut next = Some(id);
        while let Some(current) = next {
            chain.push(current);
            next = self.get(current).ok().and_then(|record| record.parent);
        }
        chain
    }

    /// Take every body that still owns an entry or a stack; those contexts
    /// are dead from here on.
    pub(crate) fn drain_bodies(&mut self) -> Vec<Body> {
        self.records
            .iter_mut()
            .filter(|record| matches!(record.body, Body::Entry(_) | Body::Parked(_)))
            .map(ContextRecord::finish)
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_entry() -> EntryFn {
        Box::new(|_, args| Ok(args))
    }

    #[test]
    fn test_table_starts_with_running_root() {
        let table = ContextTable::new(HubId::fresh());
        let root = table.root();
        assert!(root.is_root());
        assert_eq!(table.state(root).unwrap(), ContextState::Running);
        assert!(table.get(root).unwrap().parent.is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_alloc_and_lineage() {
        let mut table = ContextTable::new(HubId::fresh());
        let root = table.root();
        let a = table.alloc(ContextRecord::new(root, None, noop_entry()));
        let b = table.alloc(ContextRecord::new(a, Some("b".into()), noop_entry()));

        assert_eq!(table.state(b).unwrap(), ContextState::NotStarted);
        assert_eq!(table.lineage(b), vec![b, a, root]);
        assert_eq!(table.info(b).unwrap().name.as_deref(), Some("b"));
        assert_eq!(table.ids().count(), 3);
    }

    #[test]
    fn test_foreign_and_unknown_ids_rejected() {
        let table = ContextTable::new(HubId::fresh());
        let other = ContextTable::new(HubId::fresh());
        assert!(matches!(
            table.check(other.root()),
            Err(HubError::ForeignContext { .. })
        ));
        let missing = ContextId::new(table.root().hub(), 9);
        assert!(matches!(
            table.check(missing),
            Err(HubError::UnknownContext { .. })
        ));
    }

    #[test]
    fn test_dead_state_is_final() {
        let mut table = ContextTable::new(HubId::fresh());
        let root = table.root();
        let a = table.alloc(ContextRecord::new(root, None, noop_entry()));
        let record = table.get_mut(a).unwrap();
        let body = record.finish();
        assert!(matches!(body, Body::Entry(_)));
        assert!(record.state.is_dead());
        assert!(matches!(record.body, Body::Finished));
    }

    #[test]
    fn test_drain_bodies_takes_entries() {
        let mut table = ContextTable::new(HubId::fresh());
        let root = table.root();
        let a = table.alloc(ContextRecord::new(root, None, noop_entry()));
        let b = table.alloc(ContextRecord::new(root, None, noop_entry()));
        assert_eq!(table.drain_bodies().len(), 2);
        assert!(table.drain_bodies().is_empty());
        assert!(table.state(a).unwrap().is_dead());
        assert!(table.state(b).unwrap().is_dead());
        assert_eq!(table.state(root).unwrap(), ContextState::Running);
    }
}
