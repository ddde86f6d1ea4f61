//! Snapshot Manager
//!
//! Whole-state memento undo/redo. `past` holds committed snapshots with the
//! current state on top; its oldest retained entry is the floor that `undo`
//! never pops. `future` holds undone snapshots and is cleared by every commit.
//! History dropped beyond `limit` is gone for good.

use indexmap::IndexMap;
use std::collections::VecDeque;
use tracing::debug;

use crate::config::DEFAULT_HISTORY_LIMIT;
use crate::state::{EventMap, LoopBinding, ProjectState};

/// Immutable deep copy of a `ProjectState` taken at a commit point.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot(ProjectState);

impl Snapshot {
    pub fn capture(state: &ProjectState) -> Self {
        Self(state.clone())
    }

    pub fn state(&self) -> &ProjectState {
        &self.0
    }

    fn restore_into(&self, state: &mut ProjectState) {
        state.clone_from(&self.0);
    }
}

#[derive(Debug)]
pub struct SnapshotManager {
    past: VecDeque<Snapshot>,
    future: Vec<Snapshot>,
    limit: usize,
}

impl Default for SnapshotManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl SnapshotManager {
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn commit(&mut self, state: &ProjectState) {
        self.push_past(Snapshot::capture(state));
        self.future.clear();
        debug!(past = self.past.len(), "history commit");
    }

    fn push_past(&mut self, snapshot: Snapshot) {
        self.past.push_back(snapshot);
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Restores the previous snapshot. Returns `false` at the floor.
    pub fn undo(&mut self, state: &mut ProjectState) -> bool {
        if self.past.len() <= 1 {
            return false;
        }
        let Some(top) = self.past.pop_back() else {
            return false;
        };
        self.future.push(top);
        if let Some(previous) = self.past.back() {
            previous.restore_into(state);
        }
        debug!(past = self.past.len(), future = self.future.len(), "history undo");
        true
    }

    /// Re-applies the most recently undone snapshot.
    pub fn redo(&mut self, state: &mut ProjectState) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        next.restore_into(state);
        self.push_past(next);
        debug!(past = self.past.len(), future = self.future.len(), "history redo");
        true
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.past.len().saturating_sub(1)
    }

    pub fn redo_depth(&self) -> usize {
        self.future.len()
    }

    /// Drops all history and makes `state` the new floor.
    pub fn reset(&mut self, state: &ProjectState) {
        self.past.clear();
        self.future.clear();
        self.past.push_back(Snapshot::capture(state));
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.past.back()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MODAL EVENT BACKUP
// ═══════════════════════════════════════════════════════════════════════════════

/// Copy of the events portion of a project, taken when the event editor opens.
/// Restored verbatim on cancel without touching the undo/redo stacks.
#[derive(Debug, Clone, PartialEq)]
pub struct EventsBackup {
    component_events: IndexMap<String, EventMap>,
    global_events: EventMap,
    loop_event: Option<LoopBinding>,
}

impl EventsBackup {
    pub fn capture(state: &ProjectState) -> Self {
        Self {
            component_events: state.component_events.clone(),
            global_events: state.global_events.clone(),
            loop_event: state.loop_event.clone(),
        }
    }

    pub fn restore(self, state: &mut ProjectState) {
        state.component_events = self.component_events;
        state.global_events = self.global_events;
        state.loop_event = self.loop_event;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentKind;
    use crate::state::{ActionInvocation, ActionType, EventScope, Position};

    fn commit_components(n: usize, history: &mut SnapshotManager, state: &mut ProjectState) {
        for _ in 0..n {
            state.add_component(ComponentKind::Button, Position::default()).unwrap();
            history.commit(state);
        }
    }

    #[test]
    fn test_undo_at_floor_is_noop() {
        let mut state = ProjectState::default();
        let mut history = SnapshotManager::default();
        assert!(!history.undo(&mut state));
        history.commit(&state);
        assert!(!history.undo(&mut state));
        assert!(!history.can_undo());
    }

    #[test]
    fn test_undo_redo_walks_snapshots() {
        let mut state = ProjectState::default();
        let mut history = SnapshotManager::default();
        history.commit(&state);
        commit_components(3, &mut history, &mut state);

        assert!(history.undo(&mut state));
        assert!(history.undo(&mut state));
        assert_eq!(state.components.len(), 1);
        assert!(history.redo(&mut state));
        assert_eq!(state.components.len(), 2);
        assert_eq!(state.components[1].id, "button_2");
    }

    #[test]
    fn test_commit_clears_future() {
        let mut state = ProjectState::default();
        let mut history = SnapshotManager::default();
        history.commit(&state);
        commit_components(2, &mut history, &mut state);
        history.undo(&mut state);
        assert!(history.can_redo());
        commit_components(1, &mut history, &mut state);
        assert!(!history.can_redo());
        assert!(!history.redo(&mut state));
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut state = ProjectState::default();
        let mut history = SnapshotManager::new(3);
        history.commit(&state);
        commit_components(5, &mut history, &mut state);
        assert_eq!(history.undo_depth(), 2);
        while history.undo(&mut state) {}
        // Oldest retained snapshot holds three components.
        assert_eq!(state.components.len(), 3);
    }

    #[test]
    fn test_reset_sets_new_floor() {
        let mut state = ProjectState::default();
        let mut history = SnapshotManager::default();
        history.commit(&state);
        commit_components(2, &mut history, &mut state);
        history.reset(&state);
        assert!(!history.can_undo());
        assert_eq!(history.current().unwrap().state(), &state);
    }

    #[test]
    fn test_events_backup_restores_verbatim() {
        let mut state = ProjectState::default();
        let id = state.add_component(ComponentKind::Button, Position::default()).unwrap();
        let scope = EventScope::component(&id);
        state
            .add_action(&scope, "click", ActionInvocation::global(ActionType::Alert, "a"))
            .unwrap();
        let before = state.clone();

        let backup = EventsBackup::capture(&state);
        state
            .add_action(&scope, "click", ActionInvocation::global(ActionType::Alert, "b"))
            .unwrap();
        state
            .add_action(&EventScope::Global, "loop", ActionInvocation::global(ActionType::Alert, "c"))
            .unwrap();
        backup.restore(&mut state);
        assert_eq!(state, before);
    }
}
