//! Editor session
//!
//! The single controller the editor talks to. It owns the project state, the
//! snapshot manager and the compile options. Every successful mutation
//! commits exactly one snapshot, except while an event-edit session is open:
//! then action edits accumulate and `commit_event_edit` commits them as one
//! snapshot, or `cancel_event_edit` restores the events captured when the
//! session opened without touching history.
//!
//! While an event-edit session is open, undo/redo and canvas/variable
//! mutations are refused with `EventEditInProgress`.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codegen::{generate_program, ProgramOutput};
use crate::config::CompileOptions;
use crate::document::render_document;
use crate::error::{BuilderError, Result};
use crate::history::{EventsBackup, SnapshotManager};
use crate::project_io;
use crate::registry::ComponentKind;
use crate::state::{
    ActionInvocation, EventScope, GlobalSettings, Position, ProjectState, ProjectVariable, Size,
    VariableType,
};
use crate::validate::{lint_project, validate_action, LocatedProblem, ValidationReport};
use crate::verify::verify_bundle;

/// Result of an action edit that passed through validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Committed,
    /// Validation found problems; nothing changed. Retry with `confirmed`.
    NeedsConfirmation(ValidationReport),
}

#[derive(Debug)]
pub struct EditorSession {
    state: ProjectState,
    history: SnapshotManager,
    options: CompileOptions,
    event_edit: Option<EventsBackup>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(CompileOptions::default())
    }
}

impl EditorSession {
    pub fn new(options: CompileOptions) -> Self {
        Self::with_state(ProjectState::default(), options)
    }

    /// Starts a session on an existing state; it becomes the undo floor.
    pub fn with_state(state: ProjectState, options: CompileOptions) -> Self {
        let mut history = SnapshotManager::new(options.history_limit);
        history.reset(&state);
        Self {
            state,
            history,
            options,
            event_edit: None,
        }
    }

    pub fn state(&self) -> &ProjectState {
        &self.state
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn history(&self) -> &SnapshotManager {
        &self.history
    }

    pub fn is_editing_events(&self) -> bool {
        self.event_edit.is_some()
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.event_edit.is_some() {
            return Err(BuilderError::EventEditInProgress);
        }
        Ok(())
    }

    fn commit(&mut self) {
        if self.event_edit.is_none() {
            self.history.commit(&self.state);
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CANVAS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn add_component(&mut self, kind: ComponentKind, position: Position) -> Result<String> {
        self.ensure_idle()?;
        let id = self.state.add_component(kind, position)?;
        self.commit();
        debug!(component = %id, "component added");
        Ok(id)
    }

    pub fn remove_component(&mut self, id: &str) -> Result<()> {
        self.ensure_idle()?;
        self.state.remove_component(id)?;
        self.commit();
        debug!(component = %id, "component removed");
        Ok(())
    }

    pub fn set_property(&mut self, id: &str, property: &str, value: &str) -> Result<()> {
        self.ensure_idle()?;
        self.state.set_property(id, property, value)?;
        self.commit();
        Ok(())
    }

    pub fn move_component(&mut self, id: &str, position: Position) -> Result<()> {
        self.ensure_idle()?;
        self.state.move_component(id, position)?;
        self.commit();
        Ok(())
    }

    pub fn resize_component(&mut self, id: &str, size: Size) -> Result<()> {
        self.ensure_idle()?;
        self.state.resize_component(id, size)?;
        self.commit();
        Ok(())
    }

    pub fn clear_canvas(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.state.clear_components();
        self.commit();
        info!("canvas cleared");
        Ok(())
    }

    pub fn set_global_settings(&mut self, settings: GlobalSettings) -> Result<()> {
        self.ensure_idle()?;
        self.state.global_settings = settings;
        self.commit();
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VARIABLES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Creates or replaces a variable from editor text. Parse failures leave
    /// the state untouched.
    pub fn set_variable(&mut self, name: &str, var_type: VariableType, raw: &str) -> Result<()> {
        self.ensure_idle()?;
        let variable = ProjectVariable::parse(name, var_type, raw)?;
        self.state.set_variable(variable);
        self.commit();
        debug!(variable = %name, var_type = %var_type, "variable set");
        Ok(())
    }

    pub fn remove_variable(&mut self, name: &str) -> Result<()> {
        self.ensure_idle()?;
        self.state.remove_variable(name)?;
        self.commit();
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // EVENTS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn begin_event_edit(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.event_edit = Some(EventsBackup::capture(&self.state));
        debug!("event edit opened");
        Ok(())
    }

    pub fn commit_event_edit(&mut self) -> Result<()> {
        self.event_edit.take().ok_or(BuilderError::NoEventEdit)?;
        self.history.commit(&self.state);
        debug!("event edit committed");
        Ok(())
    }

    pub fn cancel_event_edit(&mut self) -> Result<()> {
        let backup = self.event_edit.take().ok_or(BuilderError::NoEventEdit)?;
        backup.restore(&mut self.state);
        debug!("event edit cancelled");
        Ok(())
    }

    /// Appends an action after validating it. Problems block the edit until
    /// the caller retries with `confirmed`.
    pub fn add_action(
        &mut self,
        scope: &EventScope,
        event: &str,
        action: ActionInvocation,
        confirmed: bool,
    ) -> Result<ActionOutcome> {
        if let Some(outcome) = self.check_action(&action, confirmed) {
            return Ok(outcome);
        }
        self.state.add_action(scope, event, action)?;
        self.commit();
        Ok(ActionOutcome::Committed)
    }

    pub fn update_action(
        &mut self,
        scope: &EventScope,
        event: &str,
        index: usize,
        action: ActionInvocation,
        confirmed: bool,
    ) -> Result<ActionOutcome> {
        if let Some(outcome) = self.check_action(&action, confirmed) {
            return Ok(outcome);
        }
        self.state.replace_action(scope, event, index, action)?;
        self.commit();
        Ok(ActionOutcome::Committed)
    }

    fn check_action(&self, action: &ActionInvocation, confirmed: bool) -> Option<ActionOutcome> {
        let report = validate_action(action, &self.state);
        if report.ok {
            return None;
        }
        if confirmed {
            warn!(
                action = %action.action_type,
                problems = report.problems.len(),
                "committing action with unresolved references"
            );
            return None;
        }
        Some(ActionOutcome::NeedsConfirmation(report))
    }

    pub fn remove_action(&mut self, scope: &EventScope, event: &str, index: usize) -> Result<ActionInvocation> {
        let removed = self.state.remove_action(scope, event, index)?;
        self.commit();
        Ok(removed)
    }

    pub fn move_action(&mut self, scope: &EventScope, event: &str, from: usize, to: usize) -> Result<()> {
        self.state.move_action(scope, event, from, to)?;
        self.commit();
        Ok(())
    }

    pub fn remove_event(&mut self, scope: &EventScope, event: &str) -> Result<()> {
        self.state.remove_event(scope, event)?;
        self.commit();
        Ok(())
    }

    /// Stores the raw interval; it is interpreted at compile time.
    pub fn set_loop_interval(&mut self, interval: Value) {
        self.state.set_loop_interval(interval);
        self.commit();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // HISTORY
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn undo(&mut self) -> Result<bool> {
        self.ensure_idle()?;
        Ok(self.history.undo(&mut self.state))
    }

    pub fn redo(&mut self) -> Result<bool> {
        self.ensure_idle()?;
        Ok(self.history.redo(&mut self.state))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // OUTPUT
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn compile(&self) -> ProgramOutput {
        let program = generate_program(&self.state, &self.options);
        if self.options.verify_output && !verify_bundle(&program.bundle, &program.handler_names) {
            warn!("generated program failed verification");
        }
        program
    }

    pub fn export_document(&self) -> String {
        let problems = self.lint();
        if !problems.is_empty() {
            warn!(problems = problems.len(), "exporting project with unresolved references");
        }
        render_document(&self.state, &self.compile(), &self.options)
    }

    pub fn lint(&self) -> Vec<LocatedProblem> {
        lint_project(&self.state)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PERSISTENCE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Replaces the project with a parsed document. On error nothing changes.
    pub fn load_json(&mut self, text: &str) -> Result<()> {
        self.ensure_idle()?;
        let state = project_io::from_json(text)?;
        self.state = state;
        self.history.reset(&self.state);
        Ok(())
    }

    pub fn save_json(&self) -> Result<String> {
        project_io::to_json(&self.state)
    }

    /// Starts over with an empty project; the id counter restarts.
    pub fn new_project(&mut self, name: &str) -> Result<()> {
        self.ensure_idle()?;
        self.state = ProjectState::new(name);
        self.history.reset(&self.state);
        info!(project = %name, "new project");
        Ok(())
    }
}
