//! # Visual Builder Behavior Compiler
//!
//! Turns a visually assembled component layout with declarative
//! "when X happens, do Y" bindings into one standalone browser program,
//! and gives every editor mutation reversible undo/redo semantics.
//!
//! ## Compilation Invariants
//!
//! 1. **Single State Owner**: one `ProjectState` per `EditorSession`. Every
//!    subsystem borrows it; nothing keeps a private copy except snapshots.
//!
//! 2. **Stable Ids**: component ids are `{type}_{n}` and never reused within
//!    a project. Clearing the canvas keeps the counter; only a new project
//!    resets it.
//!
//! 3. **References**: `<name>` reads a variable, `<id.property>` reads a
//!    component property. A value that is exactly one reference compiles to
//!    a direct read; anything else compiles to string concatenation.
//!
//! 4. **Warn, Don't Block**: unresolved references are reported by the
//!    validator and may be committed after confirmation. Unknown action
//!    types compile to nothing.
//!
//! 5. **Deterministic Output**: globals first (`loop` last), then components
//!    in canvas order, then events in insertion order. Identical state
//!    produces byte-identical program text.
//!
//! 6. **Whole-State History**: each commit snapshots the full state. Undo
//!    never pops the oldest retained snapshot; history beyond the limit is
//!    dropped.

#[cfg(feature = "napi")]
use napi_derive::napi;

pub mod accessor;
pub mod action;
pub mod codegen;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod project_io;
pub mod reference;
pub mod registry;
pub mod session;
pub mod state;
pub mod validate;
pub mod verify;


pub use accessor::{PropertyAccessor, RuntimeAccessor};
pub use action::ActionCompiler;
pub use codegen::{generate_program, generate_program_with, ProgramOutput};
pub use config::CompileOptions;
pub use document::render_document;
pub use error::{BuilderError, Result};
pub use history::{EventsBackup, Snapshot, SnapshotManager};
pub use reference::{references, resolve, Reference, Segment, ValueExpr};
pub use registry::{ComponentKind, PropertyBinding};
pub use session::{ActionOutcome, EditorSession};
pub use state::{
    ActionInvocation, ActionType, ComponentInstance, EventScope, GlobalSettings, LoopBinding,
    Overflow, Position, ProjectState, ProjectVariable, Size, VariableType,
};
pub use validate::{lint_project, validate, validate_action, ValidationProblem, ValidationReport};
pub use verify::{check_program, ProgramCheck};

#[cfg(feature = "napi")]
pub use codegen::compile_project_native;
#[cfg(feature = "napi")]
pub use document::render_document_native;
#[cfg(feature = "napi")]
pub use validate::validate_reference_native;
#[cfg(feature = "napi")]
pub use verify::check_program_native;

#[cfg(feature = "napi")]
#[napi]
pub fn compile_bridge() -> String {
    "Visual Builder Native Bridge Connected".to_string()
}
