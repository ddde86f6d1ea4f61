#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::reference::{references, Reference};
use crate::registry::GLOBAL_EVENTS;
use crate::state::{ActionInvocation, ActionType, ProjectState, IDENTIFIER_RE};

// ═══════════════════════════════════════════════════════════════════════════════
// INVARIANT CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const INV_MISSING_COMPONENT: &str = "VB-REF-001";
pub const INV_MISSING_VARIABLE: &str = "VB-REF-002";
pub const INV_MISSING_TARGET: &str = "VB-ACT-001";
pub const INV_MALFORMED_MANIPULATION: &str = "VB-ACT-002";
pub const INV_UNSUPPORTED_ACTION: &str = "VB-ACT-003";
pub const INV_SCOPE_MISMATCH: &str = "VB-ACT-004";
pub const INV_UNKNOWN_EVENT: &str = "VB-EVT-001";

pub const VARIABLE_OPERATIONS: &[&str] = &["set", "add", "subtract", "multiply", "divide"];

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(code: &str) -> &'static str {
    match code {
        INV_MISSING_COMPONENT => "Property references read from a component that exists on the canvas.",
        INV_MISSING_VARIABLE => "Variable references read a declared project variable.",
        INV_MISSING_TARGET => "Element actions target a component that exists on the canvas.",
        INV_MALFORMED_MANIPULATION => {
            "Variable manipulation values have the form name,operation,value with a known operation."
        }
        INV_UNSUPPORTED_ACTION => "Only recognized action types produce runtime behavior.",
        INV_SCOPE_MISMATCH => "Global actions carry no target and element actions carry one.",
        INV_UNKNOWN_EVENT => "Bindings use an event their owner can fire.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct ValidationProblem {
    pub code: String,
    /// Offending token or value fragment.
    pub token: String,
    pub message: String,
    pub guarantee: String,
}

impl ValidationProblem {
    pub fn new(code: &str, token: &str, message: String) -> Self {
        Self {
            code: code.to_string(),
            token: token.to_string(),
            message,
            guarantee: get_guarantee(code).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub ok: bool,
    pub problems: Vec<ValidationProblem>,
}

impl ValidationReport {
    fn from_problems(problems: Vec<ValidationProblem>) -> Self {
        Self {
            ok: problems.is_empty(),
            problems,
        }
    }
}

/// A problem found by `lint_project`, with its binding location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct LocatedProblem {
    /// `global` or the owning component id.
    pub scope: String,
    pub event: String,
    /// Absent for problems with the binding itself.
    pub action_index: Option<u32>,
    pub problem: ValidationProblem,
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Checks every reference in `raw` against the current state.
///
/// Only the component id of a property reference is checked; property names
/// are not. Never mutates anything.
pub fn validate(raw: &str, state: &ProjectState) -> ValidationReport {
    ValidationReport::from_problems(reference_problems(raw, state))
}

fn reference_problems(raw: &str, state: &ProjectState) -> Vec<ValidationProblem> {
    references(raw)
        .into_iter()
        .filter_map(|reference| match &reference {
            Reference::Property { component_id, .. } if !state.has_component(component_id) => {
                Some(ValidationProblem::new(
                    INV_MISSING_COMPONENT,
                    &reference.token(),
                    format!("Component '{}' does not exist", component_id),
                ))
            }
            Reference::Variable(name) if state.variable(name).is_none() => {
                Some(ValidationProblem::new(
                    INV_MISSING_VARIABLE,
                    &reference.token(),
                    format!("Variable '{}' does not exist", name),
                ))
            }
            _ => None,
        })
        .collect()
}

/// Reference checks plus action-level checks (target, manipulation format).
pub fn validate_action(action: &ActionInvocation, state: &ProjectState) -> ValidationReport {
    let mut problems = Vec::new();

    if !action.action_type.is_supported() {
        problems.push(ValidationProblem::new(
            INV_UNSUPPORTED_ACTION,
            action.action_type.as_str(),
            format!("Action type '{}' is not supported", action.action_type),
        ));
    }

    let action_type = &action.action_type;
    if action_type.is_supported() && action_type.is_global() == action.target_id.is_some() {
        let message = if action_type.is_global() {
            format!("'{}' does not take a target component", action_type)
        } else {
            format!("'{}' needs a target component", action_type)
        };
        problems.push(ValidationProblem::new(INV_SCOPE_MISMATCH, action_type.as_str(), message));
    }

    if let Some(target) = &action.target_id {
        if !state.has_component(target) {
            problems.push(ValidationProblem::new(
                INV_MISSING_TARGET,
                target,
                format!("Target component '{}' does not exist", target),
            ));
        }
    }

    if action.action_type == ActionType::ManipulateVariable {
        problems.extend(manipulation_problems(&action.raw_value, state));
        // Only the operand may carry references.
        if let Some(operand) = action.raw_value.splitn(3, ',').nth(2) {
            problems.extend(reference_problems(operand, state));
        }
    } else {
        problems.extend(reference_problems(&action.raw_value, state));
    }

    ValidationReport::from_problems(problems)
}

fn manipulation_problems(raw: &str, state: &ProjectState) -> Vec<ValidationProblem> {
    let fields: Vec<&str> = raw.splitn(3, ',').collect();
    if fields.len() < 3 {
        return vec![ValidationProblem::new(
            INV_MALFORMED_MANIPULATION,
            raw,
            format!("Expected name,operation,value but got '{}'", raw),
        )];
    }

    let mut problems = Vec::new();
    let name = fields[0].trim();
    let operation = fields[1].trim();
    if !VARIABLE_OPERATIONS.contains(&operation) {
        problems.push(ValidationProblem::new(
            INV_MALFORMED_MANIPULATION,
            operation,
            format!(
                "Unknown operation '{}' (expected one of {})",
                operation,
                VARIABLE_OPERATIONS.join(", ")
            ),
        ));
    }
    if state.variable(name).is_none() {
        problems.push(ValidationProblem::new(
            INV_MISSING_VARIABLE,
            name,
            format!("Variable '{}' does not exist", name),
        ));
    }
    problems
}

/// Checks every binding's event name and runs `validate_action` over every
/// bound action. Used before export.
pub fn lint_project(state: &ProjectState) -> Vec<LocatedProblem> {
    let mut located = Vec::new();

    for event in state.global_events.keys() {
        if !GLOBAL_EVENTS.contains(&event.as_str()) {
            located.push(unknown_event(
                "global",
                event,
                format!("The page does not fire a '{}' event", event),
            ));
        }
    }
    for component in &state.components {
        if let Some(events) = state.events_for(&component.id) {
            for event in events.keys() {
                if !component.kind.offers_event(event) {
                    located.push(unknown_event(
                        &component.id,
                        event,
                        format!(
                            "{} '{}' does not fire a '{}' event",
                            component.kind.spec().label,
                            component.id,
                            event
                        ),
                    ));
                }
            }
        }
    }

    for (scope, event, index, action) in state.all_actions() {
        for problem in validate_action(action, state).problems {
            located.push(LocatedProblem {
                scope: scope.to_string(),
                event: event.to_string(),
                action_index: Some(index as u32),
                problem,
            });
        }
    }
    located
}

fn unknown_event(scope: &str, event: &str, message: String) -> LocatedProblem {
    LocatedProblem {
        scope: scope.to_string(),
        event: event.to_string(),
        action_index: None,
        problem: ValidationProblem::new(INV_UNKNOWN_EVENT, event, message),
    }
}

pub fn validate_variable_name(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name)
}

/// Parses a project document and validates `raw` against it.
pub fn validate_against_project(raw: &str, project_json: &str) -> Result<ValidationReport> {
    let state = crate::project_io::from_json(project_json)?;
    Ok(validate(raw, &state))
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn validate_reference_native(raw: String, project_json: String) -> napi::Result<ValidationReport> {
    validate_against_project(&raw, &project_json)
        .map_err(|e| napi::Error::from_reason(format!("{}: {}", e.code(), e)))
}
