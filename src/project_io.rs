//! Persisted project format.
//!
//! ```text
//! { version, name, description, componentCounter, globalSettings,
//!   components: [{ id, type, position, size, properties, events }],
//!   events: { componentId: { event: [action] } },
//!   globalEvents: { event: [action], loop: { interval, actions } },
//!   variables: { name: { type, value } } }
//! ```
//!
//! Loading builds a fresh `ProjectState` and either returns all of it or an
//! error; there is no partial load. The top-level `events` map wins over a
//! component's embedded `events`, which is only read when the top-level map
//! has no entry for that component.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::error::{BuilderError, Result};
use crate::registry::{ComponentKind, LOOP_EVENT};
use crate::state::{
    ComponentInstance, EventMap, GlobalSettings, LoopBinding, Position, ProjectState,
    ProjectVariable, Size, VariableType,
};

pub const FORMAT_VERSION: &str = "1.0";

// ═══════════════════════════════════════════════════════════════════════════════
// FILE TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    #[serde(default = "default_version")]
    version: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    component_counter: u64,
    #[serde(default)]
    global_settings: GlobalSettings,
    #[serde(default)]
    components: Vec<ComponentFile>,
    #[serde(default)]
    events: IndexMap<String, EventMap>,
    #[serde(default)]
    global_events: IndexMap<String, GlobalEventFile>,
    #[serde(default)]
    variables: IndexMap<String, VariableFile>,
}

fn default_version() -> String {
    FORMAT_VERSION.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComponentFile {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    size: Option<Size>,
    #[serde(default)]
    properties: IndexMap<String, Value>,
    #[serde(default)]
    events: EventMap,
}

/// `loop` is stored as an object; every other global event as a bare list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GlobalEventFile {
    Actions(Vec<crate::state::ActionInvocation>),
    Loop(LoopBinding),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VariableFile {
    #[serde(rename = "type")]
    var_type: VariableType,
    #[serde(default)]
    value: Value,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SAVE
// ═══════════════════════════════════════════════════════════════════════════════

pub fn to_json(state: &ProjectState) -> Result<String> {
    Ok(serde_json::to_string_pretty(&to_file(state))?)
}

fn to_file(state: &ProjectState) -> ProjectFile {
    let components = state
        .components
        .iter()
        .map(|c| ComponentFile {
            id: c.id.clone(),
            kind: c.kind.type_name().to_string(),
            position: c.position,
            size: Some(c.size),
            properties: c
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            events: state.component_events.get(&c.id).cloned().unwrap_or_default(),
        })
        .collect();

    let events = state
        .components
        .iter()
        .filter_map(|c| {
            state
                .component_events
                .get(&c.id)
                .filter(|events| !events.is_empty())
                .map(|events| (c.id.clone(), events.clone()))
        })
        .collect();

    let mut global_events: IndexMap<String, GlobalEventFile> = state
        .global_events
        .iter()
        .map(|(event, actions)| (event.clone(), GlobalEventFile::Actions(actions.clone())))
        .collect();
    if let Some(binding) = &state.loop_event {
        global_events.insert(LOOP_EVENT.to_string(), GlobalEventFile::Loop(binding.clone()));
    }

    let variables = state
        .variables
        .iter()
        .map(|(name, v)| {
            (
                name.clone(),
                VariableFile {
                    var_type: v.var_type,
                    value: v.value.clone(),
                },
            )
        })
        .collect();

    ProjectFile {
        version: FORMAT_VERSION.to_string(),
        name: state.name.clone(),
        description: state.description.clone(),
        component_counter: state.component_counter,
        global_settings: state.global_settings.clone(),
        components,
        events,
        global_events,
        variables,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOAD
// ═══════════════════════════════════════════════════════════════════════════════

pub fn from_json(text: &str) -> Result<ProjectState> {
    let file: ProjectFile = serde_json::from_str(text)?;
    if file.version != FORMAT_VERSION {
        warn!(version = %file.version, "loading project saved with a different format version");
    }
    let state = from_file(file)?;
    info!(
        components = state.components.len(),
        variables = state.variables.len(),
        "project loaded"
    );
    Ok(state)
}

fn from_file(file: ProjectFile) -> Result<ProjectState> {
    let mut state = ProjectState {
        name: file.name,
        description: file.description,
        component_counter: file.component_counter,
        global_settings: file.global_settings,
        ..Default::default()
    };

    let mut seen = HashSet::new();
    let mut embedded_events = Vec::new();
    for component in file.components {
        if !seen.insert(component.id.clone()) {
            return Err(BuilderError::InvalidProject(format!(
                "duplicate component id '{}'",
                component.id
            )));
        }
        let (instance, events) = load_component(component)?;
        if let Some(n) = id_suffix(&instance.id) {
            state.component_counter = state.component_counter.max(n);
        }
        embedded_events.push((instance.id.clone(), events));
        state.components.push(instance);
    }
    if state.component_counter == u64::MAX {
        return Err(BuilderError::InvalidProject(
            "component counter leaves no room for new ids".to_string(),
        ));
    }

    let mut top_level = file.events;
    for (id, embedded) in embedded_events {
        let events = top_level.shift_remove(&id).unwrap_or(embedded);
        if !events.is_empty() {
            state.component_events.insert(id, events);
        }
    }
    for id in top_level.keys() {
        warn!(component = %id, "dropping events bound to a component that does not exist");
    }

    for (event, binding) in file.global_events {
        if event == LOOP_EVENT {
            state.loop_event = Some(match binding {
                GlobalEventFile::Loop(binding) => binding,
                GlobalEventFile::Actions(actions) => LoopBinding {
                    interval: Value::Null,
                    actions,
                },
            });
        } else {
            let actions = match binding {
                GlobalEventFile::Actions(actions) => actions,
                GlobalEventFile::Loop(binding) => binding.actions,
            };
            state.global_events.insert(event, actions);
        }
    }

    for (name, variable) in file.variables {
        let loaded = load_variable(&name, variable)?;
        state.variables.insert(name, loaded);
    }

    Ok(state)
}

fn load_component(file: ComponentFile) -> Result<(ComponentInstance, EventMap)> {
    let kind = ComponentKind::from_name(&file.kind)
        .ok_or_else(|| BuilderError::UnknownComponentType(file.kind.clone()))?;

    let mut properties = kind.default_properties();
    for (name, value) in file.properties {
        match properties.get_mut(&name) {
            Some(slot) => *slot = stringify(value),
            None => warn!(component = %file.id, property = %name, "ignoring unknown property"),
        }
    }

    let size = file.size.unwrap_or_else(|| {
        let (width, height) = kind.spec().default_size;
        Size::new(width, height)
    });

    Ok((
        ComponentInstance {
            id: file.id,
            kind,
            position: file.position,
            size,
            properties,
        },
        file.events,
    ))
}

fn load_variable(name: &str, file: VariableFile) -> Result<ProjectVariable> {
    match file.value {
        Value::Null => ProjectVariable::new(name, file.var_type, file.var_type.zero_value()),
        Value::String(raw) if file.var_type != VariableType::String => {
            ProjectVariable::parse(name, file.var_type, &raw)
        }
        value => ProjectVariable::new(name, file.var_type, value),
    }
}

fn stringify(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Numeric suffix of a `{type}_{n}` id.
fn id_suffix(id: &str) -> Option<u64> {
    id.rsplit_once('_').and_then(|(_, n)| n.parse().ok())
}
