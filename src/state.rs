//! Project State
//!
//! The mutable data model consumed by the compiler: component instances,
//! event bindings (component-scoped and global), typed variables, global
//! settings and the id counter. A single `ProjectState` is owned by the
//! editor session and lent to every other subsystem.
//!
//! Methods here mutate state only; committing snapshots is the session's job.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{BuilderError, Result};
use crate::registry::{ComponentKind, LOOP_EVENT};

lazy_static! {
    /// Project variable names.
    pub static ref IDENTIFIER_RE: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// GEOMETRY
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENTS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentInstance {
    pub id: String,
    pub kind: ComponentKind,
    pub position: Position,
    pub size: Size,
    pub properties: IndexMap<String, String>,
}

impl ComponentInstance {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(|v| v.as_str())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Closed set of behaviors an event can trigger. Names that are not
/// recognized are kept verbatim in `Unsupported` so they survive a round trip;
/// the compiler emits nothing for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    // Global actions (no target)
    Alert,
    CustomAlert,
    ConsoleLog,
    Redirect,
    ManipulateVariable,
    // Element actions (target required)
    SetText,
    SetValue,
    SetColor,
    SetBackground,
    SetFontSize,
    SetBorder,
    Move,
    Resize,
    Show,
    Hide,
    ToggleVisibility,
    ClearValue,
    Focus,
    Enable,
    Disable,
    ToggleCheckbox,
    Unsupported(String),
}

pub const GLOBAL_ACTIONS: &[ActionType] = &[
    ActionType::Alert,
    ActionType::CustomAlert,
    ActionType::ConsoleLog,
    ActionType::Redirect,
    ActionType::ManipulateVariable,
];

pub const ELEMENT_ACTIONS: &[ActionType] = &[
    ActionType::SetText,
    ActionType::SetValue,
    ActionType::SetColor,
    ActionType::SetBackground,
    ActionType::SetFontSize,
    ActionType::SetBorder,
    ActionType::Move,
    ActionType::Resize,
    ActionType::Show,
    ActionType::Hide,
    ActionType::ToggleVisibility,
    ActionType::ClearValue,
    ActionType::Focus,
    ActionType::Enable,
    ActionType::Disable,
    ActionType::ToggleCheckbox,
];

impl ActionType {
    pub fn as_str(&self) -> &str {
        match self {
            ActionType::Alert => "alert",
            ActionType::CustomAlert => "custom_alert",
            ActionType::ConsoleLog => "console_log",
            ActionType::Redirect => "redirect",
            ActionType::ManipulateVariable => "manipulate_variable",
            ActionType::SetText => "set_text",
            ActionType::SetValue => "set_value",
            ActionType::SetColor => "set_color",
            ActionType::SetBackground => "set_background",
            ActionType::SetFontSize => "set_font_size",
            ActionType::SetBorder => "set_border",
            ActionType::Move => "move",
            ActionType::Resize => "resize",
            ActionType::Show => "show",
            ActionType::Hide => "hide",
            ActionType::ToggleVisibility => "toggle_visibility",
            ActionType::ClearValue => "clear_value",
            ActionType::Focus => "focus",
            ActionType::Enable => "enable",
            ActionType::Disable => "disable",
            ActionType::ToggleCheckbox => "toggle_checkbox",
            ActionType::Unsupported(name) => name,
        }
    }

    pub fn from_name(name: &str) -> Self {
        GLOBAL_ACTIONS
            .iter()
            .chain(ELEMENT_ACTIONS.iter())
            .find(|a| a.as_str() == name)
            .cloned()
            .unwrap_or_else(|| ActionType::Unsupported(name.to_string()))
    }

    /// Label shown in the event editor; persisted as `actionName`.
    pub fn display_name(&self) -> &str {
        match self {
            ActionType::Alert => "Show Alert",
            ActionType::CustomAlert => "Show Custom Alert",
            ActionType::ConsoleLog => "Log to Console",
            ActionType::Redirect => "Redirect to URL",
            ActionType::ManipulateVariable => "Manipulate Variable",
            ActionType::SetText => "Set Text",
            ActionType::SetValue => "Set Value",
            ActionType::SetColor => "Set Text Color",
            ActionType::SetBackground => "Set Background",
            ActionType::SetFontSize => "Set Font Size",
            ActionType::SetBorder => "Set Border",
            ActionType::Move => "Move To",
            ActionType::Resize => "Resize",
            ActionType::Show => "Show",
            ActionType::Hide => "Hide",
            ActionType::ToggleVisibility => "Toggle Visibility",
            ActionType::ClearValue => "Clear Value",
            ActionType::Focus => "Focus",
            ActionType::Enable => "Enable",
            ActionType::Disable => "Disable",
            ActionType::ToggleCheckbox => "Toggle Checkbox",
            ActionType::Unsupported(name) => name,
        }
    }

    pub fn is_global(&self) -> bool {
        GLOBAL_ACTIONS.contains(self)
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, ActionType::Unsupported(_))
    }
}

impl From<String> for ActionType {
    fn from(name: String) -> Self {
        ActionType::from_name(&name)
    }
}

impl From<ActionType> for String {
    fn from(action: ActionType) -> Self {
        action.as_str().to_string()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionInvocation {
    #[serde(default)]
    pub target_id: Option<String>,
    pub action_type: ActionType,
    #[serde(default)]
    pub action_name: String,
    #[serde(rename = "value", default, deserialize_with = "de_lenient_string")]
    pub raw_value: String,
}

impl ActionInvocation {
    pub fn new(target_id: Option<&str>, action_type: ActionType, raw_value: &str) -> Self {
        Self {
            target_id: target_id.map(|t| t.to_string()),
            action_name: action_type.display_name().to_string(),
            action_type,
            raw_value: raw_value.to_string(),
        }
    }

    pub fn global(action_type: ActionType, raw_value: &str) -> Self {
        Self::new(None, action_type, raw_value)
    }

    pub fn targeting(target_id: &str, action_type: ActionType, raw_value: &str) -> Self {
        Self::new(Some(target_id), action_type, raw_value)
    }
}

/// Accepts any JSON scalar where a string is expected; `null` becomes empty.
pub(crate) fn de_lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// EVENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Owner of an event binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventScope {
    Global,
    Component(String),
}

impl EventScope {
    pub fn component(id: &str) -> Self {
        EventScope::Component(id.to_string())
    }
}

impl fmt::Display for EventScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventScope::Global => f.write_str("global"),
            EventScope::Component(id) => f.write_str(id),
        }
    }
}

/// The timer-driven global event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoopBinding {
    /// Raw interval as entered; may be a number, a string, or absent.
    #[serde(default)]
    pub interval: Value,
    #[serde(default)]
    pub actions: Vec<ActionInvocation>,
}

/// Largest delay a browser timer honours; longer delays fire immediately.
pub const MAX_INTERVAL_MS: u64 = i32::MAX as u64;

impl LoopBinding {
    /// Interval in milliseconds, or `default_ms` when unset, invalid, not
    /// positive or beyond `MAX_INTERVAL_MS`.
    pub fn effective_interval(&self, default_ms: u64) -> u64 {
        let parsed = match &self.interval {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(ms) if ms.is_finite() && ms >= 1.0 && ms.round() <= MAX_INTERVAL_MS as f64 => {
                ms.round() as u64
            }
            _ => default_ms,
        }
    }
}

pub type EventMap = IndexMap<String, Vec<ActionInvocation>>;

// ═══════════════════════════════════════════════════════════════════════════════
// VARIABLES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableType {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl VariableType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableType::String => "string",
            VariableType::Number => "number",
            VariableType::Boolean => "boolean",
            VariableType::Object => "object",
            VariableType::Array => "array",
        }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            VariableType::String => value.is_string(),
            VariableType::Number => value.is_number(),
            VariableType::Boolean => value.is_boolean(),
            VariableType::Object => value.is_object(),
            VariableType::Array => value.is_array(),
        }
    }

    /// Value given to a freshly created variable of this type.
    pub fn zero_value(&self) -> Value {
        match self {
            VariableType::String => Value::String(String::new()),
            VariableType::Number => Value::from(0),
            VariableType::Boolean => Value::Bool(false),
            VariableType::Object => Value::Object(serde_json::Map::new()),
            VariableType::Array => Value::Array(Vec::new()),
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectVariable {
    pub name: String,
    pub var_type: VariableType,
    pub value: Value,
}

impl ProjectVariable {
    /// Builds a variable from an already-typed value.
    pub fn new(name: &str, var_type: VariableType, value: Value) -> Result<Self> {
        validate_variable_name(name)?;
        if !var_type.accepts(&value) {
            return Err(BuilderError::InvalidVariableValue {
                name: name.to_string(),
                var_type: var_type.to_string(),
                reason: format!("{} is not a {}", value, var_type),
            });
        }
        Ok(Self {
            name: name.to_string(),
            var_type,
            value,
        })
    }

    /// Parses the text typed into the variable editor.
    pub fn parse(name: &str, var_type: VariableType, raw: &str) -> Result<Self> {
        validate_variable_name(name)?;
        let invalid = |reason: String| BuilderError::InvalidVariableValue {
            name: name.to_string(),
            var_type: var_type.to_string(),
            reason,
        };

        let value = match var_type {
            VariableType::String => Value::String(raw.to_string()),
            VariableType::Number => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    Value::from(0)
                } else if let Ok(i) = trimmed.parse::<i64>() {
                    Value::from(i)
                } else {
                    let f = trimmed
                        .parse::<f64>()
                        .map_err(|_| invalid(format!("'{}' is not a number", trimmed)))?;
                    serde_json::Number::from_f64(f)
                        .map(Value::Number)
                        .ok_or_else(|| invalid(format!("'{}' is not a finite number", trimmed)))?
                }
            }
            VariableType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Value::Bool(true),
                "false" | "" => Value::Bool(false),
                other => return Err(invalid(format!("'{}' is not true or false", other))),
            },
            VariableType::Object | VariableType::Array => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    var_type.zero_value()
                } else {
                    let parsed: Value =
                        serde_json::from_str(trimmed).map_err(|e| invalid(e.to_string()))?;
                    if !var_type.accepts(&parsed) {
                        return Err(invalid(format!("expected a JSON {}", var_type)));
                    }
                    parsed
                }
            }
        };

        Ok(Self {
            name: name.to_string(),
            var_type,
            value,
        })
    }
}

pub fn validate_variable_name(name: &str) -> Result<()> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(BuilderError::InvalidVariableName(name.to_string()))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// GLOBAL SETTINGS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    Visible,
    Hidden,
    #[default]
    Auto,
    Scroll,
}

impl Overflow {
    pub fn as_css(&self) -> &'static str {
        match self {
            Overflow::Visible => "visible",
            Overflow::Hidden => "hidden",
            Overflow::Auto => "auto",
            Overflow::Scroll => "scroll",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default = "default_background")]
    pub background_color: String,
    #[serde(default)]
    pub overflow: Overflow,
}

fn default_background() -> String {
    "#ffffff".to_string()
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            background_color: default_background(),
            overflow: Overflow::default(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROJECT STATE
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProjectState {
    pub name: String,
    pub description: String,
    /// Last numeric suffix handed out; ids are `{type}_{counter}`.
    pub component_counter: u64,
    pub global_settings: GlobalSettings,
    /// Canvas insertion order.
    pub components: Vec<ComponentInstance>,
    /// Component id → event name → ordered actions.
    pub component_events: IndexMap<String, EventMap>,
    /// Global events other than `loop`.
    pub global_events: EventMap,
    pub loop_event: Option<LoopBinding>,
    pub variables: IndexMap<String, ProjectVariable>,
}

impl ProjectState {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    // ── Components ──────────────────────────────────────────────────────────

    pub fn component(&self, id: &str) -> Option<&ComponentInstance> {
        self.components.iter().find(|c| c.id == id)
    }

    pub fn has_component(&self, id: &str) -> bool {
        self.component(id).is_some()
    }

    fn component_mut(&mut self, id: &str) -> Result<&mut ComponentInstance> {
        self.components
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| BuilderError::UnknownComponent(id.to_string()))
    }

    /// Places a new instance with registry defaults and returns its id.
    pub fn add_component(&mut self, kind: ComponentKind, position: Position) -> Result<String> {
        let counter = self
            .component_counter
            .checked_add(1)
            .ok_or(BuilderError::IdSpaceExhausted)?;
        self.component_counter = counter;
        let id = format!("{}_{}", kind.type_name(), counter);
        let (width, height) = kind.spec().default_size;
        self.components.push(ComponentInstance {
            id: id.clone(),
            kind,
            position,
            size: Size::new(width, height),
            properties: kind.default_properties(),
        });
        Ok(id)
    }

    /// Removes an instance together with the event bindings it owns.
    pub fn remove_component(&mut self, id: &str) -> Result<ComponentInstance> {
        let index = self
            .components
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| BuilderError::UnknownComponent(id.to_string()))?;
        self.component_events.shift_remove(id);
        Ok(self.components.remove(index))
    }

    pub fn set_property(&mut self, id: &str, property: &str, value: &str) -> Result<()> {
        let component = self.component_mut(id)?;
        if !component.kind.has_property(property) {
            return Err(BuilderError::UnknownProperty {
                id: id.to_string(),
                property: property.to_string(),
            });
        }
        component
            .properties
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    pub fn move_component(&mut self, id: &str, position: Position) -> Result<()> {
        self.component_mut(id)?.position = position;
        Ok(())
    }

    /// Dimensions below one pixel are clamped to one.
    pub fn resize_component(&mut self, id: &str, size: Size) -> Result<()> {
        self.component_mut(id)?.size = Size::new(size.width.max(1.0), size.height.max(1.0));
        Ok(())
    }

    /// Removes every component and its bindings. The id counter is kept so
    /// ids are never reused within the project.
    pub fn clear_components(&mut self) {
        self.components.clear();
        self.component_events.clear();
    }

    // ── Variables ───────────────────────────────────────────────────────────

    pub fn variable(&self, name: &str) -> Option<&ProjectVariable> {
        self.variables.get(name)
    }

    /// Inserts or replaces a variable; replacing keeps its position.
    pub fn set_variable(&mut self, variable: ProjectVariable) {
        self.variables.insert(variable.name.clone(), variable);
    }

    pub fn remove_variable(&mut self, name: &str) -> Result<ProjectVariable> {
        self.variables
            .shift_remove(name)
            .ok_or_else(|| BuilderError::UnknownVariable(name.to_string()))
    }

    // ── Events ──────────────────────────────────────────────────────────────

    pub fn events_for(&self, component_id: &str) -> Option<&EventMap> {
        self.component_events.get(component_id)
    }

    pub fn actions(&self, scope: &EventScope, event: &str) -> Option<&[ActionInvocation]> {
        match scope {
            EventScope::Global if event == LOOP_EVENT => {
                self.loop_event.as_ref().map(|l| l.actions.as_slice())
            }
            EventScope::Global => self.global_events.get(event).map(|a| a.as_slice()),
            EventScope::Component(id) => self
                .component_events
                .get(id)
                .and_then(|events| events.get(event))
                .map(|a| a.as_slice()),
        }
    }

    fn actions_mut(&mut self, scope: &EventScope, event: &str) -> Result<&mut Vec<ActionInvocation>> {
        match scope {
            EventScope::Global if event == LOOP_EVENT => {
                Ok(&mut self.loop_event.get_or_insert_with(LoopBinding::default).actions)
            }
            EventScope::Global => Ok(self.global_events.entry(event.to_string()).or_default()),
            EventScope::Component(id) => {
                if !self.has_component(id) {
                    return Err(BuilderError::UnknownComponent(id.clone()));
                }
                Ok(self
                    .component_events
                    .entry(id.clone())
                    .or_default()
                    .entry(event.to_string())
                    .or_default())
            }
        }
    }

    fn existing_actions_mut(
        &mut self,
        scope: &EventScope,
        event: &str,
    ) -> Result<&mut Vec<ActionInvocation>> {
        if self.actions(scope, event).is_none() {
            return Err(BuilderError::UnknownEvent(format!("{}:{}", scope, event)));
        }
        self.actions_mut(scope, event)
    }

    /// Appends an action; the binding is created on first use.
    pub fn add_action(
        &mut self,
        scope: &EventScope,
        event: &str,
        action: ActionInvocation,
    ) -> Result<()> {
        self.actions_mut(scope, event)?.push(action);
        Ok(())
    }

    pub fn replace_action(
        &mut self,
        scope: &EventScope,
        event: &str,
        index: usize,
        action: ActionInvocation,
    ) -> Result<ActionInvocation> {
        let actions = self.existing_actions_mut(scope, event)?;
        let slot = actions
            .get_mut(index)
            .ok_or_else(|| BuilderError::ActionIndexOutOfRange {
                event: event.to_string(),
                index,
            })?;
        Ok(std::mem::replace(slot, action))
    }

    pub fn remove_action(
        &mut self,
        scope: &EventScope,
        event: &str,
        index: usize,
    ) -> Result<ActionInvocation> {
        let actions = self.existing_actions_mut(scope, event)?;
        if index >= actions.len() {
            return Err(BuilderError::ActionIndexOutOfRange {
                event: event.to_string(),
                index,
            });
        }
        Ok(actions.remove(index))
    }

    /// Moves the action at `from` so it ends up at index `to`.
    pub fn move_action(&mut self, scope: &EventScope, event: &str, from: usize, to: usize) -> Result<()> {
        let actions = self.existing_actions_mut(scope, event)?;
        let len = actions.len();
        for index in [from, to] {
            if index >= len {
                return Err(BuilderError::ActionIndexOutOfRange {
                    event: event.to_string(),
                    index,
                });
            }
        }
        let action = actions.remove(from);
        actions.insert(to, action);
        Ok(())
    }

    /// Drops a whole binding (all its actions).
    pub fn remove_event(&mut self, scope: &EventScope, event: &str) -> Result<()> {
        let removed = match scope {
            EventScope::Global if event == LOOP_EVENT => self.loop_event.take().is_some(),
            EventScope::Global => self.global_events.shift_remove(event).is_some(),
            EventScope::Component(id) => {
                let removed = self
                    .component_events
                    .get_mut(id)
                    .and_then(|events| events.shift_remove(event))
                    .is_some();
                if self.component_events.get(id).map_or(false, |e| e.is_empty()) {
                    self.component_events.shift_remove(id);
                }
                removed
            }
        };
        if removed {
            Ok(())
        } else {
            Err(BuilderError::UnknownEvent(format!("{}:{}", scope, event)))
        }
    }

    pub fn set_loop_interval(&mut self, interval: Value) {
        self.loop_event
            .get_or_insert_with(LoopBinding::default)
            .interval = interval;
    }

    /// Every bound action with its location, in emission order.
    pub fn all_actions(&self) -> Vec<(EventScope, &str, usize, &ActionInvocation)> {
        let mut out = Vec::new();
        for (event, actions) in &self.global_events {
            for (i, action) in actions.iter().enumerate() {
                out.push((EventScope::Global, event.as_str(), i, action));
            }
        }
        if let Some(binding) = &self.loop_event {
            for (i, action) in binding.actions.iter().enumerate() {
                out.push((EventScope::Global, LOOP_EVENT, i, action));
            }
        }
        for component in &self.components {
            if let Some(events) = self.component_events.get(&component.id) {
                for (event, actions) in events {
                    for (i, action) in actions.iter().enumerate() {
                        out.push((EventScope::component(&component.id), event.as_str(), i, action));
                    }
                }
            }
        }
        out
    }
}
