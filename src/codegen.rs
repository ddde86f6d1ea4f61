//! Codegen module for the visual builder
//!
//! Generates the runtime JavaScript program from a `ProjectState`.
//! The whole program is regenerated on every call; identical state always
//! yields byte-identical text.

#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

use crate::accessor::{PropertyAccessor, RuntimeAccessor};
use crate::action::ActionCompiler;
use crate::config::CompileOptions;
use crate::error::Result;
use crate::registry::{ALL_KINDS, LOOP_EVENT};
use crate::state::{ActionInvocation, ProjectState};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct ProgramOutput {
    /// Variable, component-kind and binding tables.
    pub variables: String,
    pub prelude: String,
    pub handlers: String,
    pub init: String,
    pub bundle: String,
    /// Handler function names in emission order.
    pub handler_names: Vec<String>,
}

/// One emitted handler function.
struct Handler {
    name: String,
    label: String,
    statements: Vec<String>,
}

enum Registration {
    Element { component_id: String, event: String },
    Window { event: String },
    Interval { ms: u64 },
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUNTIME PRELUDE
// ═══════════════════════════════════════════════════════════════════════════════

pub const RUNTIME_PRELUDE: &str = r#"const __rt = (function () {
  const timers = [];
  const listeners = [];
  const vars = {};
  const node = (id) => document.getElementById(id);
  const clone = (value) => (value !== null && typeof value === 'object') ? JSON.parse(JSON.stringify(value)) : value;
  Object.keys(__vars).forEach((name) => { vars[name] = clone(__vars[name].value); });

  function bindingOf(id, prop) {
    const table = __bindings[__components[id]] || {};
    const spec = table[prop] || ('attr:' + prop);
    const sep = spec.indexOf(':');
    return sep < 0 ? [spec, ''] : [spec.slice(0, sep), spec.slice(sep + 1)];
  }

  function truthy(value) {
    return value === true || value === 1 || value === 'true' || value === '1';
  }

  function getProp(id, prop) {
    const el = node(id);
    if (!el) return '';
    const [kind, key] = bindingOf(id, prop);
    switch (kind) {
      case 'text': return el.textContent;
      case 'value': return el.value;
      case 'checked': return el.checked;
      case 'enabled': return !el.disabled;
      case 'visible': return el.style.display !== 'none';
      case 'options': return Array.from(el.options || []).map((o) => o.text).join(',');
      case 'style': return el.style.getPropertyValue(key);
      case 'px': return parseFloat(el.style.getPropertyValue(key)) || 0;
      default: return el.getAttribute(key) || '';
    }
  }

  function setProp(id, prop, value) {
    const el = node(id);
    if (!el) return;
    const [kind, key] = bindingOf(id, prop);
    switch (kind) {
      case 'text': el.textContent = String(value); break;
      case 'value': el.value = String(value); break;
      case 'checked': el.checked = truthy(value); break;
      case 'enabled': el.disabled = !truthy(value); break;
      case 'visible': el.style.display = truthy(value) ? '' : 'none'; break;
      case 'options':
        el.innerHTML = '';
        String(value).split(',').forEach((text) => {
          const option = document.createElement('option');
          option.text = text.trim();
          el.appendChild(option);
        });
        break;
      case 'style': el.style.setProperty(key, String(value)); break;
      case 'px': {
        const n = parseFloat(value);
        el.style.setProperty(key, isNaN(n) ? String(value) : n + 'px');
        break;
      }
      default: el.setAttribute(key, String(value));
    }
  }

  function show(id) { setProp(id, 'visible', true); }
  function hide(id) { setProp(id, 'visible', false); }
  function toggle(id) { setProp(id, 'visible', !getProp(id, 'visible')); }
  function toggleChecked(id) { setProp(id, 'checked', !getProp(id, 'checked')); }

  function focus(id) {
    const el = node(id);
    if (el && typeof el.focus === 'function') el.focus();
  }

  function setBorder(id, style, width, color, radius) {
    const el = node(id);
    if (!el) return;
    const w = parseFloat(width);
    const r = parseFloat(radius);
    el.style.border = (isNaN(w) ? String(width) : w + 'px') + ' ' + style + ' ' + color;
    el.style.borderRadius = isNaN(r) ? String(radius) : r + 'px';
  }

  function typeOf(name) {
    const decl = __vars[name];
    if (decl) return decl.type;
    return Array.isArray(vars[name]) ? 'array' : typeof vars[name];
  }

  function coerce(name, value) {
    switch (typeOf(name)) {
      case 'number': {
        const n = Number(value);
        return isNaN(n) ? vars[name] : n;
      }
      case 'boolean': return truthy(value);
      case 'string': return String(value);
      case 'object':
      case 'array':
        if (typeof value !== 'string') return value;
        try { return JSON.parse(value); } catch (e) { return vars[name]; }
      default: return value;
    }
  }

  function getVar(name) { return vars[name]; }
  function setVar(name, value) { vars[name] = coerce(name, value); }

  function updateVar(name, op, operand) {
    if (!(name in vars)) {
      console.warn('[visual-builder] unknown variable', name);
      return;
    }
    if (op === 'set') {
      setVar(name, operand);
      return;
    }
    if (op === 'add' && typeOf(name) === 'string') {
      vars[name] = String(vars[name]) + String(operand);
      return;
    }
    const current = Number(vars[name]);
    const n = Number(operand);
    if (isNaN(current) || isNaN(n)) {
      console.warn('[visual-builder] non-numeric operand for', name);
      return;
    }
    switch (op) {
      case 'add': vars[name] = current + n; break;
      case 'subtract': vars[name] = current - n; break;
      case 'multiply': vars[name] = current * n; break;
      case 'divide':
        if (n === 0) {
          console.warn('[visual-builder] division by zero on', name);
          return;
        }
        vars[name] = current / n;
        break;
      default: console.warn('[visual-builder] unknown operation', op);
    }
  }

  function on(id, event, handler) {
    const el = node(id);
    if (!el) return;
    el.addEventListener(event, handler);
    listeners.push([el, event, handler]);
  }

  function listen(event, handler) {
    if (event === 'load' && document.readyState === 'complete') {
      setTimeout(handler, 0);
      return;
    }
    window.addEventListener(event, handler);
    listeners.push([window, event, handler]);
  }

  function every(handler, ms) {
    timers.push(setInterval(handler, ms));
  }

  function dispose() {
    timers.splice(0).forEach((timer) => clearInterval(timer));
    listeners.splice(0).forEach(([target, event, handler]) => target.removeEventListener(event, handler));
  }

  function customAlert(message) {
    const overlay = document.createElement('div');
    overlay.className = 'vb-alert-overlay';
    overlay.style.cssText = 'position:fixed;inset:0;background:rgba(0,0,0,0.4);display:flex;align-items:center;justify-content:center;z-index:10000';
    const box = document.createElement('div');
    box.style.cssText = 'background:#fff;padding:16px 20px;border-radius:6px;min-width:200px;font-family:sans-serif';
    const text = document.createElement('p');
    text.textContent = String(message);
    const ok = document.createElement('button');
    ok.textContent = 'OK';
    ok.addEventListener('click', () => overlay.remove());
    box.appendChild(text);
    box.appendChild(ok);
    overlay.appendChild(box);
    document.body.appendChild(overlay);
  }

  function redirect(url) {
    window.location.href = String(url);
  }

  const api = {
    getProp, setProp, show, hide, toggle, focus, toggleChecked, setBorder,
    getVar, setVar, updateVar, on, listen, every, dispose, customAlert, redirect,
  };
  window.__vbRuntime = api;
  window.addEventListener('pagehide', dispose);
  return api;
})();"#;

// ═══════════════════════════════════════════════════════════════════════════════
// PROGRAM GENERATION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn generate_program(state: &ProjectState, options: &CompileOptions) -> ProgramOutput {
    generate_program_with(state, options, &RuntimeAccessor)
}

/// Handlers and init registrations are rendered through `accessor`; the data
/// tables and `RUNTIME_PRELUDE` are emitted unchanged.
pub fn generate_program_with<A: PropertyAccessor + ?Sized>(
    state: &ProjectState,
    options: &CompileOptions,
    accessor: &A,
) -> ProgramOutput {
    let compiler = ActionCompiler::new(accessor);
    let mut names = HandlerNames::default();
    let mut handlers: Vec<Handler> = Vec::new();
    let mut registrations: Vec<(Registration, String)> = Vec::new();
    let mut window_registrations: Vec<(Registration, String)> = Vec::new();

    // 1. Global events, insertion order; `loop` is never stored here.
    for (event, actions) in &state.global_events {
        if event == LOOP_EVENT {
            continue;
        }
        let name = names.claim(&format!("global_on_{}", event));
        handlers.push(build_handler(&compiler, &name, format!("global · {}", event), actions));
        window_registrations.push((Registration::Window { event: event.clone() }, name));
    }

    // 2. Loop handler last among globals.
    let mut interval_registration = None;
    if let Some(binding) = &state.loop_event {
        let name = names.claim("global_loop");
        handlers.push(build_handler(&compiler, &name, "global · loop".to_string(), &binding.actions));
        if !binding.actions.is_empty() {
            let ms = binding.effective_interval(options.default_loop_interval_ms);
            interval_registration = Some((Registration::Interval { ms }, name));
        }
    }

    // 3. Component events in canvas order; orphaned bindings are skipped.
    for component in &state.components {
        let Some(events) = state.component_events.get(&component.id) else {
            continue;
        };
        for (event, actions) in events {
            let name = names.claim(&format!("on_{}_{}", component.id, event));
            handlers.push(build_handler(
                &compiler,
                &name,
                format!("{} · {}", component.id, event),
                actions,
            ));
            registrations.push((
                Registration::Element {
                    component_id: component.id.clone(),
                    event: event.clone(),
                },
                name,
            ));
        }
    }

    registrations.extend(window_registrations);
    registrations.extend(interval_registration);

    let variables = emit_tables(state);
    let handlers_code = handlers
        .iter()
        .map(|h| emit_handler(h, options.emit_comments))
        .collect::<Vec<_>>()
        .join("\n\n");
    let init = emit_init(accessor, &registrations);
    let handler_names: Vec<String> = handlers.iter().map(|h| h.name.clone()).collect();

    let mut sections = vec![variables.as_str(), RUNTIME_PRELUDE];
    if !handlers_code.is_empty() {
        sections.push(handlers_code.as_str());
    }
    sections.push(init.as_str());
    let bundle = format!("{}\n", sections.join("\n\n"));

    debug!(
        handlers = handler_names.len(),
        registrations = registrations.len(),
        bytes = bundle.len(),
        "generated program"
    );

    ProgramOutput {
        variables,
        prelude: RUNTIME_PRELUDE.to_string(),
        handlers: handlers_code,
        init,
        bundle,
        handler_names,
    }
}

fn build_handler<A: PropertyAccessor + ?Sized>(
    compiler: &ActionCompiler<'_, A>,
    name: &str,
    label: String,
    actions: &[ActionInvocation],
) -> Handler {
    Handler {
        name: name.to_string(),
        label,
        statements: actions.iter().flat_map(|a| compiler.compile(a)).collect(),
    }
}

/// Deterministic, collision-free handler identifiers.
#[derive(Default)]
struct HandlerNames {
    used: HashSet<String>,
}

impl HandlerNames {
    fn claim(&mut self, raw: &str) -> String {
        let base = sanitize_identifier(raw);
        let mut candidate = base.clone();
        let mut n = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", base, n);
            n += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }
}

pub fn sanitize_identifier(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.chars().next().map_or(true, |c| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

// ═══════════════════════════════════════════════════════════════════════════════
// EMITTERS
// ═══════════════════════════════════════════════════════════════════════════════

/// JSON embedded in a script element.
fn script_json(value: &Value) -> String {
    value.to_string().replace("</", "<\\/")
}

fn emit_tables(state: &ProjectState) -> String {
    let mut vars = Map::new();
    for (name, variable) in &state.variables {
        let mut entry = Map::new();
        entry.insert("type".to_string(), Value::from(variable.var_type.as_str()));
        entry.insert("value".to_string(), variable.value.clone());
        vars.insert(name.clone(), Value::Object(entry));
    }

    let mut components = Map::new();
    for component in &state.components {
        components.insert(component.id.clone(), Value::from(component.kind.type_name()));
    }

    let mut bindings = Map::new();
    for kind in ALL_KINDS {
        if !state.components.iter().any(|c| c.kind == kind) {
            continue;
        }
        let table: Map<String, Value> = kind
            .runtime_bindings()
            .into_iter()
            .map(|(name, spec)| (name.to_string(), Value::from(spec)))
            .collect();
        bindings.insert(kind.type_name().to_string(), Value::Object(table));
    }

    format!(
        "const __vars = {};\nconst __components = {};\nconst __bindings = {};",
        script_json(&Value::Object(vars)),
        script_json(&Value::Object(components)),
        script_json(&Value::Object(bindings)),
    )
}

fn emit_handler(handler: &Handler, emit_comments: bool) -> String {
    let mut out = String::new();
    if emit_comments {
        out.push_str(&format!("// {}\n", comment_text(&handler.label)));
    }
    out.push_str(&format!("function {}() {{\n", handler.name));
    for statement in &handler.statements {
        out.push_str("  ");
        out.push_str(statement);
        out.push('\n');
    }
    out.push('}');
    out
}

/// Label text safe inside a `//` comment: every JS line terminator is blanked.
fn comment_text(label: &str) -> String {
    label
        .chars()
        .map(|c| match c {
            '\n' | '\r' | '\u{2028}' | '\u{2029}' => ' ',
            c => c,
        })
        .collect()
}

fn emit_init<A: PropertyAccessor + ?Sized>(
    accessor: &A,
    registrations: &[(Registration, String)],
) -> String {
    let mut body = String::new();
    for (registration, handler) in registrations {
        let line = match registration {
            Registration::Element {
                component_id,
                event,
            } => accessor.invoke(
                "on",
                &[
                    crate::reference::js_string(component_id),
                    crate::reference::js_string(event),
                    handler.clone(),
                ],
            ),
            Registration::Window { event } => accessor.invoke(
                "listen",
                &[crate::reference::js_string(event), handler.clone()],
            ),
            Registration::Interval { ms } => {
                accessor.invoke("every", &[handler.clone(), ms.to_string()])
            }
        };
        body.push_str("  ");
        body.push_str(&line);
        body.push('\n');
    }

    format!(
        r#"function __init() {{
{}}}

if (document.readyState === 'loading') {{
  document.addEventListener('DOMContentLoaded', __init);
}} else {{
  __init();
}}"#,
        body
    )
}

/// Parses a project document and generates its program.
pub fn compile_project_json(project_json: &str, options_json: Option<&str>) -> Result<ProgramOutput> {
    let options = match options_json {
        Some(json) => CompileOptions::from_json(json)?,
        None => CompileOptions::default(),
    };
    let state = crate::project_io::from_json(project_json)?;
    Ok(generate_program(&state, &options))
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn compile_project_native(
    project_json: String,
    options_json: Option<String>,
) -> napi::Result<ProgramOutput> {
    compile_project_json(&project_json, options_json.as_deref())
        .map_err(|e| napi::Error::from_reason(format!("{}: {}", e.code(), e)))
}

// ═══════════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ComponentKind;
    use crate::state::{ActionType, EventScope, Position, ProjectVariable, VariableType};
    use serde_json::json;

    fn sample_state() -> ProjectState {
        let mut state = ProjectState::new("demo");
        state.set_variable(ProjectVariable::parse("counter", VariableType::Number, "0").unwrap());
        let button = state.add_component(ComponentKind::Button, Position::new(10.0, 10.0)).unwrap();
        let label = state.add_component(ComponentKind::Label, Position::new(10.0, 60.0)).unwrap();
        state
            .add_action(
                &EventScope::component(&button),
                "click",
                ActionInvocation::global(ActionType::ManipulateVariable, "counter,add,1"),
            )
            .unwrap();
        state
            .add_action(
                &EventScope::component(&button),
                "click",
                ActionInvocation::targeting(&label, ActionType::SetText, "Count: <counter>"),
            )
            .unwrap();
        state
            .add_action(
                &EventScope::Global,
                "load",
                ActionInvocation::global(ActionType::ConsoleLog, "ready"),
            )
            .unwrap();
        state
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("on_button_1_click"), "on_button_1_click");
        assert_eq!(sanitize_identifier("on_a-b_key up"), "on_a_b_key_up");
        assert_eq!(sanitize_identifier("1abc"), "_1abc");
    }

    #[test]
    fn test_handler_names_are_unique() {
        let mut names = HandlerNames::default();
        assert_eq!(names.claim("on_a-b_click"), "on_a_b_click");
        assert_eq!(names.claim("on_a_b_click"), "on_a_b_click_2");
    }

    #[test]
    fn test_program_sections_and_order() {
        let output = generate_program(&sample_state(), &CompileOptions::default());
        assert_eq!(output.handler_names, vec!["global_on_load", "on_button_1_click"]);
        assert!(output.handlers.contains("// button_1 · click"));
        assert!(output
            .handlers
            .contains(r#"__rt.updateVar("counter", "add", "1");"#));
        assert!(output.handlers.contains(
            r#"__rt.setProp("label_2", "text", ("Count: " + __rt.getVar("counter")));"#
        ));
        assert!(output.init.contains(r#"__rt.on("button_1", "click", on_button_1_click);"#));
        assert!(output.init.contains(r#"__rt.listen("load", global_on_load);"#));
        assert!(output.init.contains("document.readyState === 'loading'"));

        let on = output.bundle.find("function on_button_1_click").unwrap();
        let global = output.bundle.find("function global_on_load").unwrap();
        let prelude = output.bundle.find("const __rt").unwrap();
        let init = output.bundle.find("function __init").unwrap();
        assert!(prelude < global && global < on && on < init);
    }

    #[test]
    fn test_tables_are_emitted_in_insertion_order() {
        let output = generate_program(&sample_state(), &CompileOptions::default());
        assert!(output
            .variables
            .contains(r#"const __vars = {"counter":{"type":"number","value":0}};"#));
        assert!(output
            .variables
            .contains(r#"const __components = {"button_1":"button","label_2":"label"};"#));
        assert!(output.variables.contains(r#""button":{"text":"text""#));
        assert!(!output.variables.contains(r#""image":"#));
    }

    #[test]
    fn test_loop_registers_interval() {
        let mut state = ProjectState::default();
        state
            .add_action(
                &EventScope::Global,
                LOOP_EVENT,
                ActionInvocation::global(ActionType::ConsoleLog, "tick"),
            )
            .unwrap();
        state.set_loop_interval(json!(500));
        let output = generate_program(&state, &CompileOptions::default());
        assert!(output.init.contains("__rt.every(global_loop, 500);"));

        state.set_loop_interval(json!("bogus"));
        let output = generate_program(&state, &CompileOptions::default());
        assert!(output.init.contains("__rt.every(global_loop, 1000);"));
    }

    #[test]
    fn test_empty_loop_emits_handler_without_timer() {
        let mut state = ProjectState::default();
        state.set_loop_interval(json!(200));
        let output = generate_program(&state, &CompileOptions::default());
        assert_eq!(output.handler_names, vec!["global_loop"]);
        assert!(!output.init.contains("every("));
    }

    #[test]
    fn test_loop_follows_other_globals() {
        let mut state = ProjectState::default();
        state
            .add_action(&EventScope::Global, LOOP_EVENT, ActionInvocation::global(ActionType::Alert, "l"))
            .unwrap();
        state
            .add_action(&EventScope::Global, "keydown", ActionInvocation::global(ActionType::Alert, "k"))
            .unwrap();
        let output = generate_program(&state, &CompileOptions::default());
        assert_eq!(output.handler_names, vec!["global_on_keydown", "global_loop"]);
        let listen = output.init.find("listen(").unwrap();
        let every = output.init.find("every(").unwrap();
        assert!(listen < every);
    }

    #[test]
    fn test_orphaned_bindings_are_skipped() {
        let mut state = sample_state();
        state.component_events.insert("ghost_9".to_string(), Default::default());
        state
            .component_events
            .get_mut("ghost_9")
            .unwrap()
            .insert("click".to_string(), vec![ActionInvocation::global(ActionType::Alert, "x")]);
        let output = generate_program(&state, &CompileOptions::default());
        assert!(!output.bundle.contains("ghost_9"));
    }

    #[test]
    fn test_comments_can_be_disabled() {
        let options = CompileOptions {
            emit_comments: false,
            ..Default::default()
        };
        let output = generate_program(&sample_state(), &options);
        assert!(!output.handlers.contains("//"));
    }

    #[test]
    fn test_generation_is_deterministic() {
        let state = sample_state();
        let options = CompileOptions::default();
        assert_eq!(
            generate_program(&state, &options).bundle,
            generate_program(&state, &options).bundle
        );
    }

    #[test]
    fn test_script_closing_tags_are_escaped_in_tables() {
        let mut state = ProjectState::default();
        state.set_variable(
            ProjectVariable::parse("html", VariableType::String, "</script><b>").unwrap(),
        );
        let output = generate_program(&state, &CompileOptions::default());
        assert!(!output.bundle.contains("</script>"));
        assert!(output.variables.contains(r#"<\/script>"#));
    }

    #[test]
    fn test_huge_loop_interval_uses_default() {
        let mut state = ProjectState::default();
        state
            .add_action(
                &EventScope::Global,
                LOOP_EVENT,
                ActionInvocation::global(ActionType::ConsoleLog, "tick"),
            )
            .unwrap();
        state.set_loop_interval(json!(1e300));
        let output = generate_program(&state, &CompileOptions::default());
        assert!(output.init.contains("__rt.every(global_loop, 1000);"));
    }

    #[test]
    fn test_line_terminators_in_labels_stay_inside_comment() {
        let mut state = ProjectState::default();
        let id = state.add_component(ComponentKind::Button, Position::default()).unwrap();
        for event in ["click\r)", "click\u{2028})", "click\u{2029})", "click\n)"] {
            state
                .component_events
                .entry(id.clone())
                .or_default()
                .insert(event.to_string(), vec![ActionInvocation::global(ActionType::Alert, "x")]);
        }
        let output = generate_program(&state, &CompileOptions::default());
        let check = crate::verify::check_program(&output.bundle);
        assert!(check.is_valid(), "{:?}", check.syntax_errors);
        assert!(check.missing_handlers(&output.handler_names).is_empty());
        assert_eq!(comment_text("a\rb\u{2028}c\u{2029}d\ne"), "a b c d e");
    }

    struct TracingAccessor;

    impl PropertyAccessor for TracingAccessor {
        fn read_property(&self, component_id: &str, property: &str) -> String {
            format!("host.read({:?}, {:?})", component_id, property)
        }

        fn write_property(&self, component_id: &str, property: &str, value_expr: &str) -> String {
            format!("host.write({:?}, {:?}, {});", component_id, property, value_expr)
        }

        fn read_variable(&self, name: &str) -> String {
            format!("host.var({:?})", name)
        }

        fn invoke(&self, helper: &str, args: &[String]) -> String {
            format!("host.{}({});", helper, args.join(", "))
        }
    }

    #[test]
    fn test_custom_accessor_drives_handlers_and_init() {
        let mut state = sample_state();
        state
            .add_action(&EventScope::Global, LOOP_EVENT, ActionInvocation::global(ActionType::Alert, "t"))
            .unwrap();
        let output = generate_program_with(&state, &CompileOptions::default(), &TracingAccessor);
        assert!(output.handlers.contains(r#"host.write("label_2", "text""#));
        assert!(output.init.contains(r#"host.on("button_1", "click", on_button_1_click);"#));
        assert!(output.init.contains(r#"host.listen("load", global_on_load);"#));
        assert!(output.init.contains("host.every(global_loop, 1000);"));
        assert!(!output.init.contains("__rt."));
    }

    #[test]
    fn test_style_actions_bind_on_kinds_without_stored_style() {
        let mut state = ProjectState::default();
        let panel = state.add_component(ComponentKind::Panel, Position::default()).unwrap();
        state.add_component(ComponentKind::Link, Position::default()).unwrap();
        state
            .add_action(
                &EventScope::Global,
                "load",
                ActionInvocation::targeting(&panel, ActionType::SetColor, "red"),
            )
            .unwrap();
        let output = generate_program(&state, &CompileOptions::default());
        assert!(output.variables.contains(r#""color":"style:color""#));
        assert!(output.variables.contains(r#""background":"style:background-color""#));
        assert!(output.variables.contains(r#""fontSize":"px:font-size""#));
        assert!(!output.variables.contains(r#""attr:color""#));
    }

    fn prelude_function(name: &str) -> &'static str {
        let start = RUNTIME_PRELUDE
            .find(&format!("  function {}(", name))
            .unwrap();
        let len = RUNTIME_PRELUDE[start..].find("\n  }\n").unwrap();
        &RUNTIME_PRELUDE[start..start + len]
    }

    // Branch shapes only; the prelude is not executed in these tests.
    #[test]
    fn test_update_var_branches() {
        let update = prelude_function("updateVar");
        assert!(update.contains("if (op === 'set') {\n      setVar(name, operand);"));
        assert!(update.contains(
            "if (op === 'add' && typeOf(name) === 'string') {\n      vars[name] = String(vars[name]) + String(operand);"
        ));
        let divide = update.find("case 'divide':").unwrap();
        let guard = update.find("if (n === 0)").unwrap();
        let assign = update.find("vars[name] = current / n;").unwrap();
        assert!(divide < guard && guard < assign);
        assert!(update[guard..assign].contains("return;"));
    }

    #[test]
    fn test_coerce_follows_declared_type() {
        let coerce = prelude_function("coerce");
        assert!(coerce.contains("switch (typeOf(name))"));
        assert!(coerce.contains("case 'boolean': return truthy(value);"));
        assert!(coerce.contains("case 'string': return String(value);"));
        assert!(coerce.contains("return isNaN(n) ? vars[name] : n;"));
        assert!(prelude_function("truthy").contains("value === 'true' || value === '1'"));
    }

    #[test]
    fn test_compile_project_json_rejects_bad_options() {
        let err = compile_project_json("{}", Some(r#"{"historyLimit": 0}"#)).unwrap_err();
        assert_eq!(err.code(), "E_INVALID_OPTIONS");
    }
}
