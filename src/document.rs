//! Document exporter
//!
//! Wraps a generated program and the rendered component markup into one
//! standalone HTML document. Each component is rendered from its registry
//! template; geometry and style-bound properties go into the inline style,
//! attribute-like bindings become attributes, text content is escaped.

#[cfg(feature = "napi")]
use napi_derive::napi;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::codegen::{generate_program, ProgramOutput};
use crate::config::CompileOptions;
use crate::error::Result;
use crate::registry::{is_truthy, PropertyBinding};
use crate::state::{ComponentInstance, ProjectState};

pub const UNTITLED: &str = "Untitled Project";

lazy_static! {
    static ref PLACEHOLDER_RE: Regex = Regex::new(r"\{\{([a-zA-Z_]+)\}\}").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// DOCUMENT
// ═══════════════════════════════════════════════════════════════════════════════

pub fn render_document(state: &ProjectState, program: &ProgramOutput, options: &CompileOptions) -> String {
    let title = options
        .document_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| Some(state.name.as_str()).filter(|n| !n.trim().is_empty()))
        .unwrap_or(UNTITLED);

    let markup = state
        .components
        .iter()
        .map(|c| format!("  {}", render_component(c)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{}</title>
  <style>
    body {{ margin: 0; position: relative; min-height: 100vh; background-color: {}; overflow: {}; }}
    .vb-component {{ position: absolute; box-sizing: border-box; }}
  </style>
</head>
<body>
{}
  <script>
{}
  </script>
</body>
</html>
"#,
        escape_html(title),
        css_value(&state.global_settings.background_color),
        state.global_settings.overflow.as_css(),
        markup,
        program.bundle.trim_end(),
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPONENT MARKUP
// ═══════════════════════════════════════════════════════════════════════════════

pub fn render_component(component: &ComponentInstance) -> String {
    let template = component.kind.spec().markup;
    let style = inline_style(component);
    let attrs = attributes(component, template);

    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "id" => escape_html(&component.id),
            "style" => escape_html(&style),
            "attrs" => attrs.clone(),
            "options" => render_options(component),
            name => component.property(name).map(escape_html).unwrap_or_default(),
        })
        .into_owned()
}

fn inline_style(component: &ComponentInstance) -> String {
    let mut style = format!(
        "left:{}px;top:{}px;width:{}px;height:{}px;",
        component.position.x, component.position.y, component.size.width, component.size.height
    );
    for (name, value) in &component.properties {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match component.kind.binding(name) {
            Some(PropertyBinding::Style(css)) => {
                style.push_str(&format!("{}:{};", css, css_value(value)));
            }
            Some(PropertyBinding::Px(css)) => match value.parse::<f64>() {
                Ok(n) => style.push_str(&format!("{}:{}px;", css, n)),
                Err(_) => style.push_str(&format!("{}:{};", css, css_value(value))),
            },
            _ => {}
        }
    }
    style
}

fn attributes(component: &ComponentInstance, template: &str) -> String {
    let value_in_body = template.contains("{{value}}") || template.contains("{{options}}");
    let mut attrs = String::new();
    for (name, value) in &component.properties {
        match component.kind.binding(name) {
            Some(PropertyBinding::Attr(attr)) if !value.is_empty() => {
                attrs.push_str(&format!(" {}=\"{}\"", attr, escape_html(value)));
            }
            Some(PropertyBinding::Value) if !value_in_body => {
                attrs.push_str(&format!(" value=\"{}\"", escape_html(value)));
            }
            Some(PropertyBinding::Checked) if is_truthy(value) => attrs.push_str(" checked"),
            Some(PropertyBinding::Enabled) if !is_truthy(value) => attrs.push_str(" disabled"),
            _ => {}
        }
    }
    attrs
}

fn render_options(component: &ComponentInstance) -> String {
    let selected = component.property("value").unwrap_or_default();
    component
        .property("options")
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|o| {
            let marker = if o == selected { " selected" } else { "" };
            format!("<option{}>{}</option>", marker, escape_html(o))
        })
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// ESCAPING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Strips characters that could end a CSS declaration or the style element.
fn css_value(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ';' | '{' | '}' | '<' | '>'))
        .collect()
}

/// Parses a project document and exports it as HTML.
pub fn export_project_json(project_json: &str, options_json: Option<&str>) -> Result<String> {
    let options = match options_json {
        Some(json) => CompileOptions::from_json(json)?,
        None => CompileOptions::default(),
    };
    let state = crate::project_io::from_json(project_json)?;
    let program = generate_program(&state, &options);
    Ok(render_document(&state, &program, &options))
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn render_document_native(project_json: String, options_json: Option<String>) -> napi::Result<String> {
    export_project_json(&project_json, options_json.as_deref())
        .map_err(|e| napi::Error::from_reason(format!("{}: {}", e.code(), e)))
}
