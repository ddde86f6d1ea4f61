//! Component Registry
//!
//! Static catalog of the component kinds a user can place on the canvas.
//! Each kind declares its default properties, how the runtime reads and writes
//! each property, the DOM events the inspector offers, and the markup template
//! used when the project is exported as a document.

use indexmap::IndexMap;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ═══════════════════════════════════════════════════════════════════════════════
// KINDS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Button,
    Label,
    Input,
    Textarea,
    Checkbox,
    Image,
    Panel,
    Link,
    Select,
}

/// Registry order. Tables emitted from the registry follow this order.
pub const ALL_KINDS: [ComponentKind; 9] = [
    ComponentKind::Button,
    ComponentKind::Label,
    ComponentKind::Input,
    ComponentKind::Textarea,
    ComponentKind::Checkbox,
    ComponentKind::Image,
    ComponentKind::Panel,
    ComponentKind::Link,
    ComponentKind::Select,
];

/// Global (window-level) events. `loop` is the timer-driven event.
pub const GLOBAL_EVENTS: &[&str] = &["load", "keydown", "keyup", "resize", "scroll", "loop"];
pub const LOOP_EVENT: &str = "loop";

// ═══════════════════════════════════════════════════════════════════════════════
// PROPERTY BINDINGS
// ═══════════════════════════════════════════════════════════════════════════════

/// How a logical property maps onto the rendered element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyBinding {
    Text,
    Value,
    Checked,
    Enabled,
    Visible,
    /// Comma-separated list rendered as `<option>` children.
    Options,
    Attr(&'static str),
    Style(&'static str),
    /// CSS length; bare numbers are treated as pixels.
    Px(&'static str),
}

impl PropertyBinding {
    /// Binding descriptor understood by the runtime prelude (`getProp`/`setProp`).
    pub fn runtime_spec(&self) -> String {
        match self {
            PropertyBinding::Text => "text".to_string(),
            PropertyBinding::Value => "value".to_string(),
            PropertyBinding::Checked => "checked".to_string(),
            PropertyBinding::Enabled => "enabled".to_string(),
            PropertyBinding::Visible => "visible".to_string(),
            PropertyBinding::Options => "options".to_string(),
            PropertyBinding::Attr(name) => format!("attr:{}", name),
            PropertyBinding::Style(css) => format!("style:{}", css),
            PropertyBinding::Px(css) => format!("px:{}", css),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PropertyDef {
    pub name: &'static str,
    pub default: &'static str,
    pub binding: PropertyBinding,
}

const fn prop(name: &'static str, default: &'static str, binding: PropertyBinding) -> PropertyDef {
    PropertyDef {
        name,
        default,
        binding,
    }
}

/// Pseudo-properties every kind supports. Geometry lives on the instance, not
/// in its property map, but references and actions can address it by name.
pub const COMMON_PROPERTIES: &[PropertyDef] = &[
    prop("x", "0", PropertyBinding::Px("left")),
    prop("y", "0", PropertyBinding::Px("top")),
    prop("width", "0", PropertyBinding::Px("width")),
    prop("height", "0", PropertyBinding::Px("height")),
    prop("visible", "true", PropertyBinding::Visible),
    prop("enabled", "true", PropertyBinding::Enabled),
    prop("color", "", PropertyBinding::Style("color")),
    prop("background", "", PropertyBinding::Style("background-color")),
    prop("fontSize", "", PropertyBinding::Px("font-size")),
];

/// Content properties every kind answers to, bound per kind when not stored.
pub const CONTENT_PROPERTIES: &[&str] = &["text", "value", "checked"];

#[derive(Debug)]
pub struct ComponentSpec {
    pub kind: ComponentKind,
    pub label: &'static str,
    pub default_size: (f64, f64),
    pub properties: &'static [PropertyDef],
    pub events: &'static [&'static str],
    pub markup: &'static str,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CATALOG
// ═══════════════════════════════════════════════════════════════════════════════

const COLOR: PropertyBinding = PropertyBinding::Style("color");
const BACKGROUND: PropertyBinding = PropertyBinding::Style("background-color");
const FONT_SIZE: PropertyBinding = PropertyBinding::Px("font-size");

static BUTTON: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Button,
    label: "Button",
    default_size: (120.0, 40.0),
    properties: &[
        prop("text", "Button", PropertyBinding::Text),
        prop("color", "#ffffff", COLOR),
        prop("background", "#3b82f6", BACKGROUND),
        prop("fontSize", "14", FONT_SIZE),
        prop("enabled", "true", PropertyBinding::Enabled),
    ],
    events: &["click", "dblclick", "mouseover", "mouseout", "focus", "blur"],
    markup: r#"<button id="{{id}}" class="vb-component vb-button" style="{{style}}"{{attrs}}>{{text}}</button>"#,
};

static LABEL: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Label,
    label: "Label",
    default_size: (100.0, 24.0),
    properties: &[
        prop("text", "Label", PropertyBinding::Text),
        prop("color", "#111827", COLOR),
        prop("background", "transparent", BACKGROUND),
        prop("fontSize", "14", FONT_SIZE),
    ],
    events: &["click", "dblclick", "mouseover", "mouseout"],
    markup: r#"<span id="{{id}}" class="vb-component vb-label" style="{{style}}"{{attrs}}>{{text}}</span>"#,
};

static INPUT: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Input,
    label: "Text Input",
    default_size: (200.0, 36.0),
    properties: &[
        prop("value", "", PropertyBinding::Value),
        prop("placeholder", "Enter text", PropertyBinding::Attr("placeholder")),
        prop("color", "#111827", COLOR),
        prop("background", "#ffffff", BACKGROUND),
        prop("fontSize", "14", FONT_SIZE),
        prop("enabled", "true", PropertyBinding::Enabled),
    ],
    events: &["input", "change", "focus", "blur", "keydown", "keyup"],
    markup: r#"<input type="text" id="{{id}}" class="vb-component vb-input" style="{{style}}"{{attrs}}>"#,
};

static TEXTAREA: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Textarea,
    label: "Text Area",
    default_size: (240.0, 96.0),
    properties: &[
        prop("value", "", PropertyBinding::Value),
        prop("placeholder", "Enter text", PropertyBinding::Attr("placeholder")),
        prop("color", "#111827", COLOR),
        prop("background", "#ffffff", BACKGROUND),
        prop("fontSize", "14", FONT_SIZE),
        prop("enabled", "true", PropertyBinding::Enabled),
    ],
    events: &["input", "change", "focus", "blur", "keydown", "keyup"],
    markup: r#"<textarea id="{{id}}" class="vb-component vb-textarea" style="{{style}}"{{attrs}}>{{value}}</textarea>"#,
};

static CHECKBOX: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Checkbox,
    label: "Checkbox",
    default_size: (24.0, 24.0),
    properties: &[
        prop("checked", "false", PropertyBinding::Checked),
        prop("enabled", "true", PropertyBinding::Enabled),
    ],
    events: &["change", "click"],
    markup: r#"<input type="checkbox" id="{{id}}" class="vb-component vb-checkbox" style="{{style}}"{{attrs}}>"#,
};

static IMAGE: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Image,
    label: "Image",
    default_size: (160.0, 120.0),
    properties: &[
        prop("src", "", PropertyBinding::Attr("src")),
        prop("alt", "Image", PropertyBinding::Attr("alt")),
    ],
    events: &["click", "mouseover", "mouseout"],
    markup: r#"<img id="{{id}}" class="vb-component vb-image" style="{{style}}"{{attrs}}>"#,
};

static PANEL: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Panel,
    label: "Panel",
    default_size: (240.0, 160.0),
    properties: &[
        prop("background", "#f3f4f6", BACKGROUND),
        prop("borderRadius", "0", PropertyBinding::Px("border-radius")),
    ],
    events: &["click", "mouseover", "mouseout"],
    markup: r#"<div id="{{id}}" class="vb-component vb-panel" style="{{style}}"{{attrs}}></div>"#,
};

static LINK: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Link,
    label: "Link",
    default_size: (80.0, 24.0),
    properties: &[
        prop("text", "Link", PropertyBinding::Text),
        prop("href", "#", PropertyBinding::Attr("href")),
        prop("color", "#2563eb", COLOR),
        prop("fontSize", "14", FONT_SIZE),
    ],
    events: &["click", "mouseover", "mouseout"],
    markup: r#"<a id="{{id}}" class="vb-component vb-link" style="{{style}}"{{attrs}}>{{text}}</a>"#,
};

static SELECT: ComponentSpec = ComponentSpec {
    kind: ComponentKind::Select,
    label: "Dropdown",
    default_size: (160.0, 36.0),
    properties: &[
        prop("options", "Option 1,Option 2,Option 3", PropertyBinding::Options),
        prop("value", "Option 1", PropertyBinding::Value),
        prop("color", "#111827", COLOR),
        prop("background", "#ffffff", BACKGROUND),
        prop("fontSize", "14", FONT_SIZE),
        prop("enabled", "true", PropertyBinding::Enabled),
    ],
    events: &["change", "focus", "blur"],
    markup: r#"<select id="{{id}}" class="vb-component vb-select" style="{{style}}"{{attrs}}>{{options}}</select>"#,
};

lazy_static! {
    static ref KINDS_BY_NAME: HashMap<&'static str, ComponentKind> = {
        let mut m = HashMap::new();
        for kind in ALL_KINDS {
            m.insert(kind.type_name(), kind);
        }
        m
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// LOOKUPS
// ═══════════════════════════════════════════════════════════════════════════════

impl ComponentKind {
    pub fn spec(self) -> &'static ComponentSpec {
        match self {
            ComponentKind::Button => &BUTTON,
            ComponentKind::Label => &LABEL,
            ComponentKind::Input => &INPUT,
            ComponentKind::Textarea => &TEXTAREA,
            ComponentKind::Checkbox => &CHECKBOX,
            ComponentKind::Image => &IMAGE,
            ComponentKind::Panel => &PANEL,
            ComponentKind::Link => &LINK,
            ComponentKind::Select => &SELECT,
        }
    }

    /// Serialized name; also the prefix of generated instance ids.
    pub fn type_name(self) -> &'static str {
        match self {
            ComponentKind::Button => "button",
            ComponentKind::Label => "label",
            ComponentKind::Input => "input",
            ComponentKind::Textarea => "textarea",
            ComponentKind::Checkbox => "checkbox",
            ComponentKind::Image => "image",
            ComponentKind::Panel => "panel",
            ComponentKind::Link => "link",
            ComponentKind::Select => "select",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        KINDS_BY_NAME.get(name).copied()
    }

    /// Fresh property map for a newly placed instance, in registry order.
    pub fn default_properties(self) -> IndexMap<String, String> {
        self.spec()
            .properties
            .iter()
            .map(|p| (p.name.to_string(), p.default.to_string()))
            .collect()
    }

    /// True when `name` is one of this kind's stored (inspector) properties.
    pub fn has_property(self, name: &str) -> bool {
        self.spec().properties.iter().any(|p| p.name == name)
    }

    /// Binding for a stored property, a common pseudo-property or a content
    /// property this kind does not store.
    pub fn binding(self, property: &str) -> Option<PropertyBinding> {
        self.spec()
            .properties
            .iter()
            .chain(COMMON_PROPERTIES.iter())
            .find(|p| p.name == property)
            .map(|p| p.binding)
            .or_else(|| self.content_binding(property))
    }

    fn content_binding(self, property: &str) -> Option<PropertyBinding> {
        use ComponentKind::*;
        match (property, self) {
            ("text", Input | Textarea | Select) => Some(PropertyBinding::Value),
            ("text", Image) => Some(PropertyBinding::Attr("alt")),
            ("text", Checkbox) => Some(PropertyBinding::Attr("aria-label")),
            ("text", _) => Some(PropertyBinding::Text),
            ("value", Checkbox) => Some(PropertyBinding::Checked),
            ("value", Image) => Some(PropertyBinding::Attr("src")),
            ("value", _) => Some(PropertyBinding::Text),
            ("checked", _) => Some(PropertyBinding::Checked),
            _ => None,
        }
    }

    pub fn offers_event(self, event: &str) -> bool {
        self.spec().events.contains(&event)
    }

    /// Every addressable property with its runtime descriptor, stored
    /// properties first.
    pub fn runtime_bindings(self) -> Vec<(&'static str, String)> {
        let names = self
            .spec()
            .properties
            .iter()
            .chain(COMMON_PROPERTIES.iter())
            .map(|p| p.name)
            .chain(CONTENT_PROPERTIES.iter().copied());

        let mut out: Vec<(&'static str, String)> = Vec::new();
        for name in names {
            if out.iter().any(|(seen, _)| *seen == name) {
                continue;
            }
            if let Some(binding) = self.binding(name) {
                out.push((name, binding.runtime_spec()));
            }
        }
        out
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Boolean reading of a stored property string.
pub fn is_truthy(value: &str) -> bool {
    let v = value.trim();
    v.eq_ignore_ascii_case("true") || v == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_round_trips_its_name() {
        for kind in ALL_KINDS {
            assert_eq!(ComponentKind::from_name(kind.type_name()), Some(kind));
            assert_eq!(kind.spec().kind, kind);
        }
        assert_eq!(ComponentKind::from_name("slider"), None);
    }

    #[test]
    fn test_serde_name_matches_type_name() {
        for kind in ALL_KINDS {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.type_name()));
        }
    }

    #[test]
    fn test_default_properties_keep_registry_order() {
        let props = ComponentKind::Button.default_properties();
        let keys: Vec<&str> = props.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["text", "color", "background", "fontSize", "enabled"]);
        assert_eq!(props["text"], "Button");
    }

    #[test]
    fn test_markup_templates_carry_id_and_style() {
        for kind in ALL_KINDS {
            let markup = kind.spec().markup;
            assert!(markup.contains("id=\"{{id}}\""), "{} lacks id", kind);
            assert!(markup.contains("style=\"{{style}}\""), "{} lacks style", kind);
            assert!(markup.contains("{{attrs}}"), "{} lacks attrs", kind);
        }
    }

    #[test]
    fn test_binding_falls_back_to_common_properties() {
        assert_eq!(
            ComponentKind::Label.binding("x"),
            Some(PropertyBinding::Px("left"))
        );
        assert_eq!(
            ComponentKind::Label.binding("text"),
            Some(PropertyBinding::Text)
        );
        assert_eq!(
            ComponentKind::Image.binding("text"),
            Some(PropertyBinding::Attr("alt"))
        );
        assert_eq!(
            ComponentKind::Input.binding("text"),
            Some(PropertyBinding::Value)
        );
        assert_eq!(ComponentKind::Panel.binding("text"), Some(PropertyBinding::Text));
        assert_eq!(ComponentKind::Panel.binding("tooltip"), None);
        assert!(!ComponentKind::Label.has_property("x"));
    }

    #[test]
    fn test_element_action_properties_resolve_on_every_kind() {
        use crate::state::{ActionType, ELEMENT_ACTIONS};

        for kind in ALL_KINDS {
            let table = kind.runtime_bindings();
            for action in ELEMENT_ACTIONS {
                let property = match action {
                    ActionType::SetText => "text",
                    ActionType::SetValue | ActionType::ClearValue => "value",
                    ActionType::SetColor => "color",
                    ActionType::SetBackground => "background",
                    ActionType::SetFontSize => "fontSize",
                    ActionType::Move => "x",
                    ActionType::Resize => "width",
                    ActionType::Show | ActionType::Hide | ActionType::ToggleVisibility => "visible",
                    ActionType::Enable | ActionType::Disable => "enabled",
                    ActionType::ToggleCheckbox => "checked",
                    _ => continue,
                };
                let spec = table
                    .iter()
                    .find(|(name, _)| *name == property)
                    .map(|(_, spec)| spec.as_str());
                assert!(spec.is_some(), "{} has no runtime binding for {}", kind, property);
                if matches!(property, "color" | "background" | "fontSize") {
                    let spec = spec.unwrap_or_default();
                    assert!(
                        spec.starts_with("style:") || spec.starts_with("px:"),
                        "{} binds {} to {}",
                        kind,
                        property,
                        spec
                    );
                }
            }
        }
    }

    #[test]
    fn test_runtime_bindings_have_unique_names() {
        for kind in ALL_KINDS {
            let table = kind.runtime_bindings();
            for (i, (name, _)) in table.iter().enumerate() {
                assert!(!table[i + 1..].iter().any(|(other, _)| other == name), "{} repeats {}", kind, name);
            }
        }
        let link = ComponentKind::Link.runtime_bindings();
        assert!(link.contains(&("background", "style:background-color".to_string())));
    }

    #[test]
    fn test_runtime_spec_strings() {
        assert_eq!(PropertyBinding::Attr("src").runtime_spec(), "attr:src");
        assert_eq!(PropertyBinding::Px("font-size").runtime_spec(), "px:font-size");
        assert_eq!(PropertyBinding::Checked.runtime_spec(), "checked");
    }

    #[test]
    fn test_truthy_values() {
        assert!(is_truthy("true"));
        assert!(is_truthy(" TRUE "));
        assert!(is_truthy("1"));
        assert!(!is_truthy("false"));
        assert!(!is_truthy(""));
    }
}
