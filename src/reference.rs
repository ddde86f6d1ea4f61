//! Reference Resolver
//!
//! String values typed into the event editor may embed references:
//!
//! - `<name>` reads the current value of project variable `name`
//! - `<id.property>` reads `property` from component `id` (split at the first dot)
//!
//! A value that is exactly one reference compiles to a direct read so typed
//! values (numbers, booleans) survive unconverted. Anything else compiles to
//! string concatenation of escaped literals and reads.

use lazy_static::lazy_static;
use regex::Regex;

use crate::accessor::PropertyAccessor;

lazy_static! {
    static ref REFERENCE_RE: Regex = Regex::new(r"<([A-Za-z0-9_.]+?)>").unwrap();
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Variable(String),
    Property {
        component_id: String,
        property: String,
    },
}

impl Reference {
    fn from_body(body: &str) -> Self {
        match body.split_once('.') {
            Some((component_id, property)) => Reference::Property {
                component_id: component_id.to_string(),
                property: property.to_string(),
            },
            None => Reference::Variable(body.to_string()),
        }
    }

    /// The token as it appears in source text.
    pub fn token(&self) -> String {
        match self {
            Reference::Variable(name) => format!("<{}>", name),
            Reference::Property {
                component_id,
                property,
            } => format!("<{}.{}>", component_id, property),
        }
    }

    pub fn to_js<A: PropertyAccessor + ?Sized>(&self, accessor: &A) -> String {
        match self {
            Reference::Variable(name) => accessor.read_variable(name),
            Reference::Property {
                component_id,
                property,
            } => accessor.read_property(component_id, property),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Reference(Reference),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpr {
    Literal(String),
    Direct(Reference),
    Concat(Vec<Segment>),
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION
// ═══════════════════════════════════════════════════════════════════════════════

pub fn resolve(raw: &str) -> ValueExpr {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for caps in REFERENCE_RE.captures_iter(raw) {
        let (Some(whole), Some(body)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > cursor {
            segments.push(Segment::Literal(raw[cursor..whole.start()].to_string()));
        }
        segments.push(Segment::Reference(Reference::from_body(body.as_str())));
        cursor = whole.end();
    }

    if segments.is_empty() {
        return ValueExpr::Literal(raw.to_string());
    }
    if cursor < raw.len() {
        segments.push(Segment::Literal(raw[cursor..].to_string()));
    }

    if segments.len() == 1 {
        if let Some(Segment::Reference(reference)) = segments.pop() {
            return ValueExpr::Direct(reference);
        }
    }
    ValueExpr::Concat(segments)
}

/// All references in `raw`, in source order.
pub fn references(raw: &str) -> Vec<Reference> {
    REFERENCE_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|body| Reference::from_body(body.as_str()))
        .collect()
}

impl ValueExpr {
    pub fn to_js<A: PropertyAccessor + ?Sized>(&self, accessor: &A) -> String {
        match self {
            ValueExpr::Literal(text) => js_string(text),
            ValueExpr::Direct(reference) => reference.to_js(accessor),
            ValueExpr::Concat(segments) => {
                let mut parts: Vec<String> = Vec::with_capacity(segments.len() + 1);
                if matches!(segments.first(), Some(Segment::Reference(_))) {
                    parts.push("\"\"".to_string());
                }
                for segment in segments {
                    parts.push(match segment {
                        Segment::Literal(text) => js_string(text),
                        Segment::Reference(reference) => reference.to_js(accessor),
                    });
                }
                format!("({})", parts.join(" + "))
            }
        }
    }
}

/// Resolves `raw` and renders it in one step.
pub fn compile_value<A: PropertyAccessor + ?Sized>(raw: &str, accessor: &A) -> String {
    resolve(raw).to_js(accessor)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ESCAPING
// ═══════════════════════════════════════════════════════════════════════════════

/// Escapes text for a double-quoted JS string that may sit inside `<script>`.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\'', "\\'")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
        .replace("</", "<\\/")
}

pub fn js_string(s: &str) -> String {
    format!("\"{}\"", escape_js_string(s))
}
