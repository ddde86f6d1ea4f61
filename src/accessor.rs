//! PropertyAccessor
//!
//! The seam between compiled actions and the runtime that actually touches
//! elements. The action compiler only ever asks an accessor for expression
//! text, so the emitted program never depends on a concrete rendering API.

use crate::reference::js_string;

/// Produces target-language expressions for reading and writing state.
///
/// `value_expr` arguments are already valid expressions (resolved references
/// or quoted literals), never raw user text.
pub trait PropertyAccessor {
    /// Expression reading `property` of component `component_id`.
    fn read_property(&self, component_id: &str, property: &str) -> String;

    /// Statement writing `value_expr` into `property` of `component_id`.
    fn write_property(&self, component_id: &str, property: &str, value_expr: &str) -> String;

    /// Expression reading the current value of a project variable.
    fn read_variable(&self, name: &str) -> String;

    /// Statement calling a runtime helper with pre-rendered argument expressions.
    fn invoke(&self, helper: &str, args: &[String]) -> String;
}

/// Accessor targeting the `__rt` object defined by the emitted prelude.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeAccessor;

pub const RUNTIME_NAMESPACE: &str = "__rt";

impl PropertyAccessor for RuntimeAccessor {
    fn read_property(&self, component_id: &str, property: &str) -> String {
        format!(
            "{}.getProp({}, {})",
            RUNTIME_NAMESPACE,
            js_string(component_id),
            js_string(property)
        )
    }

    fn write_property(&self, component_id: &str, property: &str, value_expr: &str) -> String {
        format!(
            "{}.setProp({}, {}, {});",
            RUNTIME_NAMESPACE,
            js_string(component_id),
            js_string(property),
            value_expr
        )
    }

    fn read_variable(&self, name: &str) -> String {
        format!("{}.getVar({})", RUNTIME_NAMESPACE, js_string(name))
    }

    fn invoke(&self, helper: &str, args: &[String]) -> String {
        format!("{}.{}({});", RUNTIME_NAMESPACE, helper, args.join(", "))
    }
}
