//! Action Compiler
//!
//! Turns one `ActionInvocation` into zero or more statements. Dispatch is an
//! exhaustive match on `ActionType`, split first on whether the action has a
//! target. A global action with a target, an element action without one, an
//! unsupported type, or a malformed multi-field value all compile to nothing.
//!
//! Multi-field values (`set_border`, `move`, `resize`, `manipulate_variable`)
//! are split on commas before references are resolved, so a field holding a
//! literal comma is mis-split.

use crate::accessor::PropertyAccessor;
use crate::reference::{compile_value, js_string};
use crate::state::{ActionInvocation, ActionType};
use crate::validate::VARIABLE_OPERATIONS;

pub const BORDER_DEFAULTS: [&str; 4] = ["solid", "1", "#000000", "0"];

pub struct ActionCompiler<'a, A: PropertyAccessor + ?Sized> {
    accessor: &'a A,
}

impl<'a, A: PropertyAccessor + ?Sized> ActionCompiler<'a, A> {
    pub fn new(accessor: &'a A) -> Self {
        Self { accessor }
    }

    pub fn compile(&self, action: &ActionInvocation) -> Vec<String> {
        match action.target_id.as_deref() {
            None => self.compile_global(&action.action_type, &action.raw_value),
            Some(target) => self.compile_element(target, &action.action_type, &action.raw_value),
        }
    }

    fn value(&self, raw: &str) -> String {
        compile_value(raw, self.accessor)
    }

    fn compile_global(&self, action_type: &ActionType, raw: &str) -> Vec<String> {
        match action_type {
            ActionType::Alert => vec![format!("alert({});", self.value(raw))],
            ActionType::CustomAlert => vec![self.accessor.invoke("customAlert", &[self.value(raw)])],
            ActionType::ConsoleLog => vec![format!("console.log({});", self.value(raw))],
            ActionType::Redirect => vec![self.accessor.invoke("redirect", &[self.value(raw)])],
            ActionType::ManipulateVariable => self.compile_manipulation(raw),
            ActionType::SetText
            | ActionType::SetValue
            | ActionType::SetColor
            | ActionType::SetBackground
            | ActionType::SetFontSize
            | ActionType::SetBorder
            | ActionType::Move
            | ActionType::Resize
            | ActionType::Show
            | ActionType::Hide
            | ActionType::ToggleVisibility
            | ActionType::ClearValue
            | ActionType::Focus
            | ActionType::Enable
            | ActionType::Disable
            | ActionType::ToggleCheckbox
            | ActionType::Unsupported(_) => Vec::new(),
        }
    }

    fn compile_element(&self, target: &str, action_type: &ActionType, raw: &str) -> Vec<String> {
        let id = js_string(target);
        let set = |property: &str, value_expr: String| {
            vec![self.accessor.write_property(target, property, &value_expr)]
        };

        match action_type {
            ActionType::SetText => set("text", self.value(raw)),
            ActionType::SetValue => set("value", self.value(raw)),
            ActionType::SetColor => set("color", self.value(raw)),
            ActionType::SetBackground => set("background", self.value(raw)),
            ActionType::SetFontSize => set("fontSize", self.value(raw)),
            ActionType::SetBorder => {
                let fields = split_fields(raw, 4);
                let mut args = vec![id];
                for (i, default) in BORDER_DEFAULTS.iter().enumerate() {
                    let field = fields.get(i).map(|f| f.trim()).filter(|f| !f.is_empty());
                    args.push(self.value(field.unwrap_or(default)));
                }
                vec![self.accessor.invoke("setBorder", &args)]
            }
            ActionType::Move => self.compile_pair(target, raw, ["x", "y"]),
            ActionType::Resize => self.compile_pair(target, raw, ["width", "height"]),
            ActionType::Show => vec![self.accessor.invoke("show", &[id])],
            ActionType::Hide => vec![self.accessor.invoke("hide", &[id])],
            ActionType::ToggleVisibility => vec![self.accessor.invoke("toggle", &[id])],
            ActionType::ClearValue => set("value", js_string("")),
            ActionType::Focus => vec![self.accessor.invoke("focus", &[id])],
            ActionType::Enable => set("enabled", "true".to_string()),
            ActionType::Disable => set("enabled", "false".to_string()),
            ActionType::ToggleCheckbox => vec![self.accessor.invoke("toggleChecked", &[id])],
            ActionType::Alert
            | ActionType::CustomAlert
            | ActionType::ConsoleLog
            | ActionType::Redirect
            | ActionType::ManipulateVariable
            | ActionType::Unsupported(_) => Vec::new(),
        }
    }

    /// `move` and `resize`: one statement per non-empty axis.
    fn compile_pair(&self, target: &str, raw: &str, properties: [&str; 2]) -> Vec<String> {
        split_fields(raw, 2)
            .into_iter()
            .zip(properties)
            .filter(|(field, _)| !field.trim().is_empty())
            .map(|(field, property)| {
                self.accessor
                    .write_property(target, property, &self.value(field.trim()))
            })
            .collect()
    }

    /// `name,operation,value`; the value is resolved and applied at run time.
    fn compile_manipulation(&self, raw: &str) -> Vec<String> {
        let fields: Vec<&str> = raw.splitn(3, ',').collect();
        let [name, operation, operand] = fields.as_slice() else {
            return Vec::new();
        };
        let (name, operation) = (name.trim(), operation.trim());
        if name.is_empty() || !VARIABLE_OPERATIONS.contains(&operation) {
            return Vec::new();
        }
        vec![self.accessor.invoke(
            "updateVar",
            &[js_string(name), js_string(operation), self.value(operand.trim())],
        )]
    }
}

/// Splits on commas into at most `arity` fields; the last keeps any remainder.
fn split_fields(raw: &str, arity: usize) -> Vec<&str> {
    raw.splitn(arity, ',').collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::RuntimeAccessor;

    fn compile(action: ActionInvocation) -> Vec<String> {
        ActionCompiler::new(&RuntimeAccessor).compile(&action)
    }

    #[test]
    fn test_manipulate_variable_add() {
        let out = compile(ActionInvocation::global(
            ActionType::ManipulateVariable,
            "counter,add,1",
        ));
        assert_eq!(out, vec![r#"__rt.updateVar("counter", "add", "1");"#]);
    }

    #[test]
    fn test_manipulate_variable_resolves_operand() {
        let out = compile(ActionInvocation::global(
            ActionType::ManipulateVariable,
            " total , set , <input_1.value>",
        ));
        assert_eq!(
            out,
            vec![r#"__rt.updateVar("total", "set", __rt.getProp("input_1", "value"));"#]
        );
    }

    #[test]
    fn test_malformed_manipulation_compiles_to_nothing() {
        for raw in ["counter", "counter,add", "counter,pow,2", ",add,1"] {
            assert!(compile(ActionInvocation::global(ActionType::ManipulateVariable, raw)).is_empty());
        }
    }

    #[test]
    fn test_global_actions() {
        assert_eq!(
            compile(ActionInvocation::global(ActionType::Alert, "Hi <name>")),
            vec![r#"alert(("Hi " + __rt.getVar("name")));"#]
        );
        assert_eq!(
            compile(ActionInvocation::global(ActionType::ConsoleLog, "<n>")),
            vec![r#"console.log(__rt.getVar("n"));"#]
        );
        assert_eq!(
            compile(ActionInvocation::global(ActionType::Redirect, "https://example.com")),
            vec![r#"__rt.redirect("https://example.com");"#]
        );
        assert_eq!(
            compile(ActionInvocation::global(ActionType::CustomAlert, "done")),
            vec![r#"__rt.customAlert("done");"#]
        );
    }

    #[test]
    fn test_set_text_uses_accessor() {
        assert_eq!(
            compile(ActionInvocation::targeting("label_1", ActionType::SetText, "<input_2.value>")),
            vec![r#"__rt.setProp("label_1", "text", __rt.getProp("input_2", "value"));"#]
        );
    }

    #[test]
    fn test_border_defaults_fill_missing_fields() {
        assert_eq!(
            compile(ActionInvocation::targeting("panel_1", ActionType::SetBorder, "dashed,3")),
            vec![r##"__rt.setBorder("panel_1", "dashed", "3", "#000000", "0");"##]
        );
        assert_eq!(
            compile(ActionInvocation::targeting("panel_1", ActionType::SetBorder, "")),
            vec![r##"__rt.setBorder("panel_1", "solid", "1", "#000000", "0");"##]
        );
    }

    #[test]
    fn test_border_comma_in_field_is_missplit() {
        // rgb(1,2,3) is split positionally; the color field only gets "rgb(1".
        let out = compile(ActionInvocation::targeting(
            "panel_1",
            ActionType::SetBorder,
            "solid,2,rgb(1,2,3),4",
        ));
        assert_eq!(
            out,
            vec![r#"__rt.setBorder("panel_1", "solid", "2", "rgb(1", "2,3),4");"#]
        );
    }

    #[test]
    fn test_move_skips_empty_axis() {
        assert_eq!(
            compile(ActionInvocation::targeting("button_1", ActionType::Move, "10,20")),
            vec![
                r#"__rt.setProp("button_1", "x", "10");"#,
                r#"__rt.setProp("button_1", "y", "20");"#
            ]
        );
        assert_eq!(
            compile(ActionInvocation::targeting("button_1", ActionType::Resize, ",<h>")),
            vec![r#"__rt.setProp("button_1", "height", __rt.getVar("h"));"#]
        );
        assert!(compile(ActionInvocation::targeting("button_1", ActionType::Move, "")).is_empty());
    }

    #[test]
    fn test_fixed_element_actions() {
        let cases = [
            (ActionType::Show, r#"__rt.show("b_1");"#),
            (ActionType::Hide, r#"__rt.hide("b_1");"#),
            (ActionType::ToggleVisibility, r#"__rt.toggle("b_1");"#),
            (ActionType::Focus, r#"__rt.focus("b_1");"#),
            (ActionType::ToggleCheckbox, r#"__rt.toggleChecked("b_1");"#),
            (ActionType::ClearValue, r#"__rt.setProp("b_1", "value", "");"#),
            (ActionType::Enable, r#"__rt.setProp("b_1", "enabled", true);"#),
            (ActionType::Disable, r#"__rt.setProp("b_1", "enabled", false);"#),
        ];
        for (action_type, expected) in cases {
            assert_eq!(
                compile(ActionInvocation::targeting("b_1", action_type, "ignored")),
                vec![expected.to_string()]
            );
        }
    }

    #[test]
    fn test_scope_mismatch_and_unsupported_are_silent() {
        assert!(compile(ActionInvocation::targeting("b_1", ActionType::Alert, "x")).is_empty());
        assert!(compile(ActionInvocation::global(ActionType::Hide, "")).is_empty());
        assert!(compile(ActionInvocation::global(ActionType::from_name("beep"), "")).is_empty());
        assert!(compile(ActionInvocation::targeting("b_1", ActionType::from_name("beep"), "")).is_empty());
    }
}
