//! Output verification.
//!
//! Parses generated program text with oxc and reports syntax errors, the
//! functions declared at the top level, and every identifier referenced.

#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::Allocator;
use oxc_ast::ast::{IdentifierReference, Statement};
use oxc_ast_visit::Visit;
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct ProgramCheck {
    pub syntax_errors: Vec<String>,
    /// Top-level function declarations, in source order.
    pub functions: Vec<String>,
    /// Distinct referenced identifiers, sorted.
    pub references: Vec<String>,
}

impl ProgramCheck {
    pub fn is_valid(&self) -> bool {
        self.syntax_errors.is_empty()
    }

    /// Names from `expected` with no top-level declaration.
    pub fn missing_handlers<'a>(&self, expected: &'a [String]) -> Vec<&'a str> {
        expected
            .iter()
            .filter(|name| !self.functions.contains(*name))
            .map(|name| name.as_str())
            .collect()
    }
}

struct ReferenceCollector {
    references: BTreeSet<String>,
}

impl<'a> Visit<'a> for ReferenceCollector {
    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        self.references.insert(ident.name.to_string());
    }
}

/// Parses `code` as a classic (non-module) script.
pub fn check_program(code: &str) -> ProgramCheck {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(false);
    let ret = Parser::new(&allocator, code, source_type).parse();

    let syntax_errors: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
    if !syntax_errors.is_empty() {
        return ProgramCheck {
            syntax_errors,
            ..Default::default()
        };
    }

    let functions = ret
        .program
        .body
        .iter()
        .filter_map(|stmt| match stmt {
            Statement::FunctionDeclaration(func) => func.id.as_ref().map(|id| id.name.to_string()),
            _ => None,
        })
        .collect();

    let mut collector = ReferenceCollector {
        references: BTreeSet::new(),
    };
    collector.visit_program(&ret.program);

    ProgramCheck {
        syntax_errors,
        functions,
        references: collector.references.into_iter().collect(),
    }
}

/// Checks a generated bundle and logs every problem. Returns true when clean.
pub fn verify_bundle(bundle: &str, handler_names: &[String]) -> bool {
    let check = check_program(bundle);
    for error in &check.syntax_errors {
        warn!(error = %error, "generated program has a syntax error");
    }
    let missing = check.missing_handlers(handler_names);
    for name in &missing {
        warn!(handler = %name, "registered handler is not declared");
    }
    check.is_valid() && missing.is_empty()
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn check_program_native(code: String) -> ProgramCheck {
    check_program(&code)
}
