//! Compile and session options.
//!
//! Options arrive from the editor host as JSON (camelCase keys). Every field
//! has a default, so `{}` is a valid options document.

use serde::{Deserialize, Serialize};

use crate::error::{BuilderError, Result};
use crate::state::MAX_INTERVAL_MS;

pub const DEFAULT_LOOP_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompileOptions {
    /// Interval used by the `loop` event when its own interval is unset or invalid.
    pub default_loop_interval_ms: u64,
    /// Maximum number of snapshots retained in the undo stack.
    pub history_limit: usize,
    /// Emit `// scope · event` comments above generated handlers.
    pub emit_comments: bool,
    /// Parse every generated program and log problems.
    pub verify_output: bool,
    /// Overrides the project name as the exported document title.
    pub document_title: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            default_loop_interval_ms: DEFAULT_LOOP_INTERVAL_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
            emit_comments: true,
            verify_output: false,
            document_title: None,
        }
    }
}

impl CompileOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let options: CompileOptions =
            serde_json::from_str(json).map_err(|e| BuilderError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            return Err(BuilderError::InvalidOptions(
                "historyLimit must be at least 1".to_string(),
            ));
        }
        if self.default_loop_interval_ms == 0 || self.default_loop_interval_ms > MAX_INTERVAL_MS {
            return Err(BuilderError::InvalidOptions(format!(
                "defaultLoopIntervalMs must be between 1 and {}",
                MAX_INTERVAL_MS
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let options = CompileOptions::from_json("{}").unwrap();
        assert_eq!(options, CompileOptions::default());
        assert_eq!(options.history_limit, 50);
        assert_eq!(options.default_loop_interval_ms, 1000);
    }

    #[test]
    fn test_partial_document_overrides_fields() {
        let options =
            CompileOptions::from_json(r#"{"historyLimit": 10, "emitComments": false}"#).unwrap();
        assert_eq!(options.history_limit, 10);
        assert!(!options.emit_comments);
        assert_eq!(options.default_loop_interval_ms, 1000);
    }

    #[test]
    fn test_rejects_zero_history_limit() {
        let err = CompileOptions::from_json(r#"{"historyLimit": 0}"#).unwrap_err();
        assert_eq!(err.code(), "E_INVALID_OPTIONS");
    }

    #[test]
    fn test_rejects_out_of_range_loop_interval() {
        for json in [r#"{"defaultLoopIntervalMs": 0}"#, r#"{"defaultLoopIntervalMs": 2147483648}"#] {
            let err = CompileOptions::from_json(json).unwrap_err();
            assert_eq!(err.code(), "E_INVALID_OPTIONS");
        }
        assert!(CompileOptions::from_json(r#"{"defaultLoopIntervalMs": 2147483647}"#).is_ok());
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = CompileOptions::from_json("{historyLimit").unwrap_err();
        assert_eq!(err.code(), "E_INVALID_OPTIONS");
    }
}
