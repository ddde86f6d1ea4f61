use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("malformed project file: {0}")]
    MalformedProject(#[from] serde_json::Error),
    #[error("invalid project: {0}")]
    InvalidProject(String),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),
    #[error("component '{0}' does not exist")]
    UnknownComponent(String),
    #[error("component '{id}' has no property '{property}'")]
    UnknownProperty { id: String, property: String },
    #[error("invalid variable name '{0}'")]
    InvalidVariableName(String),
    #[error("variable '{0}' does not exist")]
    UnknownVariable(String),
    #[error("invalid {var_type} value for variable '{name}': {reason}")]
    InvalidVariableValue {
        name: String,
        var_type: String,
        reason: String,
    },
    #[error("event '{event}' has no action at index {index}")]
    ActionIndexOutOfRange { event: String, index: usize },
    #[error("event '{0}' is not bound")]
    UnknownEvent(String),
    #[error("an event editing session is already open")]
    EventEditInProgress,
    #[error("no event editing session is open")]
    NoEventEdit,
    #[error("component id counter is exhausted")]
    IdSpaceExhausted,
}

impl BuilderError {
    /// Stable machine-readable code surfaced to the editor UI.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedProject(_) => "E_MALFORMED_PROJECT",
            Self::InvalidProject(_) => "E_INVALID_PROJECT",
            Self::InvalidOptions(_) => "E_INVALID_OPTIONS",
            Self::UnknownComponentType(_) => "E_UNKNOWN_COMPONENT_TYPE",
            Self::UnknownComponent(_) => "E_UNKNOWN_COMPONENT",
            Self::UnknownProperty { .. } => "E_UNKNOWN_PROPERTY",
            Self::InvalidVariableName(_) => "E_INVALID_VARIABLE_NAME",
            Self::UnknownVariable(_) => "E_UNKNOWN_VARIABLE",
            Self::InvalidVariableValue { .. } => "E_INVALID_VARIABLE_VALUE",
            Self::ActionIndexOutOfRange { .. } => "E_ACTION_INDEX",
            Self::UnknownEvent(_) => "E_UNKNOWN_EVENT",
            Self::EventEditInProgress => "E_EVENT_EDIT_OPEN",
            Self::NoEventEdit => "E_NO_EVENT_EDIT",
            Self::IdSpaceExhausted => "E_ID_SPACE_EXHAUSTED",
        }
    }
}

pub type Result<T> = std::result::Result<T, BuilderError>;
