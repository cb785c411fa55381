use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("unknown event action `{value}`")]
    UnknownAction { value: String },
    #[error("post snapshot could not be encoded: {message}")]
    Snapshot { message: String },
}

impl DomainError {
    pub fn unknown_action(value: impl Into<String>) -> Self {
        Self::UnknownAction {
            value: value.into(),
        }
    }

    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }
}
