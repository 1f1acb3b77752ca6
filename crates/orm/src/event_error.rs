use thiserror::Error;

/// Failure raised by a lifecycle observer.
///
/// Returned from a "before" hook (`creating`, `updating`, `saving`,
/// `deleting`) it vetoes the write.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    #[error("Validation error: {message}{}", hint_suffix(.hint))]
    Validation {
        message: String,
        hint: Option<String>,
    },
    #[error("Observer error: {message}")]
    Observer { message: String },
    #[error("Event propagation stopped: {reason}")]
    PropagationStopped { reason: String },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref().map(|h| format!(" (hint: {})", h)).unwrap_or_default()
}

impl EventError {
    pub fn validation(message: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
            hint: None,
        }
    }

    pub fn validation_with_hint(message: &str, hint: &str) -> Self {
        Self::Validation {
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    pub fn observer(message: &str) -> Self {
        Self::Observer {
            message: message.to_string(),
        }
    }

    pub fn propagation_stopped(reason: &str) -> Self {
        Self::PropagationStopped {
            reason: reason.to_string(),
        }
    }
}
