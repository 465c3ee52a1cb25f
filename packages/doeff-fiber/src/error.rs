//! Error types for the hub.

use thiserror::Error;

use crate::fault::Fault;
use crate::ids::ContextId;

/// Infrastructure failures, as opposed to faults raised by context code.
///
/// Converts into a [`Fault`] so entries can propagate it with `?`.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("unknown context {context}")]
    UnknownContext { context: ContextId },
    #[error("context {context} belongs to another hub")]
    ForeignContext { context: ContextId },
    #[error("invalid hub configuration: {message}")]
    InvalidConfig { message: String },
    #[error("failed to allocate a {size}-byte stack for {context}")]
    StackAllocation {
        context: ContextId,
        size: usize,
        #[source]
        source: std::io::Error,
    },
}

impl HubError {
    pub fn unknown_context(context: ContextId) -> Self {
        HubError::UnknownContext { context }
    }

    pub fn foreign_context(context: ContextId) -> Self {
        HubError::ForeignContext { context }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        HubError::InvalidConfig {
            message: message.into(),
        }
    }

    pub fn stack_allocation(context: ContextId, size: usize, source: std::io::Error) -> Self {
        HubError::StackAllocation {
            context,
            size,
            source,
        }
    }
}

impl From<HubError> for Fault {
    fn from(err: HubError) -> Self {
        match err {
            HubError::StackAllocation { .. } => Fault::resource(err.to_string()),
            other => Fault::invalid_argument(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::FaultKind;
    use crate::ids::HubId;

    #[test]
    fn test_error_display() {
        let id = ContextId::new(HubId(3), 5);
        let err = HubError::unknown_context(id);
        assert_eq!(err.to_string(), "unknown context context#3.5");

        let err = HubError::invalid_config("stack_size too small");
        assert!(err.to_string().contains("stack_size too small"));
    }

    #[test]
    fn test_error_into_fault() {
        let id = ContextId::new(HubId(1), 2);
        let fault: Fault = HubError::foreign_context(id).into();
        assert!(fault.is(&FaultKind::INVALID_ARGUMENT));

        let io = std::io::Error::new(std::io::ErrorKind::OutOfMemory, "mmap failed");
        let fault: Fault = HubError::stack_allocation(id, 4096, io).into();
        assert!(fault.is(&FaultKind::RESOURCE));
        assert!(fault.message().unwrap_or_default().contains("4096-byte stack"));
    }
}
