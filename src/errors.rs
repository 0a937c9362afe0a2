use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

// JSON parse errors are data problems; the manifest or config was malformed.
impl From<serde_json::Error> for ErrorDetails {
    fn from(err: serde_json::Error) -> ErrorDetails {
        ErrorDetails {
            layer: ErrorLayer::DataLayer,
            message: err.to_string(),
        }
    }
}

/// Express whether the problem seems to be with what the user asked for or
/// with the source data we were pointed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorLayer {
    /// The request itself is unusable, like a target identifier that is not a
    /// dotted name.
    BadInput,
    /// The sources we were pointed at are missing, unreadable or unparseable.
    DataLayer,
    /// A config file could not be loaded.
    ConfigLayer,
}

/// Payload describing what went wrong for investigation purposes.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ErrorDetails {
    pub layer: ErrorLayer,
    /// Stringified version of the lower level error.
    pub message: String,
}

impl ErrorDetails {
    pub fn new(layer: ErrorLayer, message: impl Into<String>) -> Self {
        ErrorDetails {
            layer,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    /// The target module or package could not be loaded at all.  Fatal.
    #[error("could not import '{target}': {details}")]
    RootResolution {
        target: String,
        details: ErrorDetails,
    },

    /// A submodule discovered while walking a package failed to load.  The
    /// walker logs and skips these.
    #[error("could not import submodule '{module}': {details}")]
    SubUnitResolution {
        module: String,
        details: ErrorDetails,
    },

    /// Discovery worked but found nothing that derives from `Exception`.
    #[error("No Exception subclasses found in '{target}'.")]
    EmptyResult { target: String },

    #[error("bad config: {0}")]
    Config(ErrorDetails),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    pub fn root_resolution(target: &str, layer: ErrorLayer, message: impl Into<String>) -> Self {
        ToolError::RootResolution {
            target: target.to_string(),
            details: ErrorDetails::new(layer, message),
        }
    }

    pub fn sub_unit(module: &str, message: impl Into<String>) -> Self {
        ToolError::SubUnitResolution {
            module: module.to_string(),
            details: ErrorDetails::new(ErrorLayer::DataLayer, message),
        }
    }

    /// Process exit code for this error when it reaches the command line.
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::RootResolution { .. } => 10,
            ToolError::SubUnitResolution { .. } => 10,
            ToolError::EmptyResult { .. } => 1,
            ToolError::Config(_) => 2,
            ToolError::Io(_) => 74,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_exit_codes() {
        let err = ToolError::root_resolution("nope", ErrorLayer::DataLayer, "No module named 'nope'");
        assert_eq!(err.to_string(), "could not import 'nope': No module named 'nope'");
        assert_eq!(err.exit_code(), 10);

        let err = ToolError::EmptyResult {
            target: "pkg".to_string(),
        };
        assert_eq!(err.to_string(), "No Exception subclasses found in 'pkg'.");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_json_errors_are_data_layer() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let details = ErrorDetails::from(json_err);
        assert_eq!(details.layer, ErrorLayer::DataLayer);
    }
}
