use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuoteError {
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("No results found for \"{query}\"")]
    NotFound { query: String },

    #[error("Network failure: {message}")]
    NetworkFailure { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Location unavailable: {message}")]
    LocationUnavailable { message: String },

    #[error("Cannot enter {stage} without: {}", missing.join(", "))]
    InvalidWizardEntry { stage: String, missing: Vec<String> },

    #[error("Action '{action}' is not allowed from the {from} step")]
    InvalidTransition { from: String, action: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Lookup,
    Network,
    Device,
    Wizard,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl QuoteError {
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidInput { .. } => ErrorCategory::Input,
            Self::NotFound { .. } => ErrorCategory::Lookup,
            Self::NetworkFailure { .. } | Self::HttpError(_) => ErrorCategory::Network,
            Self::LocationUnavailable { .. } => ErrorCategory::Device,
            Self::InvalidWizardEntry { .. } | Self::InvalidTransition { .. } => {
                ErrorCategory::Wizard
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    /// None of these are fatal to a wizard run; severity only drives the CLI exit code.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Wizard => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Lookup | ErrorCategory::Device => {
                ErrorSeverity::High
            }
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::InvalidInput { message, .. } => message.clone(),
            Self::NotFound { query } => format!(
                "No results found for \"{}\". Try a different search term.",
                query
            ),
            Self::NetworkFailure { .. } | Self::HttpError(_) => {
                "Error searching for address. Please try again.".to_string()
            }
            Self::LocationUnavailable { message } => message.clone(),
            Self::InvalidWizardEntry { .. } => {
                "Your quote session was incomplete, starting again from service selection."
                    .to_string()
            }
            Self::InvalidTransition { from, action } => {
                format!("Cannot {} while on the {} step.", action, from)
            }
            Self::ConfigError { message } => format!("Configuration problem: {}", message),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value {} is invalid: {}", field, reason)
            }
            Self::MissingConfigError { field } => {
                format!("Configuration value {} is required", field)
            }
            Self::IoError(e) => format!("File system error: {}", e),
            Self::SerializationError(e) => format!("Could not read saved data: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Fill in the highlighted field and try again",
            ErrorCategory::Lookup => "Try a more specific address or pick the point on the map",
            ErrorCategory::Network => "Check your connection and retry the lookup",
            ErrorCategory::Device => "Make sure location services are enabled",
            ErrorCategory::Wizard => "Start the quote again from the first step",
            ErrorCategory::Configuration => "Check the configuration file and CLI arguments",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, QuoteError>;
