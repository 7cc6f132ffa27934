use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Source request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Schema error: {message}")]
    SchemaError { message: String },

    #[error("Decode error: {message}")]
    DecodeError { message: String },

    #[error("Source error: {message}")]
    SourceError { message: String },

    #[error("Sink error ({sink}): {message}")]
    SinkError { sink: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': '{value}' ({reason})")]
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
    Network,
    Data,
    Storage,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IngestError {
    pub fn schema(message: impl Into<String>) -> Self {
        IngestError::SchemaError {
            message: message.into(),
        }
    }

    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        IngestError::SinkError {
            sink: sink.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            IngestError::ApiError(_) | IngestError::SourceError { .. } => ErrorCategory::Network,
            IngestError::CsvError(_)
            | IngestError::SerializationError(_)
            | IngestError::SchemaError { .. }
            | IngestError::DecodeError { .. } => ErrorCategory::Data,
            IngestError::IoError(_) | IngestError::SinkError { .. } => ErrorCategory::Storage,
            IngestError::ConfigError { .. }
            | IngestError::InvalidConfigValueError { .. }
            | IngestError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Storage => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            IngestError::ApiError(_) | IngestError::SourceError { .. } => {
                "Check network connectivity and the ThingSpeak channel URL, then retry"
            }
            IngestError::SchemaError { .. } => {
                "Make sure every record is a flat JSON object"
            }
            IngestError::DecodeError { .. } => {
                "Check that the upstream producer writes base64-encoded UTF-8 JSON"
            }
            IngestError::CsvError(_) => "Check the CSV header names and column types",
            IngestError::SerializationError(_) => "Check the record payload is valid JSON",
            IngestError::IoError(_) => "Check the output path exists and is writable",
            IngestError::SinkError { .. } => {
                "Check sink credentials, stream/table names and region"
            }
            IngestError::ConfigError { .. }
            | IngestError::InvalidConfigValueError { .. }
            | IngestError::MissingConfigError { .. } => {
                "Review the command line flags, config file and environment variables"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach the data source: {}", self),
            ErrorCategory::Data => format!("A record could not be processed: {}", self),
            ErrorCategory::Storage => format!("Writing output failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
