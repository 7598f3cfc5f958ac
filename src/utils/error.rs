use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadingListError {
    #[error("File not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("CBL parse error: {message}")]
    ParseError { message: String },

    #[error("Invalid batch file {file}: {message}")]
    BatchFileError { file: String, message: String },

    #[error("{message}")]
    ImportError {
        message: String,
        #[source]
        source: Option<Box<ReadingListError>>,
    },

    #[error("A reading list named '{name}' already exists for this user. Please delete the existing list or rename it before importing.")]
    DuplicateListError { name: String },

    #[error("Issues not found in database: {ids:?}. Use --skip-missing to continue anyway.")]
    MissingIssuesError { ids: Vec<i64> },

    #[error("Integrity conflict: {message}")]
    ConflictError { message: String },

    #[error("{entity} not found: {key}")]
    NotFoundError { entity: String, key: String },

    #[error("User '{user}' may not modify reading list '{list}'")]
    PermissionError { user: String, list: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Import,
    Validation,
    Configuration,
    Storage,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReadingListError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageError {
            message: message.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, key: impl ToString) -> Self {
        Self::NotFoundError {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    /// 將交易中的非預期錯誤包成匯入錯誤，保留原始原因
    pub fn wrap_import(context: &str, cause: ReadingListError) -> Self {
        Self::ImportError {
            message: format!("{}: {}", context, cause),
            source: Some(Box::new(cause)),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FileNotFound { .. } | Self::ParseError { .. } | Self::BatchFileError { .. } => {
                ErrorCategory::Parse
            }
            Self::ImportError { .. }
            | Self::DuplicateListError { .. }
            | Self::MissingIssuesError { .. }
            | Self::ConflictError { .. } => ErrorCategory::Import,
            Self::NotFoundError { .. }
            | Self::PermissionError { .. }
            | Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::StorageError { .. } | Self::SerializationError(_) => ErrorCategory::Storage,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::DuplicateListError { .. } => ErrorSeverity::Low,
            Self::ParseError { .. }
            | Self::BatchFileError { .. }
            | Self::FileNotFound { .. }
            | Self::MissingIssuesError { .. }
            | Self::ConflictError { .. }
            | Self::NotFoundError { .. }
            | Self::PermissionError { .. }
            | Self::ValidationError { .. } => ErrorSeverity::Medium,
            Self::ImportError { .. }
            | Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::StorageError { .. } | Self::SerializationError(_) | Self::IoError(_) => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn is_parse_error(&self) -> bool {
        self.category() == ErrorCategory::Parse
    }

    pub fn is_import_error(&self) -> bool {
        self.category() == ErrorCategory::Import
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "Check the file path and try again",
            Self::ParseError { .. } => {
                "Make sure the file is a well-formed .cbl document with Name and Books elements"
            }
            Self::BatchFileError { .. } => {
                "Make sure the JSON file has 'name' and 'books' fields and every book has an index and database id"
            }
            Self::DuplicateListError { .. } => {
                "Delete or rename the existing reading list before importing"
            }
            Self::MissingIssuesError { .. } => {
                "Add the missing issues to the catalog or rerun with --skip-missing"
            }
            Self::ConflictError { .. } => {
                "Another change touched the same reading list; reload it and try again"
            }
            Self::ImportError { .. } => "Check the logs for the underlying cause and retry the import",
            Self::NotFoundError { .. } => "Verify the identifier exists in the catalog",
            Self::PermissionError { .. } => "Only the owner of a reading list can modify it",
            Self::ValidationError { .. } => "Correct the input values and try again",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Review the configuration file and command-line options",
            Self::StorageError { .. } | Self::SerializationError(_) => {
                "Check that the store file is readable, writable and valid JSON"
            }
            Self::IoError(_) => "Check file permissions and available disk space",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::DuplicateListError { name } => {
                format!("Reading list '{}' already exists", name)
            }
            Self::MissingIssuesError { ids } => {
                format!("{} issue(s) could not be found in the catalog", ids.len())
            }
            Self::ImportError { message, .. } => format!("Import failed: {}", message),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReadingListError>;
