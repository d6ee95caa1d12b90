use thiserror::Error;

/// 實體儲存層回報的錯誤
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Email already exists: {email}")]
    DuplicateEmail { email: String },

    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

#[derive(Error, Debug)]
pub enum CrmError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),

    #[error("GraphQL request returned errors: {message}")]
    GraphqlError { message: String },

    #[error("API responded with status {status}")]
    HttpStatusError { status: u16 },

    #[error("Unexpected response: {message}")]
    UnexpectedResponse { message: String },

    #[error("Unknown sort field '{field}' for {entity}")]
    UnknownSortField { entity: &'static str, field: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Transport,
    Storage,
    Configuration,
}

impl CrmError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            CrmError::ApiError(_)
            | CrmError::HttpStatusError { .. }
            | CrmError::GraphqlError { .. }
            | CrmError::UnexpectedResponse { .. }
            | CrmError::SerializationError(_) => ErrorCategory::Transport,
            CrmError::IoError(_) => ErrorCategory::Storage,
            CrmError::StoreError(StoreError::NotFound { .. }) => ErrorCategory::NotFound,
            CrmError::StoreError(StoreError::DuplicateEmail { .. }) => ErrorCategory::Validation,
            CrmError::UnknownSortField { .. } => ErrorCategory::Validation,
            CrmError::ConfigError { .. }
            | CrmError::InvalidConfigValueError { .. }
            | CrmError::ConfigValidationError { .. } => ErrorCategory::Configuration,
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Transport => format!("Could not reach the CRM GraphQL API: {}", self),
            ErrorCategory::Storage => format!("Storage failure: {}", self),
            ErrorCategory::Validation | ErrorCategory::NotFound => self.to_string(),
        }
    }

    /// 程式結束碼，只在啟動失敗時使用
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Transport => 2,
            ErrorCategory::Storage => 3,
            ErrorCategory::Validation | ErrorCategory::NotFound => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, CrmError>;
