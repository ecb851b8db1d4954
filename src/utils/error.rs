use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConnectorError {
    #[error("Tenant not found: {tenant_id}")]
    TenantNotFound { tenant_id: String },

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Unexpected AMS response ({status}): {body}")]
    AmsError { status: u16, body: String },

    #[error("Workflow engine error: {message}")]
    WorkflowError { message: String },

    #[error("Job {job_key} has already been completed")]
    JobAlreadyCompleted { job_key: i64 },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

impl ConnectorError {
    /// HTTP-style status the synchronous caller sees for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ConnectorError::TenantNotFound { .. } => 404,
            ConnectorError::AmsError { status, .. } => *status,
            ConnectorError::ApiError(e) => e.status().map(|s| s.as_u16()).unwrap_or(502),
            ConnectorError::SerializationError(_) => 400,
            ConnectorError::WorkflowError { .. } => 502,
            ConnectorError::JobAlreadyCompleted { .. } => 409,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConnectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let tenant = ConnectorError::TenantNotFound {
            tenant_id: "unknown".to_string(),
        };
        assert_eq!(tenant.status_code(), 404);
        assert_eq!(tenant.to_string(), "Tenant not found: unknown");

        let ams = ConnectorError::AmsError {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(ams.status_code(), 403);

        let processing = ConnectorError::ProcessingError {
            message: "boom".to_string(),
        };
        assert_eq!(processing.status_code(), 500);
    }
}
