use crate::core::registration::RegistrationSettings;
use crate::domain::model::AmsVersion;
use crate::utils::error::{ConnectorError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub ams: AmsConfig,
    pub workflow: WorkflowConfig,
    pub registration: Option<RegistrationConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmsConfig {
    pub base_url: String,
    pub version: String,
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub tenants: HashMap<String, TenantConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
    pub bearer_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    pub page_size: Option<usize>,
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
    pub level: Option<String>,
}

impl ConnectorConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ConnectorError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ConnectorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the value of the environment variable, leaving unknown ones as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConnectorError::ProcessingError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("ams.base_url", &self.ams.base_url)?;
        validation::validate_one_of("ams.version", &self.ams.version, &["1.2", "cn"])?;
        validation::validate_url("workflow.base_url", &self.workflow.base_url)?;

        for (tenant_id, tenant) in &self.ams.tenants {
            validation::validate_non_empty_string(
                &format!("ams.tenants.{}.username", tenant_id),
                &tenant.username,
            )?;
        }

        if let Some(registration) = &self.registration {
            if let Some(page_size) = registration.page_size {
                validation::validate_positive_number("registration.page_size", page_size, 1)?;
            }
            if let Some(max_pages) = registration.max_pages {
                validation::validate_positive_number("registration.max_pages", max_pages, 1)?;
            }
        }

        Ok(())
    }

    pub fn ams_version(&self) -> Result<AmsVersion> {
        self.ams.version.parse()
    }

    pub fn registration_settings(&self) -> Result<RegistrationSettings> {
        let mut settings = RegistrationSettings::new(self.ams_version()?);
        if let Some(registration) = &self.registration {
            if let Some(page_size) = registration.page_size {
                settings.page_size = page_size;
            }
            if let Some(max_pages) = registration.max_pages {
                settings.max_pages = max_pages;
            }
        }
        Ok(settings)
    }

    pub fn json_logging(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}

impl Validate for ConnectorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[ams]
base_url = "https://fineract.example.com"
version = "1.2"
timeout_seconds = 30

[ams.tenants.tn03]
username = "mifos"
password = "password"

[workflow]
base_url = "http://zeebe.example.com:8080"

[registration]
page_size = 200
"#;

    #[test]
    fn test_parse_basic_toml_config() {
        let config = ConnectorConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.ams.base_url, "https://fineract.example.com");
        assert_eq!(config.ams_version().unwrap(), AmsVersion::Fineract12);
        assert_eq!(config.ams.tenants["tn03"].username, "mifos");
        assert!(!config.json_logging());

        let settings = config.registration_settings().unwrap();
        assert_eq!(settings.page_size, 200);
        assert_eq!(settings.max_pages, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_AMS_PASSWORD", "s3cret");

        let toml_content = r#"
[ams]
base_url = "https://fineract.example.com"
version = "cn"

[ams.tenants.tn01]
username = "operator"
password = "${TEST_AMS_PASSWORD}"

[workflow]
base_url = "http://zeebe.example.com"
"#;

        let config = ConnectorConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.ams.tenants["tn01"].password, "s3cret");
        assert_eq!(config.ams_version().unwrap(), AmsVersion::FineractCn);

        std::env::remove_var("TEST_AMS_PASSWORD");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[ams]
base_url = "invalid-url"
version = "1.2"

[workflow]
base_url = "http://zeebe.example.com"
"#;

        let config = ConnectorConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let unsupported = BASIC.replace(r#"version = "1.2""#, r#"version = "2.0""#);
        let config = ConnectorConfig::from_toml_str(&unsupported).unwrap();
        assert!(config.validate().is_err());

        let zero_pages = BASIC.replace("page_size = 200", "page_size = 0");
        let config = ConnectorConfig::from_toml_str(&zero_pages).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = ConnectorConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.workflow.base_url, "http://zeebe.example.com:8080");
    }

    #[test]
    fn test_missing_section_is_a_parse_error() {
        let result = ConnectorConfig::from_toml_str("[ams]\nbase_url = \"http://x\"\n");
        assert!(matches!(
            result,
            Err(ConnectorError::ConfigValidationError { .. })
        ));
    }
}
