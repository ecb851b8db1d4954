#![allow(dead_code)]

use ams_interop_connector::config::toml_config::{AmsConfig, TenantConfig, WorkflowConfig};
use std::collections::HashMap;

pub const TENANT: &str = "tn03";

/// `Basic` header for mifos:password.
pub const BASIC_AUTH: &str = "Basic bWlmb3M6cGFzc3dvcmQ=";

pub fn ams_config(base_url: String, version: &str) -> AmsConfig {
    AmsConfig {
        base_url,
        version: version.to_string(),
        timeout_seconds: Some(5),
        tenants: HashMap::from([(
            TENANT.to_string(),
            TenantConfig {
                username: "mifos".to_string(),
                password: "password".to_string(),
            },
        )]),
    }
}

pub fn workflow_config(base_url: String) -> WorkflowConfig {
    WorkflowConfig {
        base_url,
        timeout_seconds: Some(5),
        bearer_token: None,
    }
}
