pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FineractClient, HttpWorkflowGateway};
pub use config::ConnectorConfig;
pub use core::connector::InteropConnector;
pub use core::registration::{PartyRegistrationReconciler, RegistrationSettings};
pub use utils::error::{ConnectorError, Result};
