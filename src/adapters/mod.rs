// Adapters layer: concrete implementations of the domain ports over HTTP.

pub mod fineract;
pub mod workflow;

pub use fineract::FineractClient;
pub use workflow::HttpWorkflowGateway;
