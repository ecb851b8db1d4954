use crate::domain::model::{
    AccountDefinition, AccountDetails, AmsResponse, PartyIdInfo, SavingsAccountPage,
    TenantSession, TransferAction,
};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;

/// Read/write access to the account management system.
///
/// Calls that return an [`AmsResponse`] hand back whatever status the AMS answered with;
/// only transport failures become errors. Lookups translate a missing entity into `None`.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Resolves the tenant and authenticates against it. Unknown tenants yield
    /// [`ConnectorError::TenantNotFound`](crate::utils::error::ConnectorError::TenantNotFound).
    async fn login(&self, tenant_id: &str) -> Result<TenantSession>;

    async fn resolve_account_by_identifier(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
    ) -> Result<Option<String>>;

    async fn list_savings_accounts(
        &self,
        session: &TenantSession,
        offset: usize,
        limit: usize,
    ) -> Result<SavingsAccountPage>;

    async fn get_account(
        &self,
        session: &TenantSession,
        account_id: &str,
    ) -> Result<Option<AccountDetails>>;

    async fn get_account_definition(
        &self,
        session: &TenantSession,
        definition_id: &str,
    ) -> Result<Option<AccountDefinition>>;

    async fn get_client(
        &self,
        session: &TenantSession,
        client_id: &str,
    ) -> Result<Option<serde_json::Value>>;

    async fn submit_quote(
        &self,
        session: &TenantSession,
        request: &serde_json::Value,
    ) -> Result<AmsResponse>;

    async fn submit_transfer(
        &self,
        session: &TenantSession,
        action: TransferAction,
        request: &serde_json::Value,
    ) -> Result<AmsResponse>;

    async fn bind_identifier(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
        account_id: &str,
    ) -> Result<AmsResponse>;

    async fn unbind_identifier(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
    ) -> Result<AmsResponse>;
}

/// Completes a pending step of an external workflow.
#[async_trait]
pub trait WorkflowGateway: Send + Sync {
    async fn complete(&self, job_key: i64, variables: HashMap<String, String>) -> Result<()>;
}
