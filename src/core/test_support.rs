//! Recording in-memory collaborators for orchestration tests.

use crate::domain::model::{
    AccountDefinition, AccountDetails, AmsResponse, Credentials, CurrencyRef, PartyIdInfo,
    SavingsAccountPage, SavingsAccountSummary, TenantSession, TransferAction,
};
use crate::domain::ports::{AccountStore, WorkflowGateway};
use crate::utils::error::{ConnectorError, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;

pub const TENANT: &str = "tn03";

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Resolve(PartyIdInfo),
    ListSavings { offset: usize, limit: usize },
    GetAccount(String),
    GetDefinition(String),
    GetClient(String),
    SubmitQuote(serde_json::Value),
    SubmitTransfer(TransferAction, serde_json::Value),
    Bind(PartyIdInfo, String),
    /// The identifier and the account it was bound to when the unbind arrived.
    Unbind(PartyIdInfo, Option<String>),
}

impl StoreCall {
    pub fn is_mutation(&self) -> bool {
        matches!(self, StoreCall::Bind(..) | StoreCall::Unbind(..))
    }
}

pub struct MockAccountStore {
    tenants: HashSet<String>,
    bindings: Mutex<HashMap<PartyIdInfo, String>>,
    accounts: HashMap<String, AccountDetails>,
    definitions: HashMap<String, AccountDefinition>,
    savings: Vec<SavingsAccountSummary>,
    clients: HashMap<String, serde_json::Value>,
    quote_response: AmsResponse,
    transfer_response: AmsResponse,
    bind_response: Option<AmsResponse>,
    unbind_response: Option<AmsResponse>,
    calls: Mutex<Vec<StoreCall>>,
}

impl MockAccountStore {
    pub fn new() -> Self {
        Self {
            tenants: HashSet::from([TENANT.to_string()]),
            bindings: Mutex::new(HashMap::new()),
            accounts: HashMap::new(),
            definitions: HashMap::new(),
            savings: Vec::new(),
            clients: HashMap::new(),
            quote_response: AmsResponse::new(200, "{}"),
            transfer_response: AmsResponse::new(200, "{}"),
            bind_response: None,
            unbind_response: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_binding(self, party: &PartyIdInfo, account_id: &str) -> Self {
        self.bindings
            .try_lock()
            .expect("bindings are not shared yet")
            .insert(party.clone(), account_id.to_string());
        self
    }

    pub fn with_account(
        mut self,
        account_id: &str,
        customer_ref: &str,
        definition_ref: Option<&str>,
    ) -> Self {
        self.accounts.insert(
            account_id.to_string(),
            AccountDetails {
                account_id: account_id.to_string(),
                customer_ref: customer_ref.to_string(),
                definition_ref: definition_ref.map(str::to_string),
            },
        );
        self
    }

    pub fn with_definition(mut self, definition_id: &str, currency: &str) -> Self {
        self.definitions.insert(
            definition_id.to_string(),
            AccountDefinition {
                definition_id: definition_id.to_string(),
                currency: currency.to_string(),
            },
        );
        self
    }

    pub fn with_savings_account(
        mut self,
        account_no: &str,
        external_id: Option<&str>,
        currency: &str,
    ) -> Self {
        self.savings.push(SavingsAccountSummary {
            account_no: account_no.to_string(),
            external_id: external_id.map(str::to_string),
            currency: CurrencyRef {
                code: currency.to_string(),
            },
        });
        self
    }

    pub fn with_client(mut self, client_id: &str, client: serde_json::Value) -> Self {
        self.clients.insert(client_id.to_string(), client);
        self
    }

    pub fn with_quote_response(mut self, response: AmsResponse) -> Self {
        self.quote_response = response;
        self
    }

    pub fn with_transfer_response(mut self, response: AmsResponse) -> Self {
        self.transfer_response = response;
        self
    }

    pub fn with_bind_response(mut self, response: AmsResponse) -> Self {
        self.bind_response = Some(response);
        self
    }

    pub fn with_unbind_response(mut self, response: AmsResponse) -> Self {
        self.unbind_response = Some(response);
        self
    }

    pub async fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().await.clone()
    }

    pub async fn mutations(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|c| c.is_mutation())
            .cloned()
            .collect()
    }

    pub async fn clear_calls(&self) {
        self.calls.lock().await.clear();
    }

    pub async fn bound_account(&self, party: &PartyIdInfo) -> Option<String> {
        self.bindings.lock().await.get(party).cloned()
    }

    async fn record(&self, call: StoreCall) {
        self.calls.lock().await.push(call);
    }
}

pub fn session() -> TenantSession {
    TenantSession {
        tenant_id: TENANT.to_string(),
        credentials: Credentials::Basic {
            username: "mifos".to_string(),
            password: "password".to_string(),
        },
    }
}

#[async_trait]
impl AccountStore for MockAccountStore {
    async fn login(&self, tenant_id: &str) -> Result<TenantSession> {
        if !self.tenants.contains(tenant_id) {
            return Err(ConnectorError::TenantNotFound {
                tenant_id: tenant_id.to_string(),
            });
        }
        Ok(session())
    }

    async fn resolve_account_by_identifier(
        &self,
        _session: &TenantSession,
        party: &PartyIdInfo,
    ) -> Result<Option<String>> {
        self.record(StoreCall::Resolve(party.clone())).await;
        Ok(self.bindings.lock().await.get(party).cloned())
    }

    async fn list_savings_accounts(
        &self,
        _session: &TenantSession,
        offset: usize,
        limit: usize,
    ) -> Result<SavingsAccountPage> {
        self.record(StoreCall::ListSavings { offset, limit }).await;
        Ok(SavingsAccountPage {
            total_filtered_records: self.savings.len() as u64,
            page_items: self.savings.iter().skip(offset).take(limit).cloned().collect(),
        })
    }

    async fn get_account(
        &self,
        _session: &TenantSession,
        account_id: &str,
    ) -> Result<Option<AccountDetails>> {
        self.record(StoreCall::GetAccount(account_id.to_string())).await;
        Ok(self.accounts.get(account_id).cloned())
    }

    async fn get_account_definition(
        &self,
        _session: &TenantSession,
        definition_id: &str,
    ) -> Result<Option<AccountDefinition>> {
        self.record(StoreCall::GetDefinition(definition_id.to_string()))
            .await;
        Ok(self.definitions.get(definition_id).cloned())
    }

    async fn get_client(
        &self,
        _session: &TenantSession,
        client_id: &str,
    ) -> Result<Option<serde_json::Value>> {
        self.record(StoreCall::GetClient(client_id.to_string())).await;
        Ok(self.clients.get(client_id).cloned())
    }

    async fn submit_quote(
        &self,
        _session: &TenantSession,
        request: &serde_json::Value,
    ) -> Result<AmsResponse> {
        self.record(StoreCall::SubmitQuote(request.clone())).await;
        Ok(self.quote_response.clone())
    }

    async fn submit_transfer(
        &self,
        _session: &TenantSession,
        action: TransferAction,
        request: &serde_json::Value,
    ) -> Result<AmsResponse> {
        self.record(StoreCall::SubmitTransfer(action, request.clone()))
            .await;
        Ok(self.transfer_response.clone())
    }

    async fn bind_identifier(
        &self,
        _session: &TenantSession,
        party: &PartyIdInfo,
        account_id: &str,
    ) -> Result<AmsResponse> {
        self.record(StoreCall::Bind(party.clone(), account_id.to_string()))
            .await;
        let response = self
            .bind_response
            .clone()
            .unwrap_or_else(|| AmsResponse::new(200, r#"{"resourceId":1}"#));
        if response.is_success() {
            self.bindings
                .lock()
                .await
                .insert(party.clone(), account_id.to_string());
        }
        Ok(response)
    }

    async fn unbind_identifier(
        &self,
        _session: &TenantSession,
        party: &PartyIdInfo,
    ) -> Result<AmsResponse> {
        let bound_to = self.bindings.lock().await.get(party).cloned();
        self.record(StoreCall::Unbind(party.clone(), bound_to)).await;
        let response = self
            .unbind_response
            .clone()
            .unwrap_or_else(|| AmsResponse::new(200, "{}"));
        if response.is_success() {
            self.bindings.lock().await.remove(party);
        }
        Ok(response)
    }
}

#[derive(Default)]
pub struct MockWorkflowGateway {
    completions: Mutex<Vec<(i64, HashMap<String, String>)>>,
    failure: Option<String>,
}

impl MockWorkflowGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every completion attempt is recorded and then fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub async fn completions(&self) -> Vec<(i64, HashMap<String, String>)> {
        self.completions.lock().await.clone()
    }
}

#[async_trait]
impl WorkflowGateway for MockWorkflowGateway {
    async fn complete(&self, job_key: i64, variables: HashMap<String, String>) -> Result<()> {
        self.completions.lock().await.push((job_key, variables));
        match &self.failure {
            Some(message) => Err(ConnectorError::WorkflowError {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}
