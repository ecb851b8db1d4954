//! reqwest implementation of [`AccountStore`] for Fineract 1.2 and Fineract CN.

use crate::config::toml_config::{AmsConfig, TenantConfig};
use crate::domain::model::{
    AccountDefinition, AccountDetails, AmsResponse, AmsVersion, Credentials, CurrencyRef,
    PartyIdInfo, SavingsAccountPage, TenantSession, TransferAction,
};
use crate::domain::ports::AccountStore;
use crate::utils::error::{ConnectorError, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

const FINERACT_API: &str = "/fineract-provider/api/v1";
const TENANT_HEADER_12: &str = "Fineract-Platform-TenantId";
const TENANT_HEADER_CN: &str = "X-Tenant-Identifier";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartyFspResponse {
    account_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InteropAccount {
    account_id: String,
    client_id: serde_json::Value,
    #[serde(default)]
    product_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductInstance {
    #[serde(default)]
    account_identifier: Option<String>,
    customer_identifier: String,
    product_identifier: String,
}

#[derive(Debug, Deserialize)]
struct ProductDefinition {
    currency: CurrencyRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    access_token: String,
}

// Fineract 1.2 ids are numbers, CN ids are strings.
fn id_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct FineractClient {
    client: Client,
    base_url: String,
    version: AmsVersion,
    tenants: HashMap<String, TenantConfig>,
}

impl FineractClient {
    pub fn new(config: &AmsConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(timeout));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            version: config.version.parse()?,
            tenants: config.tenants.clone(),
        })
    }

    pub fn version(&self) -> AmsVersion {
        self.version
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn interop_path(&self, path: &str) -> String {
        match self.version {
            AmsVersion::Fineract12 => self.url(&format!("{}/interoperation{}", FINERACT_API, path)),
            AmsVersion::FineractCn => self.url(&format!("/interoperation/v1{}", path)),
        }
    }

    /// Appends each segment to `base`, percent-encoding `/`, `?` and `#` inside a segment.
    fn with_segments(&self, base: String, segments: &[&str]) -> Result<String> {
        let mut url = url::Url::parse(&base).map_err(|e| ConnectorError::InvalidConfigValueError {
            field: "ams.base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        url.path_segments_mut()
            .map_err(|_| ConnectorError::InvalidConfigValueError {
                field: "ams.base_url".to_string(),
                value: self.base_url.clone(),
                reason: "URL cannot be a base".to_string(),
            })?
            .extend(segments);
        Ok(url.into())
    }

    fn party_url(&self, party: &PartyIdInfo) -> Result<String> {
        self.with_segments(
            self.interop_path("/parties"),
            &[party.party_id_type.as_str(), party.party_identifier.as_str()],
        )
    }

    fn authorize(&self, request: RequestBuilder, session: &TenantSession) -> RequestBuilder {
        match &session.credentials {
            Credentials::Basic { username, password } => request
                .basic_auth(username, Some(password))
                .header(TENANT_HEADER_12, &session.tenant_id),
            Credentials::Token { user, access_token } => request
                .header("Authorization", access_token)
                .header("User", user)
                .header(TENANT_HEADER_CN, &session.tenant_id),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<AmsResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        tracing::debug!("AMS response status: {}", status);
        Ok(AmsResponse::new(status, body))
    }

    /// GETs a JSON resource, mapping 404 to `None` and other failures to an error.
    async fn fetch<T: DeserializeOwned>(
        &self,
        session: &TenantSession,
        url: &str,
    ) -> Result<Option<T>> {
        tracing::debug!("Making AMS request to: {}", url);
        let response = self
            .send(self.authorize(self.client.get(url), session))
            .await?;

        if response.status == StatusCode::NOT_FOUND.as_u16() {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(ConnectorError::AmsError {
                status: response.status,
                body: response.body,
            });
        }
        Ok(Some(serde_json::from_str(&response.body)?))
    }

    async fn login_cn(&self, tenant_id: &str, tenant: &TenantConfig) -> Result<TenantSession> {
        let url = self.url("/identity/v1/token");
        let response = self
            .send(
                self.client
                    .post(&url)
                    .query(&[
                        ("grant_type", "password"),
                        ("username", tenant.username.as_str()),
                        ("password", tenant.password.as_str()),
                    ])
                    .header(TENANT_HEADER_CN, tenant_id),
            )
            .await?;

        if !response.is_success() {
            return Err(ConnectorError::AmsError {
                status: response.status,
                body: response.body,
            });
        }
        let login: LoginResponse = serde_json::from_str(&response.body)?;
        Ok(TenantSession {
            tenant_id: tenant_id.to_string(),
            credentials: Credentials::Token {
                user: tenant.username.clone(),
                access_token: login.access_token,
            },
        })
    }
}

#[async_trait]
impl AccountStore for FineractClient {
    async fn login(&self, tenant_id: &str) -> Result<TenantSession> {
        let tenant = self
            .tenants
            .get(tenant_id)
            .ok_or_else(|| ConnectorError::TenantNotFound {
                tenant_id: tenant_id.to_string(),
            })?;

        match self.version {
            AmsVersion::Fineract12 => Ok(TenantSession {
                tenant_id: tenant_id.to_string(),
                credentials: Credentials::Basic {
                    username: tenant.username.clone(),
                    password: tenant.password.clone(),
                },
            }),
            AmsVersion::FineractCn => {
                tracing::info!("Fineract CN oauth request for tenant: {}", tenant_id);
                self.login_cn(tenant_id, tenant).await
            }
        }
    }

    async fn resolve_account_by_identifier(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
    ) -> Result<Option<String>> {
        let found: Option<PartyFspResponse> = self.fetch(session, &self.party_url(party)?).await?;
        Ok(found.and_then(|p| p.account_id))
    }

    async fn list_savings_accounts(
        &self,
        session: &TenantSession,
        offset: usize,
        limit: usize,
    ) -> Result<SavingsAccountPage> {
        let url = self.url(&format!(
            "{}/savingsaccounts?offset={}&limit={}",
            FINERACT_API, offset, limit
        ));
        let page: Option<SavingsAccountPage> = self.fetch(session, &url).await?;
        Ok(page.unwrap_or(SavingsAccountPage {
            total_filtered_records: 0,
            page_items: Vec::new(),
        }))
    }

    async fn get_account(
        &self,
        session: &TenantSession,
        account_id: &str,
    ) -> Result<Option<AccountDetails>> {
        match self.version {
            AmsVersion::Fineract12 => {
                let url = self.with_segments(self.interop_path("/accounts"), &[account_id])?;
                let account: Option<InteropAccount> = self.fetch(session, &url).await?;
                Ok(account.map(|a| AccountDetails {
                    account_id: a.account_id,
                    customer_ref: id_to_string(&a.client_id),
                    definition_ref: a.product_id.as_ref().map(id_to_string),
                }))
            }
            AmsVersion::FineractCn => {
                let url =
                    self.with_segments(self.url("/deposit/v1/instances"), &[account_id])?;
                let instance: Option<ProductInstance> = self.fetch(session, &url).await?;
                Ok(instance.map(|i| AccountDetails {
                    account_id: i.account_identifier.unwrap_or_else(|| account_id.to_string()),
                    customer_ref: i.customer_identifier,
                    definition_ref: Some(i.product_identifier),
                }))
            }
        }
    }

    async fn get_account_definition(
        &self,
        session: &TenantSession,
        definition_id: &str,
    ) -> Result<Option<AccountDefinition>> {
        let base = match self.version {
            AmsVersion::Fineract12 => self.url(&format!("{}/savingsproducts", FINERACT_API)),
            AmsVersion::FineractCn => self.url("/deposit/v1/definitions"),
        };
        let url = self.with_segments(base, &[definition_id])?;
        let definition: Option<ProductDefinition> = self.fetch(session, &url).await?;
        Ok(definition.map(|d| AccountDefinition {
            definition_id: definition_id.to_string(),
            currency: d.currency.code,
        }))
    }

    async fn get_client(
        &self,
        session: &TenantSession,
        client_id: &str,
    ) -> Result<Option<serde_json::Value>> {
        let base = match self.version {
            AmsVersion::Fineract12 => self.url(&format!("{}/clients", FINERACT_API)),
            AmsVersion::FineractCn => self.url("/customer/v1/customers"),
        };
        let url = self.with_segments(base, &[client_id])?;
        self.fetch(session, &url).await
    }

    async fn submit_quote(
        &self,
        session: &TenantSession,
        request: &serde_json::Value,
    ) -> Result<AmsResponse> {
        let url = self.interop_path("/quotes");
        tracing::debug!("Making AMS request to: {}", url);
        self.send(self.authorize(self.client.post(&url), session).json(request))
            .await
    }

    async fn submit_transfer(
        &self,
        session: &TenantSession,
        action: TransferAction,
        request: &serde_json::Value,
    ) -> Result<AmsResponse> {
        let url = self.interop_path("/transfers");
        tracing::debug!("Making AMS request to: {} (action {})", url, action);
        self.send(
            self.authorize(self.client.post(&url), session)
                .query(&[("action", action.as_str())])
                .json(request),
        )
        .await
    }

    async fn bind_identifier(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
        account_id: &str,
    ) -> Result<AmsResponse> {
        let body = serde_json::json!({ "accountId": account_id });
        self.send(
            self.authorize(self.client.post(self.party_url(party)?), session)
                .json(&body),
        )
        .await
    }

    async fn unbind_identifier(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
    ) -> Result<AmsResponse> {
        self.send(self.authorize(self.client.delete(self.party_url(party)?), session))
            .await
    }
}
