use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::utils::error::ConnectorError;

/// Process type marking a request that came in synchronously through the API.
pub const PROCESS_TYPE_API: &str = "api";

/// Variable name under which a rejected transfer's error payload is handed to the workflow engine.
pub const ERROR_INFORMATION: &str = "errorInformation";

/// Highest AMS status still counted as a successful transfer.
pub const TRANSFER_SUCCESS_CEILING: u16 = 202;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AmsVersion {
    #[serde(rename = "1.2")]
    Fineract12,
    #[serde(rename = "cn")]
    FineractCn,
}

impl FromStr for AmsVersion {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1.2" => Ok(AmsVersion::Fineract12),
            "cn" => Ok(AmsVersion::FineractCn),
            other => Err(ConnectorError::InvalidConfigValueError {
                field: "ams.version".to_string(),
                value: other.to_string(),
                reason: "Supported versions: 1.2, cn".to_string(),
            }),
        }
    }
}

impl fmt::Display for AmsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmsVersion::Fineract12 => write!(f, "1.2"),
            AmsVersion::FineractCn => write!(f, "cn"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferAction {
    Prepare,
    Create,
    Release,
}

impl TransferAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferAction::Prepare => "PREPARE",
            TransferAction::Create => "CREATE",
            TransferAction::Release => "RELEASE",
        }
    }
}

impl fmt::Display for TransferAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionRole {
    Payer,
    Payee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InitiatorType {
    Consumer,
    Agent,
    Business,
    Device,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Scenario {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Refund,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionType {
    pub scenario: Scenario,
    pub initiator: TransactionRole,
    pub initiator_type: InitiatorType,
}

impl TransactionType {
    /// Payee-initiated deposit by a consumer.
    pub fn payee_deposit() -> Self {
        Self {
            scenario: Scenario::Deposit,
            initiator: TransactionRole::Payee,
            initiator_type: InitiatorType::Consumer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyIdInfo {
    pub party_id_type: String,
    pub party_identifier: String,
}

impl PartyIdInfo {
    pub fn new(party_id_type: impl Into<String>, party_identifier: impl Into<String>) -> Self {
        Self {
            party_id_type: party_id_type.into(),
            party_identifier: party_identifier.into(),
        }
    }
}

impl fmt::Display for PartyIdInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.party_id_type, self.party_identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub party_id_info: PartyIdInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    #[serde(deserialize_with = "amount_from_string_or_number")]
    pub amount: String,
    pub currency: String,
}

impl Money {
    pub fn new(amount: impl Into<String>, currency: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: currency.into(),
        }
    }
}

// The switch sends amounts as strings, the AMS answers with JSON numbers.
fn amount_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("invalid amount: {}", other))),
    }
}

/// Per-request state threaded through every orchestration step.
#[derive(Debug, Clone)]
pub struct TransactionContext {
    pub transaction_id: String,
    pub tenant_id: String,
    pub party_id_type: String,
    pub party_id: String,
    pub process_type: Option<String>,
    pub transfer_action: TransferAction,
    pub transaction_role: Option<TransactionRole>,
    pub currency: Option<String>,
    pub account_id: Option<String>,
    pub external_account_id: Option<String>,
    pub existing_external_account_id: Option<String>,
    pub job_key: Option<i64>,
    pub continue_processing: bool,
}

impl TransactionContext {
    pub fn new(
        transaction_id: impl Into<String>,
        tenant_id: impl Into<String>,
        party: &PartyIdInfo,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            tenant_id: tenant_id.into(),
            party_id_type: party.party_id_type.clone(),
            party_id: party.party_identifier.clone(),
            process_type: None,
            transfer_action: TransferAction::Create,
            transaction_role: None,
            currency: None,
            account_id: None,
            external_account_id: None,
            existing_external_account_id: None,
            job_key: None,
            continue_processing: true,
        }
    }

    pub fn with_process_type(mut self, process_type: impl Into<String>) -> Self {
        self.process_type = Some(process_type.into());
        self
    }

    pub fn with_job_key(mut self, job_key: i64) -> Self {
        self.job_key = Some(job_key);
        self
    }

    pub fn with_transfer_action(mut self, action: TransferAction) -> Self {
        self.transfer_action = action;
        self
    }

    pub fn party(&self) -> PartyIdInfo {
        PartyIdInfo::new(self.party_id_type.clone(), self.party_id.clone())
    }

    pub fn is_api_call(&self) -> bool {
        self.process_type.as_deref() == Some(PROCESS_TYPE_API)
    }
}

/// Raw status and body of an AMS call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmsResponse {
    pub status: u16,
    pub body: String,
}

impl AmsResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// What the synchronous caller of the connector receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientResponse {
    pub status: u16,
    pub body: String,
}

impl ClientResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json<T: Serialize>(status: u16, value: &T) -> crate::utils::error::Result<Self> {
        Ok(Self::new(status, serde_json::to_string(value)?))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }
}

impl From<AmsResponse> for ClientResponse {
    fn from(response: AmsResponse) -> Self {
        Self::new(response.status, response.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Token { user: String, access_token: String },
}

/// Authenticated handle on a single tenant of the AMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSession {
    pub tenant_id: String,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyRef {
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAccountSummary {
    pub account_no: String,
    #[serde(default)]
    pub external_id: Option<String>,
    pub currency: CurrencyRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsAccountPage {
    #[serde(default)]
    pub total_filtered_records: u64,
    #[serde(default)]
    pub page_items: Vec<SavingsAccountSummary>,
}

/// A single account as seen by either AMS variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDetails {
    pub account_id: String,
    pub customer_ref: String,
    pub definition_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDefinition {
    pub definition_id: String,
    pub currency: String,
}

/// An interoperability identifier bound to an AMS account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountBinding {
    pub account_id: String,
    pub identifier: PartyIdInfo,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferOutcome {
    Success,
    Rejected,
    Escalated,
}

/// Deposit payload posted by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionChannelRequest {
    #[serde(default)]
    pub payer: Option<Party>,
    pub payee: Party,
    pub amount: Money,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
}

/// Quote details supplied by the switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteInput {
    pub quote_id: String,
    pub amount: Money,
    pub transaction_role: TransactionRole,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}

/// Transfer details supplied by the switch or built from a channel request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferInput {
    pub transfer_id: String,
    pub amount: Money,
    pub transaction_role: TransactionRole,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(default)]
    pub fsp_fee: Option<Money>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub expiration: Option<DateTime<Utc>>,
}
