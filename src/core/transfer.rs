use crate::core::resolver::AccountResolver;
use crate::domain::model::{
    AmsResponse, Money, TenantSession, TransactionContext, TransactionRole, TransactionType,
    TransferAction, TransferInput, TransferOutcome, ERROR_INFORMATION, TRANSFER_SUCCESS_CEILING,
};
use crate::domain::ports::{AccountStore, WorkflowGateway};
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Transfer request in the shape the AMS interoperation API expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTransferRequest {
    pub transaction_code: String,
    pub transfer_code: String,
    pub account_id: String,
    pub amount: Money,
    pub transaction_role: TransactionRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<TransactionType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fsp_fee: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalTransferResponse {
    pub transaction_code: String,
    #[serde(default)]
    pub transfer_code: Option<String>,
    #[serde(default)]
    pub completed_timestamp: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransferState {
    Received,
    Reserved,
    Committed,
    Aborted,
}

impl From<TransferAction> for TransferState {
    fn from(action: TransferAction) -> Self {
        match action {
            TransferAction::Prepare => TransferState::Reserved,
            TransferAction::Create => TransferState::Committed,
            TransferAction::Release => TransferState::Aborted,
        }
    }
}

/// Transfer response in the interoperability shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub transaction_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<String>,
    pub transfer_state: TransferState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferResult {
    pub outcome: TransferOutcome,
    /// The AMS answer, returned to synchronous callers as-is.
    pub response: AmsResponse,
    /// Interoperability view of a successful saga-step transfer.
    pub transfer: Option<TransferResponse>,
}

impl TransferResult {
    fn no_external_account(ctx: &TransactionContext) -> Self {
        Self {
            outcome: TransferOutcome::Rejected,
            response: AmsResponse::new(
                404,
                format!("No external account registered for {}", ctx.party()),
            ),
            transfer: None,
        }
    }
}

/// Maps an AMS transfer answer onto the interoperability response for saga-step callers.
pub struct TransferResponseProcessor;

impl TransferResponseProcessor {
    pub fn process(ctx: &TransactionContext, response: AmsResponse) -> Result<TransferResult> {
        if !response.is_success() {
            tracing::warn!(
                "Transfer {} on {} side answered with status {}",
                ctx.transaction_id,
                ctx.transfer_action,
                response.status
            );
            return Ok(TransferResult {
                outcome: TransferOutcome::Rejected,
                response,
                transfer: None,
            });
        }

        let local: LocalTransferResponse = serde_json::from_str(&response.body)?;
        let transfer = TransferResponse {
            transaction_id: local.transaction_code,
            transfer_id: local.transfer_code,
            transfer_state: ctx.transfer_action.into(),
            completed_timestamp: local.completed_timestamp,
        };
        Ok(TransferResult {
            outcome: TransferOutcome::Success,
            response,
            transfer: Some(transfer),
        })
    }
}

/// Parses a rejected transfer body as structured error information.
///
/// Bodies that are not a JSON object are wrapped so the workflow always receives an object.
pub fn parse_error_payload(body: &str) -> serde_json::Value {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value @ serde_json::Value::Object(_)) => value,
        _ => serde_json::json!({ "errorDescription": body }),
    }
}

pub struct TransferOrchestrator<S: AccountStore, W: WorkflowGateway> {
    store: Arc<S>,
    workflow: Arc<W>,
    resolver: AccountResolver<S>,
}

impl<S: AccountStore, W: WorkflowGateway> TransferOrchestrator<S, W> {
    pub fn new(store: Arc<S>, workflow: Arc<W>, resolver: AccountResolver<S>) -> Self {
        Self {
            store,
            workflow,
            resolver,
        }
    }

    pub async fn send_transfer(
        &self,
        session: &TenantSession,
        ctx: &mut TransactionContext,
        input: &TransferInput,
    ) -> Result<TransferResult> {
        tracing::info!(
            "Sending transfer with action: {} for transaction: {}",
            ctx.transfer_action,
            ctx.transaction_id
        );

        let Some(account_id) = self.resolver.resolve_into(session, ctx).await? else {
            tracing::warn!("No external account for {}", ctx.party());
            return Ok(TransferResult::no_external_account(ctx));
        };

        ctx.currency = Some(input.amount.currency.clone());
        let request = Self::prepare_request(ctx, &account_id, input);
        let payload = serde_json::to_value(&request)?;
        let response = self
            .store
            .submit_transfer(session, ctx.transfer_action, &payload)
            .await?;

        if ctx.is_api_call() {
            self.classify_api_response(ctx, response).await
        } else {
            TransferResponseProcessor::process(ctx, response)
        }
    }

    async fn classify_api_response(
        &self,
        ctx: &TransactionContext,
        response: AmsResponse,
    ) -> Result<TransferResult> {
        if response.status <= TRANSFER_SUCCESS_CEILING {
            tracing::info!("API call successful. Response Body: {}", response.body);
            return Ok(TransferResult {
                outcome: TransferOutcome::Success,
                response,
                transfer: None,
            });
        }

        let error_msg = format!(
            "Invalid responseCode {} for transfer on {} side, transactionId: {} Message: {}",
            response.status, ctx.transfer_action, ctx.transaction_id, response.body
        );

        tracing::error!("{}", error_msg);

        let outcome = match ctx.job_key {
            Some(job_key) => {
                let error_information = parse_error_payload(&response.body);
                let mut variables = HashMap::new();
                variables.insert(ERROR_INFORMATION.to_string(), error_information.to_string());
                match self.workflow.complete(job_key, variables).await {
                    Ok(()) => TransferOutcome::Escalated,
                    Err(e) => {
                        tracing::error!(
                            "Failed to escalate transfer {} to job {}: {}",
                            ctx.transaction_id,
                            job_key,
                            e
                        );
                        TransferOutcome::Rejected
                    }
                }
            }
            None => TransferOutcome::Rejected,
        };

        Ok(TransferResult {
            outcome,
            response,
            transfer: None,
        })
    }

    fn prepare_request(
        ctx: &TransactionContext,
        account_id: &str,
        input: &TransferInput,
    ) -> LocalTransferRequest {
        LocalTransferRequest {
            transaction_code: ctx.transaction_id.clone(),
            transfer_code: input.transfer_id.clone(),
            account_id: account_id.to_string(),
            amount: input.amount.clone(),
            transaction_role: ctx.transaction_role.unwrap_or(input.transaction_role),
            transaction_type: input.transaction_type.clone(),
            fsp_fee: input.fsp_fee.clone(),
            note: input.note.clone(),
            expiration: input.expiration,
        }
    }
}
