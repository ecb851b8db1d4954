use crate::core::party::{PartyLookup, PartyLookupService};
use crate::core::quote::{QuoteOrchestrator, QuoteResult};
use crate::core::registration::{
    PartyRegistrationReconciler, RegistrationOutcome, RegistrationSettings,
};
use crate::core::resolver::AccountResolver;
use crate::core::transfer::{TransferOrchestrator, TransferResult};
use crate::domain::model::{
    AccountBinding, ClientResponse, PartyIdInfo, QuoteInput, TenantSession,
    TransactionChannelRequest, TransactionContext, TransactionRole, TransactionType,
    TransferAction, TransferInput, PROCESS_TYPE_API,
};
use crate::domain::ports::{AccountStore, WorkflowGateway};
use crate::utils::error::{ConnectorError, Result};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationReply {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    binding: Option<AccountBinding>,
}

/// Entry point composing the orchestrators behind each interoperability route.
///
/// Every operation first logs into the tenant. An unknown tenant short-circuits with a 404
/// carrying the error message and no AMS call is made.
pub struct InteropConnector<S: AccountStore, W: WorkflowGateway> {
    store: Arc<S>,
    quotes: QuoteOrchestrator<S>,
    transfers: TransferOrchestrator<S, W>,
    parties: PartyLookupService<S>,
    registrations: PartyRegistrationReconciler<S>,
}

impl<S: AccountStore, W: WorkflowGateway> InteropConnector<S, W> {
    pub fn new(store: Arc<S>, workflow: Arc<W>, settings: RegistrationSettings) -> Self {
        let resolver = AccountResolver::new(store.clone());
        Self {
            quotes: QuoteOrchestrator::new(store.clone(), resolver.clone()),
            transfers: TransferOrchestrator::new(store.clone(), workflow, resolver.clone()),
            parties: PartyLookupService::new(
                store.clone(),
                resolver.clone(),
                settings.ams_version,
            ),
            registrations: PartyRegistrationReconciler::new(store.clone(), resolver, settings),
            store,
        }
    }

    async fn login(&self, tenant_id: &str) -> Result<std::result::Result<TenantSession, ClientResponse>> {
        tracing::info!("Login request for tenant: {}", tenant_id);
        match self.store.login(tenant_id).await {
            Ok(session) => Ok(Ok(session)),
            Err(e @ ConnectorError::TenantNotFound { .. }) => {
                tracing::warn!("{}", e);
                Ok(Err(ClientResponse::not_found(e.to_string())))
            }
            Err(e) => Err(e),
        }
    }

    /// Payee-initiated deposit posted directly by a channel.
    pub async fn deposit(
        &self,
        tenant_id: &str,
        request: TransactionChannelRequest,
    ) -> Result<ClientResponse> {
        let (mut ctx, input) = prepare_deposit(tenant_id, request);
        tracing::info!(
            "Deposit call for {} (transaction {})",
            ctx.party(),
            ctx.transaction_id
        );
        let session = match self.login(tenant_id).await? {
            Ok(session) => session,
            Err(response) => return Ok(response),
        };

        let result = self
            .transfers
            .send_transfer(&session, &mut ctx, &input)
            .await?;
        Ok(result.response.into())
    }

    /// Transfer step issued by the switch or a workflow.
    pub async fn send_transfer(
        &self,
        ctx: &mut TransactionContext,
        input: &TransferInput,
    ) -> Result<ClientResponse> {
        let session = match self.login(&ctx.tenant_id.clone()).await? {
            Ok(session) => session,
            Err(response) => return Ok(response),
        };

        let result = self.transfers.send_transfer(&session, ctx, input).await?;
        transfer_reply(result)
    }

    pub async fn send_quote(
        &self,
        ctx: &mut TransactionContext,
        input: &QuoteInput,
    ) -> Result<ClientResponse> {
        let session = match self.login(&ctx.tenant_id.clone()).await? {
            Ok(session) => session,
            Err(response) => return Ok(response),
        };

        match self.quotes.send_local_quote(&session, ctx, input).await? {
            QuoteResult::Accepted(quote) => ClientResponse::json(200, &quote),
            QuoteResult::Rejected(response) => Ok(response.into()),
            QuoteResult::NoExternalAccount => Ok(ClientResponse::not_found(format!(
                "No external account registered for {}",
                ctx.party()
            ))),
        }
    }

    pub async fn get_party(&self, tenant_id: &str, party: &PartyIdInfo) -> Result<ClientResponse> {
        let mut ctx = TransactionContext::new(Uuid::new_v4().to_string(), tenant_id, party);
        let session = match self.login(tenant_id).await? {
            Ok(session) => session,
            Err(response) => return Ok(response),
        };

        match self.parties.get_party(&session, &mut ctx).await? {
            PartyLookup::Found(details) => ClientResponse::json(200, &details),
            PartyLookup::NoExternalAccount => Ok(ClientResponse::not_found(format!(
                "No external account registered for {}",
                party
            ))),
            PartyLookup::AccountNotFound { account_id } => Ok(ClientResponse::not_found(
                format!("Account {} not found", account_id),
            )),
            PartyLookup::ClientNotFound { client_id } => Ok(ClientResponse::not_found(format!(
                "Client {} not found",
                client_id
            ))),
        }
    }

    pub async fn register_party(
        &self,
        tenant_id: &str,
        party: &PartyIdInfo,
        account: &str,
    ) -> Result<ClientResponse> {
        let mut ctx = TransactionContext::new(Uuid::new_v4().to_string(), tenant_id, party);
        let session = match self.login(tenant_id).await? {
            Ok(session) => session,
            Err(response) => return Ok(response),
        };

        let report = self
            .registrations
            .register_party(&session, &mut ctx, account)
            .await?;
        tracing::info!("{}", report.message());

        match &report.outcome {
            RegistrationOutcome::Rejected(response) => Ok(response.clone().into()),
            _ => ClientResponse::json(
                report.status_code(),
                &RegistrationReply {
                    message: report.message(),
                    binding: report.binding(),
                },
            ),
        }
    }
}

fn transfer_reply(result: TransferResult) -> Result<ClientResponse> {
    match result.transfer {
        Some(transfer) => ClientResponse::json(result.response.status, &transfer),
        None => Ok(result.response.into()),
    }
}

/// Builds the context and transfer for a payee-initiated deposit.
pub fn prepare_deposit(
    tenant_id: &str,
    mut request: TransactionChannelRequest,
) -> (TransactionContext, TransferInput) {
    let transaction_id = Uuid::new_v4().to_string();
    request.transaction_type = Some(TransactionType::payee_deposit());

    let mut ctx = TransactionContext::new(
        transaction_id.clone(),
        tenant_id,
        &request.payee.party_id_info,
    )
    .with_process_type(PROCESS_TYPE_API)
    .with_transfer_action(TransferAction::Create);
    ctx.transaction_role = Some(TransactionRole::Payee);

    let input = TransferInput {
        transfer_id: transaction_id,
        amount: request.amount,
        transaction_role: TransactionRole::Payee,
        transaction_type: request.transaction_type,
        fsp_fee: None,
        note: request.note,
        expiration: None,
    };
    (ctx, input)
}
