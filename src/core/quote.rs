use crate::core::resolver::AccountResolver;
use crate::domain::model::{
    AmsResponse, Money, QuoteInput, TenantSession, TransactionContext, TransactionRole,
    TransactionType,
};
use crate::domain::ports::AccountStore;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Quote request in the shape the AMS interoperation API expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalQuoteRequest {
    pub transaction_code: String,
    pub request_code: String,
    pub quote_code: String,
    pub account_id: String,
    pub amount: Money,
    pub transaction_role: TransactionRole,
    pub transaction_type: TransactionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalQuoteResponse {
    pub transaction_code: String,
    pub quote_code: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub fsp_fee: Option<Money>,
    #[serde(default)]
    pub fsp_commission: Option<Money>,
    #[serde(default)]
    pub expiration: Option<String>,
}

/// Quote response in the interoperability shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub transaction_id: String,
    pub quote_id: String,
    pub transfer_amount: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_fsp_fee: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee_fsp_commission: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteResult {
    Accepted(QuoteResponse),
    /// The AMS refused the quote; its answer is passed back untouched.
    Rejected(AmsResponse),
    NoExternalAccount,
}

pub struct QuoteOrchestrator<S: AccountStore> {
    store: Arc<S>,
    resolver: AccountResolver<S>,
}

impl<S: AccountStore> QuoteOrchestrator<S> {
    pub fn new(store: Arc<S>, resolver: AccountResolver<S>) -> Self {
        Self { store, resolver }
    }

    pub async fn send_local_quote(
        &self,
        session: &TenantSession,
        ctx: &mut TransactionContext,
        input: &QuoteInput,
    ) -> Result<QuoteResult> {
        let Some(account_id) = self.resolver.resolve_into(session, ctx).await? else {
            tracing::warn!(
                "No external account for {} (transaction {})",
                ctx.party(),
                ctx.transaction_id
            );
            return Ok(QuoteResult::NoExternalAccount);
        };

        tracing::info!(
            "Sending local quote request for transaction: {}",
            ctx.transaction_id
        );

        ctx.currency = Some(input.amount.currency.clone());
        let request = Self::prepare_request(ctx, &account_id, input);
        let payload = serde_json::to_value(&request)?;
        let response = self.store.submit_quote(session, &payload).await?;

        if !response.is_success() {
            tracing::warn!(
                "Quote {} rejected by AMS with status {}",
                input.quote_id,
                response.status
            );
            return Ok(QuoteResult::Rejected(response));
        }

        let local: LocalQuoteResponse = serde_json::from_str(&response.body)?;
        Ok(QuoteResult::Accepted(QuoteResponse {
            transaction_id: local.transaction_code,
            quote_id: local.quote_code,
            transfer_amount: input.amount.clone(),
            payee_fsp_fee: local.fsp_fee,
            payee_fsp_commission: local.fsp_commission,
            expiration: local.expiration,
        }))
    }

    fn prepare_request(
        ctx: &TransactionContext,
        account_id: &str,
        input: &QuoteInput,
    ) -> LocalQuoteRequest {
        LocalQuoteRequest {
            transaction_code: ctx.transaction_id.clone(),
            request_code: ctx.transaction_id.clone(),
            quote_code: input.quote_id.clone(),
            account_id: account_id.to_string(),
            amount: input.amount.clone(),
            transaction_role: input.transaction_role,
            transaction_type: input.transaction_type.clone(),
            note: input.note.clone(),
            expiration: input.expiration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{session, MockAccountStore, StoreCall};
    use crate::domain::model::PartyIdInfo;

    fn quote_input() -> QuoteInput {
        QuoteInput {
            quote_id: "q-1".to_string(),
            amount: Money::new("100", "RWF"),
            transaction_role: TransactionRole::Payee,
            transaction_type: TransactionType::payee_deposit(),
            note: None,
            expiration: None,
        }
    }

    fn orchestrator(store: Arc<MockAccountStore>) -> QuoteOrchestrator<MockAccountStore> {
        QuoteOrchestrator::new(store.clone(), AccountResolver::new(store))
    }

    #[tokio::test]
    async fn test_quote_accepted_is_translated() {
        let party = PartyIdInfo::new("MSISDN", "250788000111");
        let body = serde_json::json!({
            "transactionCode": "tx-1",
            "quoteCode": "q-1",
            "state": "ACCEPTED",
            "fspFee": {"amount": 1.5, "currency": "RWF"}
        });
        let store = Arc::new(
            MockAccountStore::new()
                .with_binding(&party, "SAV-100")
                .with_quote_response(AmsResponse::new(200, body.to_string())),
        );

        let mut ctx = TransactionContext::new("tx-1", "tn03", &party);
        let result = orchestrator(store.clone())
            .send_local_quote(&session(), &mut ctx, &quote_input())
            .await
            .unwrap();

        let QuoteResult::Accepted(response) = result else {
            panic!("expected accepted quote, got {:?}", result);
        };
        assert_eq!(response.quote_id, "q-1");
        assert_eq!(response.payee_fsp_fee, Some(Money::new("1.5", "RWF")));
        assert_eq!(ctx.currency.as_deref(), Some("RWF"));

        let calls = store.calls().await;
        assert_eq!(calls.len(), 2);
        let StoreCall::SubmitQuote(request) = &calls[1] else {
            panic!("expected a quote submission, got {:?}", calls[1]);
        };
        assert_eq!(request["accountId"], "SAV-100");
        assert_eq!(request["quoteCode"], "q-1");
        assert_eq!(request["transactionRole"], "PAYEE");
    }

    #[tokio::test]
    async fn test_quote_rejection_is_propagated_unchanged() {
        let party = PartyIdInfo::new("MSISDN", "250788000111");
        let rejection = AmsResponse::new(400, r#"{"errorCode":"3100"}"#);
        let store = Arc::new(
            MockAccountStore::new()
                .with_binding(&party, "SAV-100")
                .with_quote_response(rejection.clone()),
        );

        let mut ctx = TransactionContext::new("tx-2", "tn03", &party);
        let result = orchestrator(store)
            .send_local_quote(&session(), &mut ctx, &quote_input())
            .await
            .unwrap();

        assert_eq!(result, QuoteResult::Rejected(rejection));
    }

    #[tokio::test]
    async fn test_quote_without_external_account() {
        let party = PartyIdInfo::new("MSISDN", "250788000999");
        let store = Arc::new(MockAccountStore::new());

        let mut ctx = TransactionContext::new("tx-3", "tn03", &party);
        let result = orchestrator(store.clone())
            .send_local_quote(&session(), &mut ctx, &quote_input())
            .await
            .unwrap();

        assert_eq!(result, QuoteResult::NoExternalAccount);
        assert_eq!(store.calls().await.len(), 1);
    }
}
