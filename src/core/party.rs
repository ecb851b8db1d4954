use crate::core::resolver::AccountResolver;
use crate::domain::model::{AmsVersion, TenantSession, TransactionContext};
use crate::domain::ports::AccountStore;
use crate::utils::error::Result;
use serde::Serialize;
use std::sync::Arc;

/// Party information returned to the switch for an identifier lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyDetails {
    pub account_id: String,
    pub client_id: String,
    pub client: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartyLookup {
    Found(PartyDetails),
    NoExternalAccount,
    AccountNotFound { account_id: String },
    ClientNotFound { client_id: String },
}

pub struct PartyLookupService<S: AccountStore> {
    store: Arc<S>,
    resolver: AccountResolver<S>,
    ams_version: AmsVersion,
}

impl<S: AccountStore> PartyLookupService<S> {
    pub fn new(store: Arc<S>, resolver: AccountResolver<S>, ams_version: AmsVersion) -> Self {
        Self {
            store,
            resolver,
            ams_version,
        }
    }

    pub async fn get_party(
        &self,
        session: &TenantSession,
        ctx: &mut TransactionContext,
    ) -> Result<PartyLookup> {
        tracing::info!(
            "Get party information for identifierType: {} with value: {}",
            ctx.party_id_type,
            ctx.party_id
        );

        let Some(account_id) = self.resolver.resolve_into(session, ctx).await? else {
            return Ok(PartyLookup::NoExternalAccount);
        };
        ctx.account_id = Some(account_id.clone());

        let Some(account) = self.store.get_account(session, &account_id).await? else {
            return Ok(PartyLookup::AccountNotFound { account_id });
        };
        // 1.2 links the account to a client id, CN embeds the customer identifier
        tracing::debug!(
            "Account {} belongs to {} (AMS {})",
            account.account_id,
            account.customer_ref,
            self.ams_version
        );

        let client_id = account.customer_ref;
        match self.store.get_client(session, &client_id).await? {
            Some(client) => Ok(PartyLookup::Found(PartyDetails {
                account_id,
                client_id,
                client,
            })),
            None => Ok(PartyLookup::ClientNotFound { client_id }),
        }
    }
}
