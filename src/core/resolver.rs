use crate::domain::model::{PartyIdInfo, TenantSession, TransactionContext};
use crate::domain::ports::AccountStore;
use crate::utils::error::Result;
use std::sync::Arc;

/// Looks up the AMS account an interoperability identifier is bound to.
pub struct AccountResolver<S: AccountStore> {
    store: Arc<S>,
}

impl<S: AccountStore> Clone for AccountResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: AccountStore> AccountResolver<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the bound account id, or `None` when the identifier is not registered.
    pub async fn resolve(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
    ) -> Result<Option<String>> {
        tracing::info!(
            "Get externalAccount with identifierType: {} with value: {}",
            party.party_id_type,
            party.party_identifier
        );
        self.store.resolve_account_by_identifier(session, party).await
    }

    /// Resolves the context's party and records the result as its external account id.
    pub async fn resolve_into(
        &self,
        session: &TenantSession,
        ctx: &mut TransactionContext,
    ) -> Result<Option<String>> {
        let account_id = self.resolve(session, &ctx.party()).await?;
        ctx.external_account_id = account_id.clone();
        Ok(account_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{session, MockAccountStore, StoreCall};

    #[tokio::test]
    async fn test_resolve_bound_identifier() {
        let party = PartyIdInfo::new("MSISDN", "250788000111");
        let store = Arc::new(MockAccountStore::new().with_binding(&party, "SAV-100"));
        let resolver = AccountResolver::new(store.clone());

        let mut ctx = TransactionContext::new("tx-1", "tn03", &party);
        let account = resolver.resolve_into(&session(), &mut ctx).await.unwrap();

        assert_eq!(account.as_deref(), Some("SAV-100"));
        assert_eq!(ctx.external_account_id.as_deref(), Some("SAV-100"));
        assert_eq!(store.calls().await, vec![StoreCall::Resolve(party)]);
    }

    #[tokio::test]
    async fn test_resolve_unbound_identifier_is_not_an_error() {
        let party = PartyIdInfo::new("MSISDN", "250788000999");
        let store = Arc::new(MockAccountStore::new());
        let resolver = AccountResolver::new(store.clone());

        let account = resolver.resolve(&session(), &party).await.unwrap();

        assert!(account.is_none());
        assert!(store.mutations().await.is_empty());
    }
}
