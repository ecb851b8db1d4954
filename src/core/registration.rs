//! Reconciles the binding between an interoperability identifier and an AMS account.
//!
//! A registration request names an identifier and the account it should point at. The
//! reconciler reads the target account, looks up where the identifier currently points and
//! converges with at most one unbind followed by one bind:
//!
//! | current binding          | decision          | mutations            |
//! |--------------------------|-------------------|----------------------|
//! | none                     | `Unbound`         | bind                 |
//! | another account          | `BoundElsewhere`  | unbind, then bind    |
//! | the target account       | `BoundHere`       | none                 |
//!
//! With AMS 1.2 the target is located by scanning the tenant's savings accounts page by page
//! for a matching account number. That scan is O(n) in the number of accounts of the tenant
//! and is capped at `max_pages` pages.

use crate::core::resolver::AccountResolver;
use crate::domain::model::{
    AccountBinding, AmsResponse, AmsVersion, PartyIdInfo, TenantSession, TransactionContext,
};
use crate::domain::ports::AccountStore;
use crate::utils::error::Result;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationSettings {
    pub ams_version: AmsVersion,
    pub page_size: usize,
    pub max_pages: usize,
}

impl RegistrationSettings {
    pub fn new(ams_version: AmsVersion) -> Self {
        Self {
            ams_version,
            page_size: 100,
            max_pages: 50,
        }
    }
}

/// The account an identifier should end up bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetAccount {
    /// Id the interoperation API knows the account by.
    pub account_id: String,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationDecision {
    Unbound,
    BoundElsewhere { current_account_id: String },
    BoundHere,
}

impl RegistrationDecision {
    pub fn decide(current: Option<&str>, target: &TargetAccount) -> Self {
        match current {
            None => RegistrationDecision::Unbound,
            Some(account_id) if account_id != target.account_id => {
                RegistrationDecision::BoundElsewhere {
                    current_account_id: account_id.to_string(),
                }
            }
            Some(_) => RegistrationDecision::BoundHere,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    NewlyRegistered(AmsResponse),
    Rebound(AmsResponse),
    AlreadyRegistered,
    /// The AMS refused the unbind or bind call; the refusal is passed back unchanged.
    Rejected(AmsResponse),
    AccountNotFound,
}

/// The single result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationReport {
    pub party: PartyIdInfo,
    pub target: Option<TargetAccount>,
    pub decision: Option<RegistrationDecision>,
    pub outcome: RegistrationOutcome,
}

impl RegistrationReport {
    pub fn status_code(&self) -> u16 {
        match &self.outcome {
            RegistrationOutcome::NewlyRegistered(r) | RegistrationOutcome::Rebound(r) => r.status,
            RegistrationOutcome::AlreadyRegistered => 200,
            RegistrationOutcome::Rejected(r) => r.status,
            RegistrationOutcome::AccountNotFound => 404,
        }
    }

    pub fn message(&self) -> String {
        match &self.outcome {
            RegistrationOutcome::NewlyRegistered(_) => format!("{} newly registered", self.party),
            RegistrationOutcome::Rebound(_) => {
                format!("{} moved to the requested account", self.party)
            }
            RegistrationOutcome::AlreadyRegistered => {
                format!("{} already registered", self.party)
            }
            RegistrationOutcome::Rejected(r) => r.body.clone(),
            RegistrationOutcome::AccountNotFound => "Account not found".to_string(),
        }
    }

    /// The binding that holds after a successful pass.
    pub fn binding(&self) -> Option<AccountBinding> {
        match (&self.outcome, &self.target) {
            (
                RegistrationOutcome::NewlyRegistered(_)
                | RegistrationOutcome::Rebound(_)
                | RegistrationOutcome::AlreadyRegistered,
                Some(target),
            ) => Some(AccountBinding {
                account_id: target.account_id.clone(),
                identifier: self.party.clone(),
                currency: target.currency.clone(),
            }),
            _ => None,
        }
    }
}

pub struct PartyRegistrationReconciler<S: AccountStore> {
    store: Arc<S>,
    resolver: AccountResolver<S>,
    settings: RegistrationSettings,
}

impl<S: AccountStore> PartyRegistrationReconciler<S> {
    pub fn new(store: Arc<S>, resolver: AccountResolver<S>, settings: RegistrationSettings) -> Self {
        Self {
            store,
            resolver,
            settings,
        }
    }

    /// Binds the context's identifier to `account`, converging from whatever binding holds.
    pub async fn register_party(
        &self,
        session: &TenantSession,
        ctx: &mut TransactionContext,
        account: &str,
    ) -> Result<RegistrationReport> {
        let party = ctx.party();
        tracing::info!(
            "Register party with type: {} identifier: {} account {}",
            party.party_id_type,
            party.party_identifier,
            account
        );
        ctx.continue_processing = true;

        let target = match self.settings.ams_version {
            AmsVersion::Fineract12 => self.find_savings_account(session, ctx, account).await?,
            AmsVersion::FineractCn => self.find_deposit_instance(session, ctx, account).await?,
        };
        let Some(target) = target else {
            tracing::warn!("Account {} not found for tenant {}", account, ctx.tenant_id);
            ctx.continue_processing = false;
            return Ok(RegistrationReport {
                party,
                target: None,
                decision: None,
                outcome: RegistrationOutcome::AccountNotFound,
            });
        };
        ctx.currency = Some(target.currency.clone());

        let current = self.resolver.resolve_into(session, ctx).await?;
        let decision = RegistrationDecision::decide(current.as_deref(), &target);
        ctx.continue_processing = false;

        let outcome = match &decision {
            RegistrationDecision::Unbound => {
                let response = self.add_binding(session, &party, &target).await?;
                if response.is_success() {
                    RegistrationOutcome::NewlyRegistered(response)
                } else {
                    RegistrationOutcome::Rejected(response)
                }
            }
            RegistrationDecision::BoundElsewhere { current_account_id } => {
                let removed = self
                    .remove_binding(session, &party, current_account_id)
                    .await?;
                if !removed.is_success() {
                    RegistrationOutcome::Rejected(removed)
                } else {
                    let response = self.add_binding(session, &party, &target).await?;
                    if response.is_success() {
                        RegistrationOutcome::Rebound(response)
                    } else {
                        RegistrationOutcome::Rejected(response)
                    }
                }
            }
            RegistrationDecision::BoundHere => {
                tracing::info!("{} already registered to {}", party, target.account_id);
                RegistrationOutcome::AlreadyRegistered
            }
        };

        Ok(RegistrationReport {
            party,
            target: Some(target),
            decision: Some(decision),
            outcome,
        })
    }

    // AMS 1.2: the caller names the account number; the interop id is its external id.
    async fn find_savings_account(
        &self,
        session: &TenantSession,
        ctx: &mut TransactionContext,
        account_no: &str,
    ) -> Result<Option<TargetAccount>> {
        let page_size = self.settings.page_size.max(1);
        for page in 0..self.settings.max_pages {
            let offset = page * page_size;
            let accounts = self
                .store
                .list_savings_accounts(session, offset, page_size)
                .await?;
            let scanned = offset + accounts.page_items.len();

            if let Some(found) = accounts
                .page_items
                .into_iter()
                .find(|sa| sa.account_no == account_no)
            {
                ctx.account_id = Some(found.account_no.clone());
                let Some(external_id) = found.external_id.filter(|id| !id.trim().is_empty())
                else {
                    tracing::warn!(
                        "Savings account {} has no external id and cannot be bound",
                        found.account_no
                    );
                    return Ok(None);
                };
                ctx.existing_external_account_id = Some(external_id.clone());
                return Ok(Some(TargetAccount {
                    account_id: external_id,
                    currency: found.currency.code,
                }));
            }

            if scanned as u64 >= accounts.total_filtered_records || scanned == offset {
                return Ok(None);
            }
        }

        tracing::warn!(
            "Stopped scanning savings accounts after {} pages without finding {}",
            self.settings.max_pages,
            account_no
        );
        Ok(None)
    }

    // AMS CN: the account is addressed directly, its currency lives on the product definition.
    async fn find_deposit_instance(
        &self,
        session: &TenantSession,
        ctx: &mut TransactionContext,
        account_id: &str,
    ) -> Result<Option<TargetAccount>> {
        ctx.account_id = Some(account_id.to_string());
        let Some(instance) = self.store.get_account(session, account_id).await? else {
            return Ok(None);
        };
        let Some(definition_id) = instance.definition_ref else {
            return Ok(None);
        };
        let Some(definition) = self
            .store
            .get_account_definition(session, &definition_id)
            .await?
        else {
            return Ok(None);
        };

        Ok(Some(TargetAccount {
            account_id: instance.account_id,
            currency: definition.currency,
        }))
    }

    async fn add_binding(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
        target: &TargetAccount,
    ) -> Result<AmsResponse> {
        tracing::debug!("Binding {} to account {}", party, target.account_id);
        self.store
            .bind_identifier(session, party, &target.account_id)
            .await
    }

    async fn remove_binding(
        &self,
        session: &TenantSession,
        party: &PartyIdInfo,
        current_account_id: &str,
    ) -> Result<AmsResponse> {
        tracing::debug!("Removing {} from account {}", party, current_account_id);
        self.store.unbind_identifier(session, party).await
    }
}
