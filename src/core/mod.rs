pub mod connector;
pub mod party;
pub mod quote;
pub mod registration;
pub mod resolver;
pub mod transfer;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{
    AmsResponse, ClientResponse, PartyIdInfo, TransactionContext, TransferOutcome,
};
pub use crate::domain::ports::{AccountStore, WorkflowGateway};
pub use crate::utils::error::Result;
