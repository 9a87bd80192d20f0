//! Banking bounded context - what the downstream business-logic service
//! returns and the port used to reach it

pub mod backend;
pub mod error;
pub mod model;

pub use backend::BankingBackend;
#[cfg(test)]
pub use backend::MockBankingBackend;
pub use error::BackendError;
pub use model::*;
