//! Backend service port

use super::error::BackendError;
use super::model::{
    AccountBalance, AccountDetails, AccountStatements, ApplicationStatus, BankUser,
    CreditCardApplication, CreditCardApplicationRequest, HealthStatus, LoanApplication,
    LoanApplicationRequest, TransferReceipt, TransferRequest, UserAccounts, UserProfile,
};
use async_trait::async_trait;

/// Operations offered by the business-logic service.
///
/// Implemented over HTTP by `infrastructure::backend::BackendClient`; handlers
/// only ever see this trait.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BankingBackend: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<BankUser, BackendError>;

    async fn get_user_profile(&self, user_id: &str) -> Result<UserProfile, BackendError>;

    async fn get_user_accounts(&self, user_id: &str) -> Result<UserAccounts, BackendError>;

    async fn get_account(&self, account_id: &str) -> Result<AccountDetails, BackendError>;

    async fn get_account_balance(&self, account_id: &str) -> Result<AccountBalance, BackendError>;

    async fn get_account_statements(
        &self,
        account_id: &str,
    ) -> Result<AccountStatements, BackendError>;

    async fn transfer_funds(&self, request: TransferRequest)
        -> Result<TransferReceipt, BackendError>;

    async fn apply_for_loan(
        &self,
        request: LoanApplicationRequest,
    ) -> Result<LoanApplication, BackendError>;

    async fn apply_for_credit_card(
        &self,
        request: CreditCardApplicationRequest,
    ) -> Result<CreditCardApplication, BackendError>;

    async fn get_application_status(
        &self,
        application_id: &str,
    ) -> Result<ApplicationStatus, BackendError>;

    async fn health_check(&self) -> Result<HealthStatus, BackendError>;
}
