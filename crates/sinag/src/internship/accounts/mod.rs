//! Login accounts: authentication, provisioning and activation.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Account, AccountRecord, LoginRequest, LoginResponse, NewAccount, PasswordChange,
    ProvisionedAccount, StoredAccount,
};
pub use repository::AccountRepository;
pub use router::account_routes;
pub use service::AccountService;
