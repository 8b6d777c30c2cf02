use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::domain::{
    normalize_display_name, normalize_email, Account, AccountRecord, LoginRequest, LoginResponse,
    NewAccount, PasswordChange, ProvisionedAccount,
};
use super::repository::AccountRepository;
use crate::auth::{
    generate_initial_password, validate_password, PasswordHash, Role, Session, Subject,
    TokenIssuer,
};
use crate::error::PortalError;
use crate::ids::AccountId;
use crate::internship::companies::CompanyRepository;
use crate::internship::interns::InternRepository;
use crate::internship::programs::ProgramRepository;
use crate::storage::RepositoryError;

const BAD_CREDENTIALS: &str = "invalid email or password";

pub struct AccountService<R> {
    repository: Arc<R>,
    tokens: Arc<TokenIssuer>,
}

impl<R> AccountService<R>
where
    R: AccountRepository + ProgramRepository + CompanyRepository + InternRepository + 'static,
{
    pub fn new(repository: Arc<R>, tokens: Arc<TokenIssuer>) -> Self {
        Self { repository, tokens }
    }

    pub fn login(
        &self,
        request: LoginRequest,
        now: DateTime<Utc>,
    ) -> Result<LoginResponse, PortalError> {
        let email = request.email.trim().to_ascii_lowercase();
        let Some(stored) = self.repository.fetch_credentials_by_email(&email)? else {
            PasswordHash::decoy().verify(&request.password);
            warn!(email = %email, "login for unknown account");
            return Err(PortalError::Unauthorized(BAD_CREDENTIALS));
        };
        if !stored.password.verify(&request.password) {
            warn!(account = %stored.account.id, "login with wrong password");
            return Err(PortalError::Unauthorized(BAD_CREDENTIALS));
        }
        if !stored.account.active {
            warn!(account = %stored.account.id, "login to deactivated account");
            return Err(PortalError::Unauthorized(BAD_CREDENTIALS));
        }

        let account = stored.account;
        let subject = self.subject_for(&account)?;
        let issued = self.tokens.issue(subject, now)?;
        info!(account = %account.id, role = %account.role, "login succeeded");
        Ok(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            account,
        })
    }

    pub fn me(&self, session: &Session) -> Result<Account, PortalError> {
        self.repository
            .fetch_account(session.account_id)?
            .ok_or(PortalError::NotFound("account"))
    }

    pub fn change_password(
        &self,
        session: &Session,
        change: PasswordChange,
    ) -> Result<(), PortalError> {
        let stored = self
            .repository
            .fetch_credentials(session.account_id)?
            .ok_or(PortalError::NotFound("account"))?;
        if !stored.password.verify(&change.current_password) {
            warn!(account = %session.account_id, "password change with wrong current password");
            return Err(PortalError::Unauthorized("current password is incorrect"));
        }
        validate_password(&change.new_password)?;
        let password = PasswordHash::new(&change.new_password)?;
        self.repository
            .set_account_password(session.account_id, &password)?;
        info!(account = %session.account_id, "password changed");
        Ok(())
    }

    pub fn create(
        &self,
        session: &Session,
        request: NewAccount,
        now: DateTime<Utc>,
    ) -> Result<ProvisionedAccount, PortalError> {
        session.require(&[Role::Coordinator])?;
        let email = normalize_email(&request.email)?;
        let display_name = normalize_display_name(&request.display_name)?;

        let (program_id, company_id) = match request.role {
            Role::Coordinator => (None, None),
            Role::Adviser => {
                let program_id = request
                    .program_id
                    .ok_or_else(|| PortalError::validation("advisers need a program_id"))?;
                if self.repository.fetch_program(program_id)?.is_none() {
                    return Err(PortalError::NotFound("program"));
                }
                (Some(program_id), None)
            }
            Role::Supervisor => {
                let company_id = request
                    .company_id
                    .ok_or_else(|| PortalError::validation("supervisors need a company_id"))?;
                if self.repository.fetch_company(company_id)?.is_none() {
                    return Err(PortalError::NotFound("company"));
                }
                (None, Some(company_id))
            }
            Role::Intern => {
                return Err(PortalError::validation(
                    "intern accounts are created by enrolling the intern",
                ));
            }
        };

        let initial_password = generate_initial_password();
        let record = AccountRecord {
            email,
            display_name,
            role: request.role,
            program_id,
            company_id,
            intern_id: None,
            password: PasswordHash::new(&initial_password)?,
        };
        let account = self
            .repository
            .insert_account(&record, now)
            .map_err(|err| duplicate_email(err, &record.email))?;
        info!(account = %account.id, role = %account.role, "account created");
        Ok(ProvisionedAccount {
            account,
            initial_password,
        })
    }

    pub fn list(&self, session: &Session, role: Option<Role>) -> Result<Vec<Account>, PortalError> {
        session.require(&[Role::Coordinator])?;
        Ok(self.repository.list_accounts(role)?)
    }

    pub fn set_active(
        &self,
        session: &Session,
        id: AccountId,
        active: bool,
    ) -> Result<Account, PortalError> {
        session.require(&[Role::Coordinator])?;
        if id == session.account_id && !active {
            return Err(PortalError::conflict("you cannot deactivate your own account"));
        }
        self.repository
            .set_account_active(id, active)
            .map_err(|err| match err {
                RepositoryError::NotFound => PortalError::NotFound("account"),
                other => other.into(),
            })?;
        info!(account = %id, active, "account activation changed");
        self.repository
            .fetch_account(id)?
            .ok_or(PortalError::NotFound("account"))
    }

    /// Creates the first coordinator from the command line.
    pub fn bootstrap_coordinator(
        &self,
        email: &str,
        display_name: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, PortalError> {
        let email = normalize_email(email)?;
        let display_name = normalize_display_name(display_name)?;
        validate_password(password)?;
        let record = AccountRecord {
            email,
            display_name,
            role: Role::Coordinator,
            program_id: None,
            company_id: None,
            intern_id: None,
            password: PasswordHash::new(password)?,
        };
        let account = self
            .repository
            .insert_account(&record, now)
            .map_err(|err| duplicate_email(err, &record.email))?;
        info!(account = %account.id, "coordinator bootstrapped");
        Ok(account)
    }

    fn subject_for(&self, account: &Account) -> Result<Subject, PortalError> {
        let mut subject = Subject {
            account_id: account.id,
            email: account.email.clone(),
            role: account.role,
            program_id: account.program_id,
            company_id: account.company_id,
            intern_id: account.intern_id,
        };
        if let Some(intern_id) = account.intern_id {
            let intern = self
                .repository
                .fetch_intern(intern_id)?
                .ok_or(PortalError::NotFound("intern"))?;
            subject.program_id = Some(intern.program_id);
            subject.company_id = intern.company_id;
        }
        Ok(subject)
    }
}

fn duplicate_email(err: RepositoryError, email: &str) -> PortalError {
    match err {
        RepositoryError::Conflict => {
            PortalError::conflict(format!("an account for {email} already exists"))
        }
        other => other.into(),
    }
}
