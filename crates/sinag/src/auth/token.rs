use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::Role;
use crate::config::AuthConfig;
use crate::ids::{AccountId, CompanyId, InternId, ProgramId};

/// JWT payload carried by every authenticated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id rendered as a string, as registered claims require.
    pub sub: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<ProgramId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<CompanyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intern_id: Option<InternId>,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn account_id(&self) -> Option<AccountId> {
        self.sub.parse().ok().map(AccountId)
    }
}

/// Identity facts the issuer stamps into a token.
#[derive(Debug, Clone)]
pub struct Subject {
    pub account_id: AccountId,
    pub email: String,
    pub role: Role,
    pub program_id: Option<ProgramId>,
    pub company_id: Option<CompanyId>,
    pub intern_id: Option<InternId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies HS256 session tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            Duration::minutes(config.token_ttl_minutes),
        )
    }

    pub fn issue(
        &self,
        subject: Subject,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: subject.account_id.to_string(),
            email: subject.email,
            role: subject.role,
            program_id: subject.program_id,
            company_id: subject.company_id,
            intern_id: subject.intern_id,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(b"unit-test-secret-unit-test-secret", Duration::minutes(30))
    }

    fn subject() -> Subject {
        Subject {
            account_id: AccountId(7),
            email: "adviser@pup.edu.ph".to_string(),
            role: Role::Adviser,
            program_id: Some(ProgramId(2)),
            company_id: None,
            intern_id: None,
        }
    }

    #[test]
    fn issued_tokens_round_trip_claims() {
        let issuer = issuer();
        let issued = issuer.issue(subject(), Utc::now()).expect("token issues");
        let claims = issuer.verify(&issued.token).expect("token verifies");
        assert_eq!(claims.account_id(), Some(AccountId(7)));
        assert_eq!(claims.role, Role::Adviser);
        assert_eq!(claims.program_id, Some(ProgramId(2)));
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let issuer = issuer();
        let issued = issuer
            .issue(subject(), Utc::now() - Duration::hours(2))
            .expect("token issues");
        assert!(issuer.verify(&issued.token).is_err());
    }

    #[test]
    fn tokens_from_another_secret_are_rejected() {
        let other = TokenIssuer::new(b"a-different-secret-entirely-000000", Duration::minutes(30));
        let issued = other.issue(subject(), Utc::now()).expect("token issues");
        assert!(issuer().verify(&issued.token).is_err());
    }
}
