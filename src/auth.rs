//! Obtaining an access token from a long-lived KSeF token.
//!
//! The exchange is: request a challenge, encrypt `token|timestamp` with the
//! gateway's token key, submit it, wait until the gateway has verified it,
//! then redeem the temporary authentication token for an access token.
use std::fmt;
use std::future::Future;

use chrono::{DateTime, FixedOffset};

use crate::core::KsefError;

#[cfg(feature = "http")]
pub use coordinator::KsefAuthCoordinator;

/// Bearer token for session and query calls.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    valid_until: Option<DateTime<FixedOffset>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            valid_until: None,
        }
    }

    pub fn with_valid_until(mut self, valid_until: Option<DateTime<FixedOffset>>) -> Self {
        self.valid_until = valid_until;
        self
    }

    pub fn as_str(&self) -> &str {
        &self.token
    }

    pub fn valid_until(&self) -> Option<DateTime<FixedOffset>> {
        self.valid_until
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("valid_until", &self.valid_until)
            .finish()
    }
}

/// Exchanges a taxpayer id and KSeF token for an [`AccessToken`].
pub trait Authenticator {
    /// # Errors
    /// [`KsefError::Auth`] when the gateway refuses the credentials.
    fn authenticate(
        &self,
        nip: &str,
        ksef_token: &str,
    ) -> impl Future<Output = Result<AccessToken, KsefError>> + Send;
}

#[cfg(feature = "http")]
mod coordinator {
    use tracing::{debug, info};

    use super::{AccessToken, Authenticator};
    use crate::core::KsefError;
    use crate::crypto::KsefCryptography;
    use crate::gateway::{
        AUTH_IN_PROGRESS_CODE, AUTH_SUCCEEDED_CODE, ContextIdentifier, GatewayError, KsefClient,
        KsefTokenAuthRequest,
    };
    use crate::status::{PollPolicy, poll_until};

    /// Token authentication against the KSeF REST API.
    #[derive(Debug, Clone)]
    pub struct KsefAuthCoordinator {
        client: KsefClient,
        crypto: KsefCryptography,
        policy: PollPolicy,
    }

    impl KsefAuthCoordinator {
        pub fn new(client: KsefClient, crypto: KsefCryptography) -> Self {
            Self {
                client,
                crypto,
                policy: PollPolicy::default(),
            }
        }

        /// Polling used while the gateway verifies the token.
        pub fn with_poll_policy(mut self, policy: PollPolicy) -> Self {
            self.policy = policy;
            self
        }
    }

    impl Authenticator for KsefAuthCoordinator {
        async fn authenticate(&self, nip: &str, ksef_token: &str) -> Result<AccessToken, KsefError> {
            let challenge = self.client.auth_challenge().await.map_err(auth_error)?;
            debug!(challenge = %challenge.challenge, "auth challenge received");

            let encrypted_token = self
                .crypto
                .encrypt_ksef_token(ksef_token, challenge.timestamp)?;
            let request = KsefTokenAuthRequest {
                challenge: challenge.challenge,
                context_identifier: ContextIdentifier::nip(nip),
                encrypted_token,
            };
            let init = self
                .client
                .submit_ksef_token(&request)
                .await
                .map_err(auth_error)?;

            let client = &self.client;
            let reference = init.reference_number.as_str();
            let auth_token = init.authentication_token.token.as_str();
            let status = poll_until(
                self.policy,
                move || client.auth_status(reference, auth_token),
                |s| s.status.code == AUTH_IN_PROGRESS_CODE,
            )
            .await
            .map_err(auth_error)?;

            if status.status.code != AUTH_SUCCEEDED_CODE {
                let mut message = format!("{}: {}", status.status.code, status.status.description);
                if !status.status.details.is_empty() {
                    message.push_str(&format!(" ({})", status.status.details.join(", ")));
                }
                return Err(KsefError::Auth(message));
            }

            let tokens = self.client.redeem_token(auth_token).await.map_err(auth_error)?;
            info!(reference = %init.reference_number, "authenticated");
            Ok(AccessToken::new(tokens.access_token.token)
                .with_valid_until(tokens.access_token.valid_until))
        }
    }

    /// Refusals become [`KsefError::Auth`]; transport failures stay gateway errors.
    fn auth_error(error: GatewayError) -> KsefError {
        match error {
            GatewayError::Unauthorized { .. } | GatewayError::Rejected { .. } => {
                KsefError::Auth(error.to_string())
            }
            other => other.into(),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn refusal_is_an_auth_error() {
            let err = auth_error(GatewayError::Unauthorized {
                status: 401,
                body: "invalid token".into(),
            });
            assert!(matches!(err, KsefError::Auth(ref m) if m.contains("invalid token")));
        }

        #[test]
        fn network_failure_stays_a_gateway_error() {
            let err = auth_error(GatewayError::Network("connection refused".into()));
            assert!(matches!(err, KsefError::Gateway(GatewayError::Network(_))));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_token() {
        let token = AccessToken::new("eyJhbGciOi.secret");
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(token.as_str(), "eyJhbGciOi.secret");
    }
}
