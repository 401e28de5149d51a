//! reqwest client for the KSeF 2.0 REST API.
use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::*;
use super::{GatewayError, KsefGateway};
use crate::config::Settings;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Records per metadata page; a query by registry number needs one.
const METADATA_PAGE_SIZE: u32 = 10;

/// HTTP client for one KSeF environment.
///
/// # Examples
/// ```rust,no_run
/// use ksef_minimal::gateway::KsefClient;
///
/// let client = KsefClient::new("https://ksef-test.mf.gov.pl/api/v2")?;
/// # let _ = client;
/// # Ok::<(), ksef_minimal::gateway::GatewayError>(())
/// ```
#[derive(Debug, Clone)]
pub struct KsefClient {
    http: Client,
    base_url: String,
}

impl KsefClient {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("ksef-minimal/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, GatewayError> {
        Self::new(settings.api_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /auth/challenge`
    pub async fn auth_challenge(&self) -> Result<AuthChallengeResponse, GatewayError> {
        let request = self.http.post(self.endpoint("auth/challenge"));
        read_json(send(request, "auth/challenge").await?).await
    }

    /// `POST /auth/ksef-token`
    pub async fn submit_ksef_token(
        &self,
        request: &KsefTokenAuthRequest,
    ) -> Result<AuthInitResponse, GatewayError> {
        let builder = self.http.post(self.endpoint("auth/ksef-token")).json(request);
        read_json(send(builder, "auth/ksef-token").await?).await
    }

    /// `GET /auth/{referenceNumber}`, authorized with the temporary
    /// authentication token.
    pub async fn auth_status(
        &self,
        reference_number: &str,
        authentication_token: &str,
    ) -> Result<AuthStatusResponse, GatewayError> {
        let path = format!("auth/{reference_number}");
        let builder = self
            .http
            .get(self.endpoint(&path))
            .bearer_auth(authentication_token);
        read_json(send(builder, &path).await?).await
    }

    /// `POST /auth/token/redeem`
    pub async fn redeem_token(
        &self,
        authentication_token: &str,
    ) -> Result<AuthTokensResponse, GatewayError> {
        let builder = self
            .http
            .post(self.endpoint("auth/token/redeem"))
            .bearer_auth(authentication_token);
        read_json(send(builder, "auth/token/redeem").await?).await
    }

    /// `GET /security/public-key-certificates`
    pub async fn public_key_certificates(
        &self,
    ) -> Result<Vec<PublicKeyCertificate>, GatewayError> {
        let builder = self
            .http
            .get(self.endpoint("security/public-key-certificates"));
        read_json(send(builder, "security/public-key-certificates").await?).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl KsefGateway for KsefClient {
    async fn open_online_session(
        &self,
        request: &OpenOnlineSessionRequest,
        access_token: &str,
    ) -> Result<OpenOnlineSessionResponse, GatewayError> {
        let builder = self
            .http
            .post(self.endpoint("sessions/online"))
            .bearer_auth(access_token)
            .json(request);
        read_json(send(builder, "sessions/online").await?).await
    }

    async fn send_online_session_invoice(
        &self,
        session_reference: &str,
        request: &SendInvoiceRequest,
        access_token: &str,
    ) -> Result<SendInvoiceResponse, GatewayError> {
        let path = format!("sessions/online/{session_reference}/invoices");
        let builder = self
            .http
            .post(self.endpoint(&path))
            .bearer_auth(access_token)
            .json(request);
        read_json(send(builder, &path).await?).await
    }

    async fn session_invoice_status(
        &self,
        session_reference: &str,
        invoice_reference: &str,
        access_token: &str,
    ) -> Result<SessionInvoiceStatus, GatewayError> {
        let path = format!("sessions/{session_reference}/invoices/{invoice_reference}");
        let builder = self.http.get(self.endpoint(&path)).bearer_auth(access_token);
        read_json(send(builder, &path).await?).await
    }

    async fn close_online_session(
        &self,
        session_reference: &str,
        access_token: &str,
    ) -> Result<(), GatewayError> {
        let path = format!("sessions/online/{session_reference}/close");
        let builder = self.http.post(self.endpoint(&path)).bearer_auth(access_token);
        let response = send(builder, &path).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_for(status, body))
    }

    async fn query_invoice_metadata(
        &self,
        filters: &InvoiceQueryFilters,
        access_token: &str,
    ) -> Result<QueryInvoiceMetadataResponse, GatewayError> {
        let builder = self
            .http
            .post(self.endpoint("invoices/query/metadata"))
            .query(&[("pageOffset", 0), ("pageSize", METADATA_PAGE_SIZE)])
            .bearer_auth(access_token)
            .json(filters);
        read_json(send(builder, "invoices/query/metadata").await?).await
    }
}

async fn send(request: RequestBuilder, path: &str) -> Result<Response, GatewayError> {
    debug!(path, "calling gateway");
    let response = request.send().await.map_err(transport_error)?;
    debug!(path, status = response.status().as_u16(), "gateway responded");
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.text().await.map_err(transport_error)?;
    if !status.is_success() {
        return Err(error_for(status, body));
    }
    serde_json::from_str(&body)
        .map_err(|e| GatewayError::InvalidResponse(format!("{e}; status {status}: {body}")))
}

fn transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() || e.is_connect() {
        GatewayError::Network(e.to_string())
    } else {
        GatewayError::Http(e)
    }
}

/// Map a non-success response to a [`GatewayError`].
fn error_for(status: StatusCode, body: String) -> GatewayError {
    let code = status.as_u16();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return GatewayError::Unauthorized { status: code, body };
    }
    if status.is_server_error() {
        return GatewayError::Server { status: code, body };
    }
    if status.is_client_error() {
        if let Ok(exception) = serde_json::from_str::<ExceptionResponse>(&body) {
            if !exception.exception.exception_detail_list.is_empty() {
                return GatewayError::Rejected {
                    status: code,
                    exception,
                };
            }
        }
    }
    GatewayError::InvalidResponse(format!("status {status}: {body}"))
}
