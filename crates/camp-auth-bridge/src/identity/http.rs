/*
[INPUT]:  IdentityConfig (base URL, timeouts, client id) and signed challenges
[OUTPUT]: Access token from the identity service and typed account snapshots
[POS]:    Identity layer - HTTP identity service client
[UPDATE]: When adding endpoints or changing request/response shapes
*/

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::IdentityConfig;
use crate::error::{IdentityError, Result};
use crate::identity::{AccessTokenStore, IdentityService, LinkedSocials, Profile, UsageStats};

const VERIFY_ENDPOINT: &str = "auth/verify";
const CLIENT_ID_HEADER: &str = "x-client-id";
const DEFAULT_TOKEN_LIFETIME_SECONDS: u64 = 24 * 60 * 60;

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    address: &'a str,
    message: &'a str,
    signature: &'a str,
}

/// Response from the verify endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Identity service reached over HTTP
#[derive(Debug)]
pub struct HttpIdentityService {
    http_client: Client,
    base_url: Url,
    client_id: Option<String>,
    tokens: AccessTokenStore,
}

impl HttpIdentityService {
    /// Create a client from configuration; `config.base_url` must be set
    pub fn new(config: &IdentityConfig) -> Result<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .ok_or(url::ParseError::EmptyHost)?;
        Self::with_base_url(config, base_url)
    }

    /// Create a client against an explicit base URL, taking timeouts from `config`
    pub fn with_base_url(config: &IdentityConfig, base_url: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()?;

        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http_client,
            base_url,
            client_id: config.client_id.clone(),
            tokens: AccessTokenStore::new(),
        })
    }

    pub fn tokens(&self) -> &AccessTokenStore {
        &self.tokens
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(endpoint)?;
        let builder = self.http_client.request(method, url);
        Ok(match &self.client_id {
            Some(client_id) => builder.header(CLIENT_ID_HEADER, client_id),
            None => builder,
        })
    }

    fn authed_request(&self, method: Method, endpoint: &str, address: &str) -> Result<RequestBuilder> {
        let token = self
            .tokens
            .token_for(address)
            .ok_or(IdentityError::Unauthenticated)?;
        Ok(self.request(method, endpoint)?.bearer_auth(token))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).trim().to_string();
            debug!(status = status.as_u16(), %message, "identity service error response");
            return Err(IdentityError::api_error(status, message));
        }

        Ok(serde_json::from_slice(&body)?)
    }

    async fn get_for<T: DeserializeOwned>(&self, address: &str, resource: &str) -> Result<T> {
        let endpoint = format!("users/{}/{resource}", address.trim());
        let builder = self.authed_request(Method::GET, &endpoint, address)?;
        self.send_json(builder).await
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    /// POST auth/verify
    async fn verify_and_issue_session(
        &self,
        address: &str,
        message: &str,
        signature: &str,
    ) -> Result<()> {
        let body = VerifyRequest {
            address,
            message,
            signature,
        };
        let builder = self.request(Method::POST, VERIFY_ENDPOINT)?.json(&body);

        let response: VerifyResponse = match self.send_json(builder).await {
            Err(IdentityError::Api { status, message })
                if status == StatusCode::UNAUTHORIZED.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                return Err(IdentityError::Rejected(message));
            }
            other => other?,
        };

        if response.access_token.trim().is_empty() {
            return Err(IdentityError::Rejected(
                "service returned an empty access token".to_string(),
            ));
        }

        self.tokens.set_token(
            response.access_token,
            response.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME_SECONDS),
            address.to_string(),
        );
        info!(%address, "identity session issued");
        Ok(())
    }

    /// GET users/{address}/usage
    async fn fetch_usage(&self, address: &str) -> Result<UsageStats> {
        self.get_for(address, "usage").await
    }

    /// GET users/{address}/profile
    async fn fetch_profile(&self, address: &str) -> Result<Profile> {
        self.get_for(address, "profile").await
    }

    /// GET users/{address}/socials
    async fn fetch_linked_socials(&self, address: &str) -> Result<LinkedSocials> {
        self.get_for(address, "socials").await
    }

    async fn end_session(&self) {
        self.tokens.clear();
    }
}
