//! reqwest adapter for [`UsersApi`].

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use tracing::{debug, error, info, instrument, warn};

use super::UsersApi;
use crate::config::ApiConfig;
use crate::domain::{Credentials, LoginResponse, UpdatedUser, UserId, UserPatch, UsersEnvelope};
use crate::error::{AdminError, AdminResult, LOGIN_FAILED};

const API_KEY_HEADER: &str = "x-api-key";

/// Users API over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUsersApi {
    client: Client,
    base_url: String,
}

impl HttpUsersApi {
    pub fn new(config: &ApiConfig) -> AdminResult<Self> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| AdminError::Config("API key is not a valid header value".to_string()))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AdminError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl UsersApi for HttpUsersApi {
    #[instrument(fields(email = %credentials.email), skip(self, credentials))]
    async fn login(&self, credentials: &Credentials) -> AdminResult<LoginResponse> {
        debug!("Sending request");
        let response = self
            .client
            .post(self.endpoint("/login"))
            .json(credentials)
            .send()
            .await
            .map_err(|e| AdminError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!("Login accepted");
            return Ok(response.json::<LoginResponse>().await?);
        }

        let body = response.bytes().await.unwrap_or_default();
        let err = derive_login_error(status, &body);
        warn!(status = status.as_u16(), error = %err, "Login rejected");
        Err(err)
    }

    #[instrument(skip(self))]
    async fn list_users(&self, page: u32) -> AdminResult<UsersEnvelope> {
        debug!("Sending request");
        let envelope = self
            .client
            .get(self.endpoint("/users"))
            .query(&[("page", page)])
            .send()
            .await?
            .error_for_status()?
            .json::<UsersEnvelope>()
            .await?;

        debug!(user_count = envelope.data.len(), total_pages = envelope.total_pages, "Page received");
        Ok(envelope)
    }

    #[instrument(skip(self, patch))]
    async fn update_user(&self, id: UserId, patch: &UserPatch) -> AdminResult<UpdatedUser> {
        debug!("Sending request");
        let mut updated = self
            .client
            .patch(self.endpoint(&format!("/users/{}", id)))
            .json(patch)
            .send()
            .await?
            .error_for_status()
            .inspect_err(|e| error!(error = %e, "Update rejected"))?
            .json::<UpdatedUser>()
            .await?;

        updated.id.get_or_insert(id);
        info!("User updated");
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete_user(&self, id: UserId) -> AdminResult<()> {
        debug!("Sending request");
        self.client
            .delete(self.endpoint(&format!("/users/{}", id)))
            .send()
            .await?
            .error_for_status()
            .inspect_err(|e| error!(error = %e, "Delete rejected"))?;

        info!("User deleted");
        Ok(())
    }
}

/// Turns a rejected login response into an [`AdminError`].
///
/// A JSON object carrying a non-empty string `message` is shown verbatim.
/// Any other object gets the generic login failure. A body that is not a JSON
/// object at all is treated as an unexpected response.
pub fn derive_login_error(status: StatusCode, body: &[u8]) -> AdminError {
    let value = serde_json::from_slice::<serde_json::Value>(body).ok();
    let Some(object) = value.as_ref().and_then(|value| value.as_object()) else {
        debug!(status = status.as_u16(), "Login error body is not a JSON object");
        return AdminError::Decode(format!("login rejected with status {}", status.as_u16()));
    };

    match object.get("message").and_then(|m| m.as_str()).filter(|m| !m.is_empty()) {
        Some(message) => AdminError::Auth(message.to_string()),
        None => {
            debug!(status = status.as_u16(), "Login error body has no message");
            AdminError::Auth(LOGIN_FAILED.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_field_wins() {
        let err = derive_login_error(StatusCode::BAD_REQUEST, br#"{"message":"Bad password"}"#);
        assert_eq!(err, AdminError::Auth("Bad password".to_string()));
    }

    #[test]
    fn test_object_without_message_falls_back() {
        let bodies: [&[u8]; 3] = [br#"{"error":"user not found"}"#, br#"{"message":42}"#, br#"{"message":""}"#];
        for body in bodies {
            let err = derive_login_error(StatusCode::BAD_REQUEST, body);
            assert_eq!(err, AdminError::Auth(LOGIN_FAILED.to_string()));
        }
    }

    #[test]
    fn test_non_object_body_is_unexpected() {
        let bodies: [&[u8]; 4] = [b"<html>502</html>", br#"["nope"]"#, br#""text""#, b""];
        for body in bodies {
            let err = derive_login_error(StatusCode::BAD_GATEWAY, body);
            assert!(matches!(err, AdminError::Decode(_)));
            assert_eq!(crate::views::login::login_error_message(&err), crate::error::UNEXPECTED_ERROR);
        }
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let config = ApiConfig::new("http://localhost:9000/api/").unwrap();
        let api = HttpUsersApi::new(&config).unwrap();
        assert_eq!(api.endpoint("/users"), "http://localhost:9000/api/users");
    }

    #[test]
    fn test_invalid_api_key_is_a_config_error() {
        let mut config = ApiConfig::new("http://localhost:9000/api").unwrap();
        config.api_key = Some("bad\nkey".to_string());
        assert!(matches!(HttpUsersApi::new(&config), Err(AdminError::Config(_))));
    }
}
