//! Client for the interview backend. The trait is the seam: the
//! controller only sees [`InterviewApi`], production wires in the
//! reqwest-backed client.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::error::ApiError;
use crate::interview::{Interaction, Question};

/// Short-lived credential minted when a session goes live. It
/// authenticates negotiation and the event channel, not the backend API.
#[derive(Debug, Deserialize)]
pub struct RealtimeCredential {
    value: SecretString,
    #[serde(default)]
    expires_at: Option<i64>,
}

impl RealtimeCredential {
    pub fn new(value: &str) -> Self {
        Self {
            value: SecretString::from(value.to_string()),
            expires_at: None,
        }
    }

    pub fn secret(&self) -> &SecretString {
        &self.value
    }

    /// Expiry as a unix timestamp, when the backend provided one.
    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionDetail {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub questions: Vec<Question>,
}

/// Everything the controller needs from the backend.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait InterviewApi {
    /// Instantiates a session from a scenario.
    async fn create_session(&self, scenario_id: &str) -> Result<SessionSummary, ApiError>;

    /// Loads the session with its question plan.
    async fn fetch_session(&self, session_id: &str) -> Result<SessionDetail, ApiError>;

    /// Moves the session to live and mints the realtime credential.
    async fn start_session(&self, session_id: &str) -> Result<RealtimeCredential, ApiError>;

    /// Marks the session finished.
    async fn end_session(&self, session_id: &str) -> Result<(), ApiError>;

    /// Saves one question/answer pair.
    async fn save_interaction(
        &self,
        session_id: &str,
        interaction: &Interaction,
    ) -> Result<(), ApiError>;

    /// Asks the backend to score the finished session.
    async fn request_evaluation(&self, session_id: &str) -> Result<(), ApiError>;
}

pub struct InterviewApiClient {
    client: Client,
    base_url: String,
    api_key: SecretString,
}

impl InterviewApiClient {
    pub fn new(base_url: &str, api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status { status, body })
    }
}

#[async_trait]
impl InterviewApi for InterviewApiClient {
    async fn create_session(&self, scenario_id: &str) -> Result<SessionSummary, ApiError> {
        let response = self
            .client
            .post(self.url("/interviews"))
            .bearer_auth(self.api_key.expose_secret())
            .json(&serde_json::json!({ "scenario_id": scenario_id }))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<SessionSummary>().await?)
    }

    async fn fetch_session(&self, session_id: &str) -> Result<SessionDetail, ApiError> {
        let response = self
            .client
            .get(self.url(&format!("/interviews/{}", session_id)))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<SessionDetail>().await?)
    }

    async fn start_session(&self, session_id: &str) -> Result<RealtimeCredential, ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/interviews/{}/start", session_id)))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<RealtimeCredential>().await?)
    }

    async fn end_session(&self, session_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/interviews/{}/end", session_id)))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn save_interaction(
        &self,
        session_id: &str,
        interaction: &Interaction,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/interviews/{}/interactions", session_id)))
            .bearer_auth(self.api_key.expose_secret())
            .json(interaction)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn request_evaluation(&self, session_id: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(&format!("/interviews/{}/evaluation", session_id)))
            .bearer_auth(self.api_key.expose_secret())
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}
