//! Offer/answer exchange with the session endpoint.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;

use crate::api::RealtimeCredential;
use crate::error::TransportError;

/// Trades the local session offer for the remote answer.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait Negotiator: Send + Sync {
    async fn exchange(
        &self,
        offer: &str,
        credential: &RealtimeCredential,
    ) -> Result<String, TransportError>;
}

pub struct HttpNegotiator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpNegotiator {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl Negotiator for HttpNegotiator {
    async fn exchange(
        &self,
        offer: &str,
        credential: &RealtimeCredential,
    ) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.secret().expose_secret())
            .header(CONTENT_TYPE, "application/sdp")
            .body(offer.to_string())
            .send()
            .await
            .map_err(|e| TransportError::NegotiationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::NegotiationFailed(format!(
                "endpoint answered {}: {}",
                status, body
            )));
        }

        response
            .text()
            .await
            .map_err(|e| TransportError::NegotiationFailed(e.to_string()))
    }
}
