use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use bounty_runtime::{
    parse_latest_prices, Card, CardHistorySource, CardPricePoint, CardSource, DeckPayload,
    DeckStore, PriceSource, RemoteDeck, SavedDeck,
};

const API_PREFIX: &str = "bounty_api";

/// HTTP client for the deckbuilder backend.
pub struct ApiClient {
    client: Client,
    base_url: String,
    session_cookie: Option<String>,
}

/// Outcome of an email verification link.
#[derive(Clone, Debug, PartialEq)]
pub enum VerificationStatus {
    Verified,
    Failed(String),
}

impl VerificationStatus {
    pub fn message(&self) -> &str {
        match self {
            VerificationStatus::Verified => {
                "Your email has been successfully verified! You can now log in."
            }
            VerificationStatus::Failed(detail) => detail,
        }
    }

    fn from_response(status: StatusCode, body: &Value) -> Self {
        if status.is_success() {
            return VerificationStatus::Verified;
        }
        let detail = body
            .get("detail")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .unwrap_or("Verification failed.");
        VerificationStatus::Failed(detail.to_string())
    }
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            session_cookie: None,
        }
    }

    /// Forwards a backend session cookie (`name=value`) with every request.
    pub fn with_session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn verify_email(&self, token: Option<&str>) -> VerificationStatus {
        let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
            return VerificationStatus::Failed("Invalid verification link.".to_string());
        };

        let url = format!("{}?token={}", self.endpoint("verify-email/"), token);
        let response = match self.with_cookie(self.client.get(url)).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Email verification request failed: {}", e);
                return VerificationStatus::Failed(
                    "An unexpected error occurred. Please try again later.".to_string(),
                );
            }
        };

        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        VerificationStatus::from_response(status, &body)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_PREFIX, path)
    }

    fn latest_prices_url(&self, card_ids: &[i64]) -> String {
        let ids: Vec<String> = card_ids.iter().map(|id| id.to_string()).collect();
        format!("{}?ids={}", self.endpoint("onepiece_card/latest-prices/"), ids.join(","))
    }

    fn with_cookie(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.session_cookie {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String, action: &str) -> Result<T> {
        debug!("GET {}", url);
        let response = self.with_cookie(self.client.get(url)).send().await?;
        let response = ensure_success(response, action).await?;
        Ok(response.json::<T>().await?)
    }
}

async fn ensure_success(response: Response, action: &str) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error body".to_string());
    Err(anyhow!("Failed to {}. Status: {}. Body: {}", action, status, text))
}

#[async_trait]
impl CardSource for ApiClient {
    async fn fetch_cards(&self) -> Result<Vec<Card>> {
        self.get_json(self.endpoint("onepiece_card/"), "fetch cards").await
    }
}

#[async_trait]
impl PriceSource for ApiClient {
    async fn latest_prices(&self, card_ids: &[i64]) -> Result<HashMap<i64, f64>> {
        if card_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let response = self
            .with_cookie(self.client.get(self.latest_prices_url(card_ids)))
            .send()
            .await?;
        if !response.status().is_success() {
            warn!("Failed to fetch latest prices. Status: {}", response.status());
            return Ok(HashMap::new());
        }
        let body = response.json::<Value>().await?;
        Ok(parse_latest_prices(&body))
    }
}

#[async_trait]
impl DeckStore for ApiClient {
    async fn list_decks(&self) -> Result<Vec<RemoteDeck>> {
        self.get_json(self.endpoint("onepiece_deck/"), "list decks").await
    }

    async fn save_deck(&self, payload: &DeckPayload) -> Result<SavedDeck> {
        let response = self
            .with_cookie(self.client.post(self.endpoint("onepiece_deck/")))
            .json(payload)
            .send()
            .await?;
        let response = ensure_success(response, "save deck").await?;
        Ok(response.json::<SavedDeck>().await?)
    }
}

#[async_trait]
impl CardHistorySource for ApiClient {
    async fn card_history(&self, card_id: i64) -> Result<Vec<CardPricePoint>> {
        let url = format!("{}?card_id={}", self.endpoint("onepiece_cardhistory/"), card_id);
        self.get_json(url, "fetch card history").await
    }
}
