//! HTTP client for the WorldNotes API, used by the CLI subcommands.
//!
//! Configuration is via environment variables:
//! - `WORLDNOTES_URL` - Base URL (default: `http://127.0.0.1:3000/api`)
//! - `WORLDNOTES_API_KEY` - API key for authentication (optional for local)

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

use crate::api::ErrorBody;
use crate::models::*;

/// Default URL for local use.
pub const DEFAULT_URL: &str = "http://127.0.0.1:3000/api";

/// HTTP client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: API key required or invalid")]
    Unauthorized,

    #[error("Rate limited, try again later")]
    RateLimited,

    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Clone)]
pub struct WorldNotesClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl WorldNotesClient {
    /// Create client from environment variables.
    pub fn from_env() -> Self {
        let base_url = std::env::var("WORLDNOTES_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
        let api_key = std::env::var("WORLDNOTES_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());
        Self::new(base_url, api_key)
    }

    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Decode a success body, or map the status and JSON error body to a
    /// [`ClientError`].
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(err) => match err.details {
                Some(details) => format!("{} ({})", err.error, details),
                None => err.error,
            },
            Err(_) => body,
        };
        match status {
            StatusCode::NOT_FOUND => Err(ClientError::NotFound(message)),
            StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(message)),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::TOO_MANY_REQUESTS => Err(ClientError::RateLimited),
            _ => Err(ClientError::Server(format!("{}: {}", status, message))),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.request(Method::GET, path).send().await?;
        self.handle_response(response).await
    }

    async fn send_json<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self.request(method, path).json(body).send().await?;
        self.handle_response(response).await
    }

    async fn delete(&self, path: &str) -> Result<SuccessResponse, ClientError> {
        let response = self.request(Method::DELETE, path).send().await?;
        self.handle_response(response).await
    }

    fn scoped(path: &str, map_id: Option<Uuid>) -> String {
        match map_id {
            Some(id) => format!("{}?map_id={}", path, id),
            None => path.to_string(),
        }
    }

    // ============================================================
    // Health
    // ============================================================

    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        self.get("/health").await
    }

    // ============================================================
    // Missions
    // ============================================================

    pub async fn list_missions(&self, map_id: Option<Uuid>) -> Result<Vec<Mission>, ClientError> {
        self.get(&Self::scoped("/missions", map_id)).await
    }

    pub async fn get_mission(&self, id: Uuid) -> Result<MissionDetails, ClientError> {
        self.get(&format!("/missions/{}", id)).await
    }

    pub async fn create_mission(&self, input: &CreateMissionInput) -> Result<Mission, ClientError> {
        self.send_json(Method::POST, "/missions", input).await
    }

    pub async fn update_mission(
        &self,
        id: Uuid,
        input: &UpdateMissionInput,
    ) -> Result<Mission, ClientError> {
        self.send_json(Method::PUT, &format!("/missions/{}", id), input)
            .await
    }

    pub async fn delete_mission(&self, id: Uuid) -> Result<SuccessResponse, ClientError> {
        self.delete(&format!("/missions/{}", id)).await
    }

    pub async fn deadlocked_missions(
        &self,
        map_id: Option<Uuid>,
    ) -> Result<Vec<Mission>, ClientError> {
        self.get(&Self::scoped("/missions/deadlocked", map_id)).await
    }

    // ============================================================
    // Dependencies
    // ============================================================

    pub async fn add_dependency(
        &self,
        mission_id: Uuid,
        required_mission_id: Uuid,
    ) -> Result<LinkResponse, ClientError> {
        self.send_json(
            Method::POST,
            &format!("/missions/{}/dependencies", mission_id),
            &AddDependencyInput {
                required_mission_id,
            },
        )
        .await
    }

    pub async fn remove_dependency(
        &self,
        mission_id: Uuid,
        required_mission_id: Uuid,
    ) -> Result<SuccessResponse, ClientError> {
        self.delete(&format!(
            "/missions/{}/dependencies/{}",
            mission_id, required_mission_id
        ))
        .await
    }

    // ============================================================
    // Maps
    // ============================================================

    pub async fn list_maps(&self) -> Result<Vec<Map>, ClientError> {
        self.get("/maps").await
    }

    pub async fn create_map(&self, input: &CreateMapInput) -> Result<Map, ClientError> {
        self.send_json(Method::POST, "/maps", input).await
    }

    // ============================================================
    // Progression / Export / Import
    // ============================================================

    pub async fn progression(&self, map_id: Option<Uuid>) -> Result<ProgressionReport, ClientError> {
        self.get(&Self::scoped("/progression", map_id)).await
    }

    pub async fn export(&self) -> Result<WorldExport, ClientError> {
        self.get("/export").await
    }

    pub async fn import(&self, bundle: &WorldExport) -> Result<ImportResponse, ClientError> {
        self.send_json(Method::POST, "/import", bundle).await
    }
}
