//! REST client for the hosted notes API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::DocumentClient;
use crate::models::{NewNote, Note, NoteId, NotePatch};
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

const HTTP_TIMEOUT_SECS: u64 = 10;
const MAX_ERROR_BODY_CHARS: usize = 180;

#[derive(Clone)]
pub struct HttpDocumentClient {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl std::fmt::Debug for HttpDocumentClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("HttpDocumentClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertRequest<'a> {
    user_id: &'a str,
    title: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct InsertResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
    message: Option<String>,
}

impl HttpDocumentClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .map_err(|error| Error::InvalidInput(format!("failed to build HTTP client: {error}")))?;

        Ok(Self {
            base_url,
            api_key: normalize_text_option(api_key),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn notes_url(&self) -> String {
        format!("{}/v1/notes", self.base_url)
    }

    fn note_url(&self, id: &NoteId) -> String {
        format!(
            "{}/v1/notes/{}",
            self.base_url,
            urlencoding::encode(id.as_str())
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, subject: &str) -> Result<Response> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(map_status_error(status, &body, subject))
    }
}

#[async_trait]
impl DocumentClient for HttpDocumentClient {
    async fn insert(&self, user_id: &str, data: &NewNote) -> Result<NoteId> {
        let payload = InsertRequest {
            user_id,
            title: &data.title,
            content: &data.content,
        };
        let response = self
            .send(self.client.post(self.notes_url()).json(&payload), "notes")
            .await?;
        let created = response
            .json::<InsertResponse>()
            .await
            .map_err(|error| Error::Api(format!("invalid create response: {error}")))?;
        Ok(NoteId::from(created.id))
    }

    async fn patch(&self, id: &NoteId, patch: &NotePatch) -> Result<()> {
        self.send(self.client.patch(self.note_url(id)).json(patch), id.as_str())
            .await?;
        Ok(())
    }

    async fn remove(&self, id: &NoteId) -> Result<()> {
        self.send(self.client.delete(self.note_url(id)), id.as_str())
            .await?;
        Ok(())
    }

    async fn query(&self, user_id: &str) -> Result<Vec<Note>> {
        let request = self
            .client
            .get(self.notes_url())
            .query(&[("userId", user_id)]);
        let response = self.send(request, "notes").await?;
        response
            .json::<Vec<Note>>()
            .await
            .map_err(|error| Error::Api(format!("invalid notes payload: {error}")))
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("notes API URL must not be empty".to_string()))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(Error::InvalidInput(
            "notes API URL must include http:// or https://".to_string(),
        ))
    }
}

fn map_transport_error(error: reqwest::Error) -> Error {
    if error.is_connect() || error.is_timeout() || error.is_request() {
        Error::BackingStoreUnavailable(error.to_string())
    } else {
        Error::Api(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &str, subject: &str) -> Error {
    if status == StatusCode::NOT_FOUND {
        return Error::NotFound(subject.to_string());
    }

    let message = parse_api_error(status, body);
    if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        Error::BackingStoreUnavailable(message)
    } else {
        Error::Api(message)
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message.or(payload.error) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body
        .trim()
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect::<String>();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}
