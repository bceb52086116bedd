//! Remote notes API client.
//!
//! Defines the wire format shared with the server and the [`NotesApi`]
//! contract the sync engine consumes. Transport failures surface as `Err`;
//! application-level failures travel inside [`ApiResponse`] so callers can
//! tell the two apart.

use std::future::Future;
use std::sync::{Arc, RwLock};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::{Credentials, EngineConfig};
use crate::error::Result;
use crate::models::Note;
use crate::util::compact_text;

/// Endpoints reachable without an authorization header.
const PUBLIC_ENDPOINTS: [&str; 2] = ["/register", "/login"];

fn default_message() -> String {
    "OK".to_string()
}

/// Generic response envelope returned by every server endpoint.
// The default on `data` must not drag a `T: Default` bound into the
// derived impl; payload types like `Note` have no `Default`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    bound(deserialize = "T: serde::Deserialize<'de>")
)]
pub struct ResponseEnvelope<T> {
    pub successful: bool,
    pub status_code: u16,
    #[serde(default = "default_message")]
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

/// Account credentials request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRequest {
    pub email: String,
    pub password: String,
}

/// Delete-note request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteNoteRequest {
    pub delete_note_id: String,
}

/// Add-owner request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOwnerRequest {
    pub note_id: String,
    pub owner_id: String,
}

/// Outcome of one API call that reached the server.
///
/// `envelope` is present when the server answered 2xx with a well-formed
/// body; `error_body` holds the raw payload of a non-2xx answer.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub http_status: u16,
    pub envelope: Option<ResponseEnvelope<T>>,
    pub error_body: String,
}

impl<T> ApiResponse<T> {
    /// True when the server both answered 2xx and reported business success.
    pub fn is_app_success(&self) -> bool {
        self.envelope
            .as_ref()
            .is_some_and(|envelope| envelope.successful)
    }

    /// Extract the payload of a successful response.
    pub fn into_data(self) -> Option<T> {
        self.envelope.and_then(|envelope| envelope.data)
    }
}

/// Extract a human-readable message from a non-2xx response body.
///
/// Error bodies are envelope-shaped when the server produced them; anything
/// else falls back to the trimmed body or a transport-derived message.
pub fn parse_error_message(status: u16, body: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.message {
            let message = message.trim();
            if !message.is_empty() {
                return format!("{message} ({status})");
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("{} ({status})", compact_text(trimmed))
    }
}

/// Contract for the remote note service.
///
/// Every method may fail with a transport error (`Err`) or return a
/// non-successful application status inside the [`ApiResponse`].
pub trait NotesApi {
    fn register(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ApiResponse<()>>> + Send;

    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<ApiResponse<()>>> + Send;

    /// Upsert a note; the server echoes back the authoritative persisted note.
    fn add_note(&self, note: &Note) -> impl Future<Output = Result<ApiResponse<Note>>> + Send;

    fn delete_note(&self, note_id: &str)
        -> impl Future<Output = Result<ApiResponse<Note>>> + Send;

    /// Full note list for the authenticated owner.
    fn get_notes(&self) -> impl Future<Output = Result<ApiResponse<Vec<Note>>>> + Send;

    fn get_owner_id_for_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<ApiResponse<String>>> + Send;

    fn get_email_for_owner_id(
        &self,
        owner_id: &str,
    ) -> impl Future<Output = Result<ApiResponse<String>>> + Send;

    fn add_owner_to_note(
        &self,
        note_id: &str,
        owner_id: &str,
    ) -> impl Future<Output = Result<ApiResponse<Note>>> + Send;
}

/// HTTP implementation of [`NotesApi`] backed by reqwest.
///
/// Credentials are externally managed; the client attaches them as a
/// basic-auth header on every endpoint outside [`PUBLIC_ENDPOINTS`].
#[derive(Debug, Clone)]
pub struct HttpNotesApi {
    base_url: String,
    client: reqwest::Client,
    credentials: Arc<RwLock<Option<Credentials>>>,
}

impl HttpNotesApi {
    /// Build a client from engine configuration.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;
        Ok(Self {
            base_url: config.server_url.clone(),
            client,
            credentials: Arc::new(RwLock::new(None)),
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install or clear the credentials used for authenticated endpoints.
    pub fn set_credentials(&self, credentials: Option<Credentials>) {
        *self
            .credentials
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = credentials;
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header("Accept", "application/json");

        if !PUBLIC_ENDPOINTS.contains(&path) {
            let credentials = self
                .credentials
                .read()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone();
            if let Some(credentials) = credentials {
                request = request.basic_auth(&credentials.email, Some(&credentials.password));
            }
        }

        request
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<ApiResponse<T>> {
        let response = request.send().await?;
        let http_status = response.status().as_u16();

        if response.status().is_success() {
            let envelope = response.json::<ResponseEnvelope<T>>().await?;
            Ok(ApiResponse {
                http_status,
                envelope: Some(envelope),
                error_body: String::new(),
            })
        } else {
            let error_body = response.text().await.unwrap_or_default();
            Ok(ApiResponse {
                http_status,
                envelope: None,
                error_body,
            })
        }
    }
}

impl NotesApi for HttpNotesApi {
    async fn register(&self, email: &str, password: &str) -> Result<ApiResponse<()>> {
        let body = AccountRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.execute(self.request(reqwest::Method::POST, "/register").json(&body))
            .await
    }

    async fn login(&self, email: &str, password: &str) -> Result<ApiResponse<()>> {
        let body = AccountRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.execute(self.request(reqwest::Method::POST, "/login").json(&body))
            .await
    }

    async fn add_note(&self, note: &Note) -> Result<ApiResponse<Note>> {
        self.execute(self.request(reqwest::Method::POST, "/saveNote").json(note))
            .await
    }

    async fn delete_note(&self, note_id: &str) -> Result<ApiResponse<Note>> {
        let body = DeleteNoteRequest {
            delete_note_id: note_id.to_string(),
        };
        self.execute(self.request(reqwest::Method::POST, "/deleteNote").json(&body))
            .await
    }

    async fn get_notes(&self) -> Result<ApiResponse<Vec<Note>>> {
        self.execute(self.request(reqwest::Method::GET, "/getNotes"))
            .await
    }

    async fn get_owner_id_for_email(&self, email: &str) -> Result<ApiResponse<String>> {
        self.execute(
            self.request(reqwest::Method::GET, "/getOwnerIdForEmail")
                .query(&[("email", email)]),
        )
        .await
    }

    async fn get_email_for_owner_id(&self, owner_id: &str) -> Result<ApiResponse<String>> {
        self.execute(
            self.request(reqwest::Method::GET, "/getEmailForOwnerId")
                .query(&[("ownerId", owner_id)]),
        )
        .await
    }

    async fn add_owner_to_note(&self, note_id: &str, owner_id: &str) -> Result<ApiResponse<Note>> {
        let body = AddOwnerRequest {
            note_id: note_id.to_string(),
            owner_id: owner_id.to_string(),
        };
        self.execute(
            self.request(reqwest::Method::POST, "/addOwnerIdToNoteId")
                .json(&body),
        )
        .await
    }
}
