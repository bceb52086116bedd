//! Shared test fakes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use crate::api::{ApiResponse, NotesApi, ResponseEnvelope};
use crate::error::{Error, Result};
use crate::models::Note;

/// Scripted in-memory stand-in for the remote service.
#[derive(Clone, Default)]
pub(crate) struct FakeApi {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
pub(crate) struct FakeState {
    pub offline: bool,
    pub reject_login: bool,
    pub server_notes: Vec<Note>,
    pub server_id_overrides: HashMap<String, String>,
    pub failing_delete_ids: HashSet<String>,
    pub owner_ids_by_email: HashMap<String, String>,
    pub deleted_ids: Vec<String>,
}

impl FakeApi {
    pub fn with_state(configure: impl FnOnce(&mut FakeState)) -> Self {
        let api = Self::default();
        configure(&mut api.state.lock().unwrap());
        api
    }

    pub fn offline() -> Self {
        Self::with_state(|state| state.offline = true)
    }

    pub fn deleted_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().deleted_ids.clone()
    }
}

fn transport_error() -> Error {
    Error::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "connection refused",
    ))
}

pub(crate) fn app_success<T>(data: Option<T>) -> ApiResponse<T> {
    ApiResponse {
        http_status: 200,
        envelope: Some(ResponseEnvelope {
            successful: true,
            status_code: 200,
            message: "OK".to_string(),
            data,
        }),
        error_body: String::new(),
    }
}

pub(crate) fn app_rejection<T>(status_code: u16, message: &str) -> ApiResponse<T> {
    ApiResponse {
        http_status: 200,
        envelope: Some(ResponseEnvelope {
            successful: false,
            status_code,
            message: message.to_string(),
            data: None,
        }),
        error_body: String::new(),
    }
}

impl NotesApi for FakeApi {
    async fn register(&self, _email: &str, _password: &str) -> Result<ApiResponse<()>> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(transport_error());
        }
        Ok(app_success(None))
    }

    async fn login(&self, _email: &str, _password: &str) -> Result<ApiResponse<()>> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(transport_error());
        }
        if state.reject_login {
            return Ok(app_rejection(401, "wrong password"));
        }
        Ok(app_success(None))
    }

    async fn add_note(&self, note: &Note) -> Result<ApiResponse<Note>> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(transport_error());
        }

        let mut echoed = note.clone();
        if let Some(server_id) = state.server_id_overrides.get(&note.id) {
            echoed.id = server_id.clone();
        }
        state.server_notes.retain(|existing| existing.id != echoed.id);
        state.server_notes.push(echoed.clone());
        Ok(app_success(Some(echoed)))
    }

    async fn delete_note(&self, note_id: &str) -> Result<ApiResponse<Note>> {
        let mut state = self.state.lock().unwrap();
        if state.offline || state.failing_delete_ids.contains(note_id) {
            return Err(transport_error());
        }
        state.server_notes.retain(|existing| existing.id != note_id);
        state.deleted_ids.push(note_id.to_string());
        Ok(app_success(None))
    }

    async fn get_notes(&self) -> Result<ApiResponse<Vec<Note>>> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(transport_error());
        }
        Ok(app_success(Some(state.server_notes.clone())))
    }

    async fn get_owner_id_for_email(&self, email: &str) -> Result<ApiResponse<String>> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(transport_error());
        }
        match state.owner_ids_by_email.get(email) {
            Some(owner_id) => Ok(app_success(Some(owner_id.clone()))),
            None => Ok(app_rejection(404, "owner not found")),
        }
    }

    async fn get_email_for_owner_id(&self, owner_id: &str) -> Result<ApiResponse<String>> {
        let state = self.state.lock().unwrap();
        if state.offline {
            return Err(transport_error());
        }
        let email = state
            .owner_ids_by_email
            .iter()
            .find(|(_, id)| id.as_str() == owner_id)
            .map(|(email, _)| email.clone());
        match email {
            Some(email) => Ok(app_success(Some(email))),
            None => Ok(app_rejection(404, "owner not found")),
        }
    }

    async fn add_owner_to_note(&self, note_id: &str, owner_id: &str) -> Result<ApiResponse<Note>> {
        let mut state = self.state.lock().unwrap();
        if state.offline {
            return Err(transport_error());
        }
        let note = state
            .server_notes
            .iter_mut()
            .find(|note| note.id == note_id);
        match note {
            Some(note) => {
                note.owners.push(owner_id.to_string());
                Ok(app_success(Some(note.clone())))
            }
            None => Ok(app_rejection(404, "note not found")),
        }
    }
}
