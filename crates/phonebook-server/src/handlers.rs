//! Request handlers, one per [`Operation`].
//!
//! Each handler awaits the repository, shapes the response, and
//! short-circuits with `?` on failure. Errors travel back to the server,
//! which hands them to [`ApiError::into_response`].
//!
//! Name uniqueness is checked here, before the store is touched:
//!
//! - `POST /api/persons` with a name that already exists updates that contact
//!   instead of inserting a second one.
//! - `PUT /api/persons/{id}` onto a name owned by another contact is a
//!   validation failure.
//!
//! The check and the write are separate repository calls, so two concurrent
//! requests for the same new name can both pass the check.

use std::sync::Arc;

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use phonebook_core::{Contact, ContactFields, ContactId, ContactRepository, ContactSchema};

use crate::error::{ApiError, ApiResult};
use crate::response::{empty, html, json, HttpResponse};
use crate::router::{Operation, RouteMatch};

/// Timestamp layout for `/info`, e.g. `Thu Oct 15 2026 13:45:00 GMT+0300`.
const INFO_DATE_FORMAT: &str = "%a %b %d %Y %H:%M:%S GMT%z";

/// Dispatches matched routes to the contact repository.
#[derive(Clone)]
pub struct Handlers {
    repository: Arc<dyn ContactRepository>,
}

impl std::fmt::Debug for Handlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handlers").finish_non_exhaustive()
    }
}

impl Handlers {
    /// Creates handlers backed by `repository`.
    #[must_use]
    pub fn new(repository: Arc<dyn ContactRepository>) -> Self {
        Self { repository }
    }

    /// Returns the backing repository.
    #[must_use]
    pub fn repository(&self) -> &Arc<dyn ContactRepository> {
        &self.repository
    }

    /// Runs the handler for a matched route.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for malformed bodies and store failures.
    pub async fn handle(
        &self,
        route: &RouteMatch,
        headers: &HeaderMap,
        body: &Bytes,
    ) -> ApiResult<HttpResponse> {
        let id = route.param("id").unwrap_or_default();

        match route.operation() {
            Operation::Info => self.info().await,
            Operation::ListContacts => self.list().await,
            Operation::GetContact => self.get(id).await,
            Operation::CreateContact => self.create(parse_fields(headers, body)?).await,
            Operation::UpdateContact => self.update(id, parse_fields(headers, body)?).await,
            Operation::DeleteContact => self.delete(id).await,
        }
    }

    async fn info(&self) -> ApiResult<HttpResponse> {
        let count = self.repository.count().await?;
        let now = chrono::Local::now().format(INFO_DATE_FORMAT);
        Ok(html(
            StatusCode::OK,
            format!("<p>Phonebook has info for {count} people</p>\n<p>{now}</p>\n"),
        ))
    }

    async fn list(&self) -> ApiResult<HttpResponse> {
        let contacts = self.repository.find_all().await?;
        Ok(json(StatusCode::OK, &contacts))
    }

    async fn get(&self, id: &str) -> ApiResult<HttpResponse> {
        Ok(found_or_404(self.repository.find_by_id(id).await?))
    }

    async fn create(&self, fields: ContactFields) -> ApiResult<HttpResponse> {
        if let Some(name) = fields.name() {
            if let Some(existing) = self.repository.find_by_name(name).await? {
                tracing::debug!(
                    contact_id = %existing.id,
                    name = %existing.name,
                    "Name already present, updating instead of inserting"
                );
                let updated = self
                    .repository
                    .update_by_id(&existing.id.to_string(), fields)
                    .await?;
                return Ok(found_or_404(updated));
            }
        }

        let contact = self.repository.create(fields).await?;
        tracing::info!(contact_id = %contact.id, name = %contact.name, "Contact created");
        Ok(json(StatusCode::OK, &contact))
    }

    async fn update(&self, id: &str, fields: ContactFields) -> ApiResult<HttpResponse> {
        let target = ContactId::parse(id)?;

        if let Some(name) = fields.name() {
            if let Some(owner) = self.repository.find_by_name(name).await? {
                if owner.id != target {
                    return Err(ContactSchema::name_taken(name).into());
                }
            }
        }

        Ok(found_or_404(self.repository.update_by_id(id, fields).await?))
    }

    async fn delete(&self, id: &str) -> ApiResult<HttpResponse> {
        self.repository.delete_by_id(id).await?;
        Ok(empty(StatusCode::NO_CONTENT))
    }
}

fn found_or_404(contact: Option<Contact>) -> HttpResponse {
    match contact {
        Some(contact) => json(StatusCode::OK, &contact),
        None => empty(StatusCode::NOT_FOUND),
    }
}

/// Returns `true` if the request declares a JSON body.
pub(crate) fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// Extracts contact fields from a request body.
///
/// Only JSON bodies are read; anything else, and an empty body, yields no
/// fields. A JSON body must be an object.
fn parse_fields(headers: &HeaderMap, body: &Bytes) -> ApiResult<ContactFields> {
    if !is_json(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ContactFields::default());
    }

    let value: serde_json::Value =
        serde_json::from_slice(body).map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    if !value.is_object() {
        return Err(ApiError::MalformedBody("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| ApiError::MalformedBody(e.to_string()))
}
