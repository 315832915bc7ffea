//! Server-rendered UI route handlers.
//!
//! A paginated, searchable client table plus a create/edit form. Page and
//! search term travel in the query string; nothing is kept between requests.
//! Outcomes are reported with `?notice=` / `?error=` codes on redirects, or by
//! re-rendering the form with the submitted values when a save is rejected.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::instrument;

use client_registry_core::{
    Client, ClientId, ClientInput, ClientStatus, FieldError, Gender, ListClientsQuery, PersonType,
    ValidationMode,
};

use crate::services::ClientError;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Client form data, as posted by the browser.
///
/// Everything arrives as text; an unchecked checkbox is simply absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientForm {
    pub name: String,
    pub tax_document: String,
    pub email: String,
    pub person_type: String,
    pub phone: String,
    pub state_registration: String,
    pub state_registration_exempt: Option<String>,
    pub gender: String,
    pub birth_date: String,
    pub status: String,
    pub password: String,
    pub password_confirmation: String,
}

impl ClientForm {
    /// Prefill from a stored client. Password fields stay empty.
    fn from_client(client: &Client) -> Self {
        Self {
            name: client.name.clone(),
            tax_document: client.tax_document.to_string(),
            email: client.email.to_string(),
            person_type: client.person_type.to_string(),
            phone: client.phone.to_string(),
            state_registration: client.state_registration.clone().unwrap_or_default(),
            state_registration_exempt: client.state_registration_exempt.then(|| "on".to_string()),
            gender: client.gender.map(|g| g.to_string()).unwrap_or_default(),
            birth_date: client
                .birth_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            status: client.status.to_string(),
            password: String::new(),
            password_confirmation: String::new(),
        }
    }

    /// Whether the exempt checkbox is ticked.
    #[must_use]
    pub const fn exempt(&self) -> bool {
        self.state_registration_exempt.is_some()
    }

    /// Convert into a service payload.
    ///
    /// Values the form controls cannot produce (an unknown select option, a
    /// malformed date) are left unset and reported alongside the payload;
    /// business rules are left to the service.
    fn into_input(self, id: Option<ClientId>) -> (ClientInput, Vec<FieldError>) {
        let mut errors = Vec::new();

        let person_type = parse_choice::<PersonType>(&self.person_type, "personType", &mut errors);
        let gender = parse_choice::<Gender>(&self.gender, "gender", &mut errors);
        let status = parse_choice::<ClientStatus>(&self.status, "status", &mut errors);

        let birth_date = match self.birth_date.trim() {
            "" => None,
            value => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map_err(|_| {
                    errors.push(FieldError::new("birthDate", "birth date must be a valid date"));
                })
                .ok(),
        };

        let exempt = self.exempt();
        let input = ClientInput {
            id,
            name: self.name,
            tax_document: self.tax_document,
            email: self.email,
            person_type,
            phone: self.phone,
            state_registration: Some(self.state_registration),
            state_registration_exempt: exempt,
            gender,
            birth_date,
            status,
            password: Some(self.password),
            password_confirmation: Some(self.password_confirmation),
        };
        (input, errors)
    }
}

/// Unreadable-value errors followed by every field rule the payload breaks.
///
/// A field that already has an unreadable-value error gets no rule error.
fn with_rule_errors(
    input: &ClientInput,
    mut errors: Vec<FieldError>,
    mode: ValidationMode,
) -> Vec<FieldError> {
    if let Err(rules) = input.clone().validate(mode) {
        let rule_errors: Vec<FieldError> = rules
            .errors()
            .iter()
            .filter(|rule| !errors.iter().any(|e| e.field == rule.field))
            .cloned()
            .collect();
        errors.extend(rule_errors);
    }
    errors
}

/// Parse an optional select value; blank means "not chosen".
fn parse_choice<T: std::str::FromStr>(
    value: &str,
    field: &str,
    errors: &mut Vec<FieldError>,
) -> Option<T> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    value
        .parse()
        .map_err(|_| errors.push(FieldError::new(field, format!("invalid {field}"))))
        .ok()
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the client table.
///
/// `page` is read leniently: a blank or non-numeric value shows page 1.
#[derive(Debug, Default, Deserialize)]
pub struct IndexQuery {
    pub page: Option<String>,
    pub search: Option<String>,
    pub notice: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// View Types
// =============================================================================

/// Client table row.
#[derive(Clone)]
pub struct ClientRowView {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    pub tax_document: String,
    pub phone: String,
    pub person_type: &'static str,
    pub status: &'static str,
    pub created_at: String,
}

impl From<Client> for ClientRowView {
    fn from(client: Client) -> Self {
        Self {
            id: client.id,
            name: client.name,
            email: client.email.into_inner(),
            tax_document: client.tax_document.into_inner(),
            phone: client.phone.to_string(),
            person_type: client.person_type.label(),
            status: client.status.label(),
            created_at: client.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Previous/next navigation for the client table.
#[derive(Clone)]
pub struct Pagination {
    pub page: i64,
    pub has_next: bool,
}

impl Pagination {
    /// Whether there is a page before this one.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn previous_page(&self) -> i64 {
        self.page - 1
    }

    #[must_use]
    pub const fn next_page(&self) -> i64 {
        self.page + 1
    }
}

/// Field messages shown next to form inputs.
#[derive(Clone, Default)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    /// First message for a field, if any.
    #[must_use]
    pub fn first(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Client table page template.
#[derive(Template, WebTemplate)]
#[template(path = "clients/index.html")]
pub struct ClientsIndexTemplate {
    pub clients: Vec<ClientRowView>,
    pub search: String,
    pub pagination: Pagination,
    pub notice: Option<String>,
    pub error: Option<String>,
}

/// Create/edit form page template.
#[derive(Template, WebTemplate)]
#[template(path = "clients/form.html")]
pub struct ClientFormTemplate {
    pub title: &'static str,
    pub action: String,
    pub editing: bool,
    pub form: ClientForm,
    pub errors: FormErrors,
    pub error: Option<String>,
}

impl ClientFormTemplate {
    fn new_client(form: ClientForm) -> Self {
        Self {
            title: "New client",
            action: "/ui/clients".to_string(),
            editing: false,
            form,
            errors: FormErrors::default(),
            error: None,
        }
    }

    fn edit_client(id: ClientId, form: ClientForm) -> Self {
        Self {
            title: "Edit client",
            action: format!("/ui/clients/{id}"),
            editing: true,
            form,
            errors: FormErrors::default(),
            error: None,
        }
    }

    /// Re-render with the submitted values and what went wrong.
    fn rejected(mut self, errors: Vec<FieldError>, error: Option<String>) -> Response {
        self.errors = FormErrors(errors);
        self.error = error.or_else(|| Some("Please fix the highlighted fields.".to_string()));
        (StatusCode::BAD_REQUEST, self).into_response()
    }
}

/// Message for a `?notice=` code.
fn notice_message(code: &str) -> Option<String> {
    let message = match code {
        "created" => "Client created.",
        "updated" => "Client updated.",
        "deleted" => "Client deleted.",
        _ => return None,
    };
    Some(message.to_string())
}

/// Message for an `?error=` code.
fn error_message(code: &str) -> Option<String> {
    let message = match code {
        "not_found" => "That client no longer exists.",
        "internal" => "Something went wrong. Please try again.",
        _ => return None,
    };
    Some(message.to_string())
}

// =============================================================================
// Routes
// =============================================================================

/// `GET /` - send visitors to the client table.
pub async fn root() -> Redirect {
    Redirect::to("/ui/clients")
}

/// `GET /ui/clients` - the client table.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    query: Result<Query<IndexQuery>, QueryRejection>,
) -> Response {
    let query = query.map(|Query(query)| query).unwrap_or_default();
    let list_query = ListClientsQuery {
        page: query.page.as_deref().and_then(|p| p.trim().parse().ok()),
        search: query.search,
    };
    let page = list_query.page();
    let search = list_query.search().unwrap_or_default().to_string();

    let mut error = query.error.as_deref().and_then(error_message);
    let clients = match state.client_service().list(&list_query).await {
        Ok(clients) => clients,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list clients");
            error = error_message("internal");
            Vec::new()
        }
    };

    let has_next = i64::try_from(clients.len()).is_ok_and(|n| n == ListClientsQuery::PAGE_SIZE);

    ClientsIndexTemplate {
        clients: clients.into_iter().map(ClientRowView::from).collect(),
        search,
        pagination: Pagination { page, has_next },
        notice: query.notice.as_deref().and_then(notice_message),
        error,
    }
    .into_response()
}

/// `GET /ui/clients/new` - empty form.
pub async fn new_form() -> impl IntoResponse {
    ClientFormTemplate::new_client(ClientForm {
        status: ClientStatus::default().to_string(),
        ..ClientForm::default()
    })
}

/// `POST /ui/clients` - create from the form.
#[instrument(skip(state, form))]
pub async fn create(State(state): State<AppState>, Form(form): Form<ClientForm>) -> Response {
    let page = ClientFormTemplate::new_client(ClientForm {
        password: String::new(),
        password_confirmation: String::new(),
        ..form.clone()
    });

    let (input, errors) = form.into_input(None);
    if !errors.is_empty() {
        return page.rejected(with_rule_errors(&input, errors, ValidationMode::Create), None);
    }

    match state.client_service().create(input).await {
        Ok(_) => Redirect::to("/ui/clients?notice=created").into_response(),
        Err(e) => save_failed(page, e),
    }
}

/// `GET /ui/clients/{id}/edit` - prefilled form.
#[instrument(skip(state))]
pub async fn edit_form(
    State(state): State<AppState>,
    path: Result<Path<ClientId>, PathRejection>,
) -> Response {
    let Ok(Path(id)) = path else {
        return Redirect::to("/ui/clients?error=not_found").into_response();
    };
    match state.client_service().get(id).await {
        Ok(client) => ClientFormTemplate::edit_client(id, ClientForm::from_client(&client))
            .into_response(),
        Err(ClientError::NotFound) => {
            Redirect::to("/ui/clients?error=not_found").into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load client");
            Redirect::to("/ui/clients?error=internal").into_response()
        }
    }
}

/// `POST /ui/clients/{id}` - update from the form.
#[instrument(skip(state, form))]
pub async fn update(
    State(state): State<AppState>,
    path: Result<Path<ClientId>, PathRejection>,
    Form(form): Form<ClientForm>,
) -> Response {
    let Ok(Path(id)) = path else {
        return Redirect::to("/ui/clients?error=not_found").into_response();
    };
    let page = ClientFormTemplate::edit_client(
        id,
        ClientForm {
            password: String::new(),
            password_confirmation: String::new(),
            ..form.clone()
        },
    );

    let (input, errors) = form.into_input(Some(id));
    if !errors.is_empty() {
        return page.rejected(with_rule_errors(&input, errors, ValidationMode::Update), None);
    }

    match state.client_service().update(id, input).await {
        Ok(_) => Redirect::to("/ui/clients?notice=updated").into_response(),
        Err(ClientError::NotFound) => {
            Redirect::to("/ui/clients?error=not_found").into_response()
        }
        Err(e) => save_failed(page, e),
    }
}

/// `POST /ui/clients/{id}/delete`
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    path: Result<Path<ClientId>, PathRejection>,
) -> Redirect {
    let Ok(Path(id)) = path else {
        return Redirect::to("/ui/clients?error=not_found");
    };
    match state.client_service().delete(id).await {
        Ok(()) => Redirect::to("/ui/clients?notice=deleted"),
        Err(ClientError::NotFound) => Redirect::to("/ui/clients?error=not_found"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to delete client");
            Redirect::to("/ui/clients?error=internal")
        }
    }
}

/// Keep the form open and explain why the save was refused.
fn save_failed(page: ClientFormTemplate, err: ClientError) -> Response {
    match err {
        ClientError::Validation(errors) => page.rejected(errors.errors().to_vec(), None),
        ClientError::Conflict => page.rejected(
            Vec::new(),
            Some("This client was changed by someone else. Reload it and try again.".to_string()),
        ),
        ClientError::IdMismatch => page.rejected(Vec::new(), Some(err.to_string())),
        ClientError::NotFound | ClientError::PasswordHash | ClientError::Repository(_) => {
            let event_id = sentry::capture_error(&err);
            tracing::error!(error = %err, sentry_event_id = %event_id, "Failed to save client");
            let mut response = page.rejected(Vec::new(), error_message("internal"));
            *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            response
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_form_into_input() {
        let form = ClientForm {
            name: "Maria".to_string(),
            person_type: "individual".to_string(),
            gender: "female".to_string(),
            birth_date: "1990-05-17".to_string(),
            state_registration_exempt: Some("on".to_string()),
            password: "abcdefgh".to_string(),
            ..ClientForm::default()
        };
        let (input, errors) = form.into_input(Some(ClientId::new(3)));

        assert!(errors.is_empty());

        assert_eq!(input.id, Some(ClientId::new(3)));
        assert_eq!(input.person_type, Some(PersonType::Individual));
        assert_eq!(input.gender, Some(Gender::Female));
        assert_eq!(input.birth_date, NaiveDate::from_ymd_opt(1990, 5, 17));
        assert!(input.state_registration_exempt);
        assert_eq!(input.status, None);
        assert_eq!(input.password.as_deref(), Some("abcdefgh"));
    }

    #[test]
    fn test_form_rejects_tampered_values() {
        let form = ClientForm {
            person_type: "robot".to_string(),
            birth_date: "17/05/1990".to_string(),
            ..ClientForm::default()
        };
        let (input, errors) = form.into_input(None);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["personType", "birthDate"]);
        assert_eq!(input.person_type, None);
        assert_eq!(input.birth_date, None);
    }

    #[test]
    fn test_tampered_values_reported_with_rule_errors() {
        let form = ClientForm {
            person_type: "robot".to_string(),
            email: "not-an-email".to_string(),
            password: "abcdefgh".to_string(),
            password_confirmation: "abcdefgh".to_string(),
            ..ClientForm::default()
        };
        let (input, errors) = form.into_input(None);
        let errors = with_rule_errors(&input, errors, ValidationMode::Create);
        let form_errors = FormErrors(errors.clone());

        assert_eq!(form_errors.first("personType"), Some("invalid personType"));
        assert_eq!(
            errors.iter().filter(|e| e.field == "personType").count(),
            1
        );
        assert!(form_errors.first("name").is_some());
        assert!(form_errors.first("email").is_some());
        assert!(form_errors.first("taxDocument").is_some());
        assert!(form_errors.first("phone").is_some());
    }

    #[test]
    fn test_pagination_links() {
        let first = Pagination {
            page: 1,
            has_next: true,
        };
        assert!(!first.has_previous());
        assert_eq!(first.next_page(), 2);

        let third = Pagination {
            page: 3,
            has_next: false,
        };
        assert!(third.has_previous());
        assert_eq!(third.previous_page(), 2);
    }

    #[test]
    fn test_message_codes() {
        assert_eq!(notice_message("created").as_deref(), Some("Client created."));
        assert_eq!(notice_message("<script>"), None);
        assert!(error_message("not_found").is_some());
    }
}
