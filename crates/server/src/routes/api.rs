//! JSON API route handlers.
//!
//! Records go out with `password` and `passwordConfirmation` blanked and the
//! one-way `passwordHash` attached. Extractor rejections are taken as
//! `Result`s so a malformed path, query or body still gets a JSON error.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
};
use serde::Serialize;
use tracing::instrument;

use client_registry_core::{Client, ClientId, ClientInput, ListClientsQuery};

use crate::error::Result;
use crate::state::AppState;

/// A client as returned by the API.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientResponse {
    #[serde(flatten)]
    pub client: Client,
    pub password: &'static str,
    pub password_confirmation: &'static str,
}

impl From<Client> for ClientResponse {
    fn from(client: Client) -> Self {
        Self {
            client,
            password: "",
            password_confirmation: "",
        }
    }
}

/// `GET /clients?page=&search=`
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    query: std::result::Result<Query<ListClientsQuery>, QueryRejection>,
) -> Result<Json<Vec<ClientResponse>>> {
    let Query(query) = query?;
    let clients = state.client_service().list(&query).await?;
    Ok(Json(clients.into_iter().map(ClientResponse::from).collect()))
}

/// `GET /clients/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    path: std::result::Result<Path<ClientId>, PathRejection>,
) -> Result<Json<ClientResponse>> {
    let Path(id) = path?;
    let client = state.client_service().get(id).await?;
    Ok(Json(client.into()))
}

/// `POST /clients`
///
/// Responds 201 with the stored record and its `Location`.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    body: std::result::Result<Json<ClientInput>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(input) = body?;
    let client = state.client_service().create(input).await?;

    let location = format!("/clients/{}", client.id);
    Ok((
        StatusCode::CREATED,
        [(LOCATION, location)],
        Json(ClientResponse::from(client)),
    ))
}

/// `PUT /clients/{id}`
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    path: std::result::Result<Path<ClientId>, PathRejection>,
    body: std::result::Result<Json<ClientInput>, JsonRejection>,
) -> Result<StatusCode> {
    let Path(id) = path?;
    let Json(input) = body?;
    state.client_service().update(id, input).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /clients/{id}`
#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    path: std::result::Result<Path<ClientId>, PathRejection>,
) -> Result<StatusCode> {
    let Path(id) = path?;
    state.client_service().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
