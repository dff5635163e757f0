//! Routes for the Entrant Lifecycle & Draw context.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;
use waitlist_core::entrant::EntrantStatus;
use waitlist_draw::application::{command_handlers, query_handlers};
use waitlist_draw::domain::commands;
use waitlist_draw::domain::outcomes::{BatchOutcome, DrawResult};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Attendee limit.
    pub max_attendees: u32,
    /// Default draw size.
    pub sample_size: u32,
}

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    /// The new event's identifier.
    pub event_id: Uuid,
}

/// Request body for POST /{event_id}/entrants.
#[derive(Debug, Deserialize)]
pub struct RegisterEntrantRequest {
    /// The user joining the waitlist.
    pub user_id: String,
    /// Display name.
    pub user_name: String,
    /// Contact email.
    pub user_email: String,
}

/// Query string for GET /{event_id}/entrants.
#[derive(Debug, Deserialize)]
pub struct ListEntrantsQuery {
    /// Status filter; `waiting` when absent.
    pub status: Option<String>,
}

/// Request body for POST /{event_id}/draw.
#[derive(Debug, Default, Deserialize)]
pub struct DrawRequest {
    /// Entrants to draw; the event's sample size when absent.
    #[serde(default)]
    pub size: Option<u32>,
}

/// Request body for POST /{event_id}/transitions.
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    /// Entrants to move.
    pub user_ids: Vec<String>,
    /// Target status.
    pub status: EntrantStatus,
}

/// POST /
#[instrument(skip(state, request))]
async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<CreateEventResponse>), ApiError> {
    let command = commands::CreateEvent {
        correlation_id: Uuid::new_v4(),
        event_id: Uuid::new_v4(),
        max_attendees: request.max_attendees,
        sample_size: request.sample_size,
    };

    command_handlers::handle_create_event(&command, state.gateway.as_ref()).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            event_id: command.event_id,
        }),
    ))
}

/// GET /{event_id}/capacity
async fn get_capacity(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<query_handlers::CapacityView>, ApiError> {
    let view = query_handlers::get_capacity(event_id, &state.capacity, &state.registry).await?;
    Ok(Json(view))
}

/// POST /{event_id}/entrants
#[instrument(skip(state, request), fields(user_id = %request.user_id))]
async fn register_entrant(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<RegisterEntrantRequest>,
) -> Result<(StatusCode, Json<query_handlers::EntrantView>), ApiError> {
    let command = commands::RegisterEntrant {
        correlation_id: Uuid::new_v4(),
        event_id,
        user_id: request.user_id,
        user_name: request.user_name,
        user_email: request.user_email,
    };

    let entrant = command_handlers::handle_register_entrant(&command, &state.registry).await?;

    Ok((StatusCode::CREATED, Json(entrant.into())))
}

/// GET /{event_id}/entrants
async fn list_entrants(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ListEntrantsQuery>,
) -> Result<Json<Vec<query_handlers::EntrantView>>, ApiError> {
    let status = match query.status {
        Some(raw) => raw.parse()?,
        None => EntrantStatus::Waiting,
    };
    let views = query_handlers::list_entrants(event_id, status, &state.registry).await?;
    Ok(Json(views))
}

/// GET /{event_id}/entrants/{user_id}
async fn get_entrant(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(Uuid, String)>,
) -> Result<Json<query_handlers::EntrantView>, ApiError> {
    let view = query_handlers::get_entrant(event_id, &user_id, &state.registry).await?;
    Ok(Json(view))
}

/// POST /{event_id}/draw
///
/// The body is optional; without one the event's default sample size is drawn.
#[instrument(skip(state, request))]
async fn draw(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    request: Option<Json<DrawRequest>>,
) -> Result<Json<DrawResult>, ApiError> {
    let command = commands::DrawEntrants {
        correlation_id: Uuid::new_v4(),
        event_id,
        requested_size: request.and_then(|Json(request)| request.size),
    };

    let result = command_handlers::handle_draw_entrants(&command, &state.draw).await?;

    Ok(Json(result))
}

/// POST /{event_id}/transitions
#[instrument(skip(state, request), fields(target = %request.status))]
async fn transition_entrants(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<TransitionRequest>,
) -> Result<Json<BatchOutcome>, ApiError> {
    let command = commands::TransitionEntrants {
        correlation_id: Uuid::new_v4(),
        event_id,
        user_ids: request.user_ids,
        target: request.status,
    };

    let outcome =
        command_handlers::handle_transition_entrants(&command, &state.transition).await?;

    Ok(Json(outcome))
}

/// Returns the router for event waitlists.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_event))
        .route("/{event_id}/capacity", get(get_capacity))
        .route(
            "/{event_id}/entrants",
            get(list_entrants).post(register_entrant),
        )
        .route("/{event_id}/entrants/{user_id}", get(get_entrant))
        .route("/{event_id}/draw", post(draw))
        .route("/{event_id}/transitions", post(transition_entrants))
}
