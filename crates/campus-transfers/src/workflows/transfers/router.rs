//! HTTP surface for the transfer engine. Handlers stay thin: decode, call
//! the service, map the typed error onto a status code.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Actor, ClassroomId, EntityId, PersonId, TransferId};
use super::eligibility::EligibilityScope;
use super::repository::{AssignmentWriter, LetterEmitter, StatusFilter, TransferStore};
use super::service::{TransferAction, TransferRequest, TransferService, TransferServiceError};

/// Approval body; the section pick is only meaningful on the final
/// grade-skip approval.
#[derive(Debug, Deserialize)]
pub struct ApproveBody {
    pub actor: Actor,
    #[serde(default)]
    pub destination_section: Option<ClassroomId>,
}

#[derive(Debug, Deserialize)]
pub struct DeclineBody {
    pub actor: Actor,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CancelBody {
    pub actor: Actor,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmBody {
    pub actor: Actor,
    pub phrase: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    #[serde(default)]
    pub status: StatusFilter,
}

pub fn transfer_router<S, W, L>(service: Arc<TransferService<S, W, L>>) -> Router
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    Router::new()
        .route("/api/v1/transfers", post(create_transfer::<S, W, L>))
        .route("/api/v1/transfers/:transfer_id", get(get_transfer::<S, W, L>))
        .route(
            "/api/v1/transfers/:transfer_id/approve",
            post(approve_transfer::<S, W, L>),
        )
        .route(
            "/api/v1/transfers/:transfer_id/decline",
            post(decline_transfer::<S, W, L>),
        )
        .route(
            "/api/v1/transfers/:transfer_id/cancel",
            post(cancel_transfer::<S, W, L>),
        )
        .route(
            "/api/v1/transfers/:transfer_id/confirm",
            post(confirm_transfer::<S, W, L>),
        )
        .route(
            "/api/v1/transfers/:transfer_id/id-preview",
            get(preview_transfer_id::<S, W, L>),
        )
        .route("/api/v1/people/:person_id/inbox", get(approver_inbox::<S, W, L>))
        .route("/api/v1/people/:person_id/outbox", get(initiator_outbox::<S, W, L>))
        .route(
            "/api/v1/entities/:entity_id/eligibility",
            post(eligible_destinations::<S, W, L>),
        )
        .with_state(service)
}

pub(crate) async fn create_transfer<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Json(request): Json<TransferRequest>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    match service.create(request) {
        Ok(record) => (StatusCode::CREATED, Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn get_transfer<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(transfer_id): Path<String>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    match service.get(&TransferId(transfer_id)) {
        Ok(record) => Json(record).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approve_transfer<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(transfer_id): Path<String>,
    Json(body): Json<ApproveBody>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    let action = TransferAction::Approve {
        destination_section: body.destination_section,
    };
    match service.advance(&TransferId(transfer_id), action, body.actor) {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn decline_transfer<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(transfer_id): Path<String>,
    Json(body): Json<DeclineBody>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    let action = TransferAction::Decline {
        reason: body.reason,
    };
    match service.advance(&TransferId(transfer_id), action, body.actor) {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_transfer<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(transfer_id): Path<String>,
    Json(body): Json<CancelBody>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    match service.advance(&TransferId(transfer_id), TransferAction::Cancel, body.actor) {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn confirm_transfer<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(transfer_id): Path<String>,
    Json(body): Json<ConfirmBody>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    let action = TransferAction::Confirm { phrase: body.phrase };
    match service.advance(&TransferId(transfer_id), action, body.actor) {
        Ok(record) => Json(record.status_view()).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn preview_transfer_id<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(transfer_id): Path<String>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    match service.preview_id_change(&TransferId(transfer_id)) {
        Ok(preview) => Json(preview).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn approver_inbox<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(person_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    match service.inbox(&PersonId(person_id), query.status) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            Json(views).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn initiator_outbox<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(person_id): Path<String>,
    Query(query): Query<StatusQuery>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    match service.outbox(&PersonId(person_id), query.status) {
        Ok(records) => {
            let views: Vec<_> = records.iter().map(|record| record.status_view()).collect();
            Json(views).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn eligible_destinations<S, W, L>(
    State(service): State<Arc<TransferService<S, W, L>>>,
    Path(entity_id): Path<String>,
    Json(scope): Json<EligibilityScope>,
) -> Response
where
    S: TransferStore + 'static,
    W: AssignmentWriter + 'static,
    L: LetterEmitter + 'static,
{
    match service.eligible_destinations(&EntityId(entity_id), &scope) {
        Ok(options) => Json(options).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: TransferServiceError) -> Response {
    let status = match &error {
        TransferServiceError::Validation(_) | TransferServiceError::InvalidDestination(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        TransferServiceError::Conflict { .. } | TransferServiceError::StaleState { .. } => {
            StatusCode::CONFLICT
        }
        TransferServiceError::UnauthorizedTransition { .. } => StatusCode::FORBIDDEN,
        TransferServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        TransferServiceError::MalformedId(_)
        | TransferServiceError::Directory(_)
        | TransferServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
