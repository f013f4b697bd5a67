use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{Json, Router};

use super::dto::BorrowerRequest;
use super::extract::{IdPath, ValidJson};
use super::{blocking, AppState};
use crate::error::AppResult;
use crate::models::{Borrower, BorrowerId};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_borrowers).post(create_borrower))
        .route("/active", get(list_active_borrowers))
        .route(
            "/:id",
            get(get_borrower).put(update_borrower).delete(delete_borrower),
        )
        .route("/:id/deactivate", patch(deactivate_borrower))
        .route("/:id/activate", patch(activate_borrower))
}

async fn create_borrower(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<BorrowerRequest>,
) -> AppResult<(StatusCode, Json<Borrower>)> {
    let membership = state.membership;
    let borrower =
        blocking("create_borrower", move || membership.create_borrower(req.into())).await?;
    Ok((StatusCode::CREATED, Json(borrower)))
}

async fn get_borrower(
    State(state): State<AppState>,
    IdPath(id): IdPath<BorrowerId>,
) -> AppResult<Json<Borrower>> {
    let membership = state.membership;
    Ok(Json(blocking("get_borrower", move || membership.get_borrower(id)).await?))
}

async fn list_borrowers(State(state): State<AppState>) -> AppResult<Json<Vec<Borrower>>> {
    let membership = state.membership;
    Ok(Json(blocking("list_borrowers", move || membership.list_borrowers()).await?))
}

async fn list_active_borrowers(State(state): State<AppState>) -> AppResult<Json<Vec<Borrower>>> {
    let membership = state.membership;
    Ok(Json(
        blocking("list_active_borrowers", move || membership.list_active_borrowers()).await?,
    ))
}

async fn update_borrower(
    State(state): State<AppState>,
    IdPath(id): IdPath<BorrowerId>,
    ValidJson(req): ValidJson<BorrowerRequest>,
) -> AppResult<Json<Borrower>> {
    let membership = state.membership;
    Ok(Json(
        blocking("update_borrower", move || membership.update_borrower(id, req.into())).await?,
    ))
}

async fn deactivate_borrower(
    State(state): State<AppState>,
    IdPath(id): IdPath<BorrowerId>,
) -> AppResult<StatusCode> {
    let membership = state.membership;
    blocking("deactivate_borrower", move || membership.deactivate(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn activate_borrower(
    State(state): State<AppState>,
    IdPath(id): IdPath<BorrowerId>,
) -> AppResult<StatusCode> {
    let membership = state.membership;
    blocking("activate_borrower", move || membership.activate(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_borrower(
    State(state): State<AppState>,
    IdPath(id): IdPath<BorrowerId>,
) -> AppResult<StatusCode> {
    let membership = state.membership;
    blocking("delete_borrower", move || membership.delete_borrower(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
