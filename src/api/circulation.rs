use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};

use super::dto::{BorrowRequest, ReturnRequest};
use super::extract::{IdPath, ValidJson};
use super::{blocking, AppState};
use crate::error::AppResult;
use crate::models::{BookId, BorrowRecord, BorrowerId, RecordId};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(borrow_book))
        .route("/return", post(return_book))
        .route("/borrower/:id", get(records_for_borrower))
        .route("/book/:id", get(records_for_book))
        .route("/overdue", get(overdue_records))
        .route("/active", get(active_records))
        .route("/:record_id/mark-lost", patch(mark_as_lost))
}

async fn borrow_book(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<BorrowRequest>,
) -> AppResult<(StatusCode, Json<BorrowRecord>)> {
    let circulation = state.circulation;
    let record = blocking("borrow_book", move || {
        circulation.borrow(req.book_id, req.borrower_id, req.borrow_days)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn return_book(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<ReturnRequest>,
) -> AppResult<Json<BorrowRecord>> {
    let circulation = state.circulation;
    Ok(Json(
        blocking("return_book", move || circulation.return_book(req.record_id, req.notes)).await?,
    ))
}

async fn records_for_borrower(
    State(state): State<AppState>,
    IdPath(id): IdPath<BorrowerId>,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    let circulation = state.circulation;
    Ok(Json(
        blocking("records_for_borrower", move || circulation.records_for_borrower(id)).await?,
    ))
}

async fn records_for_book(
    State(state): State<AppState>,
    IdPath(id): IdPath<BookId>,
) -> AppResult<Json<Vec<BorrowRecord>>> {
    let circulation = state.circulation;
    Ok(Json(
        blocking("records_for_book", move || circulation.records_for_book(id)).await?,
    ))
}

async fn overdue_records(State(state): State<AppState>) -> AppResult<Json<Vec<BorrowRecord>>> {
    let circulation = state.circulation;
    Ok(Json(blocking("overdue_records", move || circulation.list_overdue()).await?))
}

async fn active_records(State(state): State<AppState>) -> AppResult<Json<Vec<BorrowRecord>>> {
    let circulation = state.circulation;
    Ok(Json(blocking("active_records", move || circulation.list_active()).await?))
}

async fn mark_as_lost(
    State(state): State<AppState>,
    IdPath(record_id): IdPath<RecordId>,
) -> AppResult<Json<BorrowRecord>> {
    let circulation = state.circulation;
    Ok(Json(
        blocking("mark_as_lost", move || circulation.mark_as_lost(record_id)).await?,
    ))
}
