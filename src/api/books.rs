use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use super::dto::{AuthorQuery, BookRequest, TitleQuery};
use super::extract::{IdPath, QueryParams, ValidJson};
use super::{blocking, AppState};
use crate::error::AppResult;
use crate::models::{Book, BookId};

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/search/title", get(search_by_title))
        .route("/search/author", get(search_by_author))
        .route("/category/:category", get(books_in_category))
        .route("/inventory/low-stock", get(low_stock))
        .route("/:id", get(get_book).put(update_book).delete(delete_book))
}

async fn create_book(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<BookRequest>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let catalog = state.catalog;
    let book = blocking("create_book", move || catalog.create_book(req.into())).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn get_book(
    State(state): State<AppState>,
    IdPath(id): IdPath<BookId>,
) -> AppResult<Json<Book>> {
    let catalog = state.catalog;
    Ok(Json(blocking("get_book", move || catalog.get_book(id)).await?))
}

async fn list_books(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let catalog = state.catalog;
    Ok(Json(blocking("list_books", move || catalog.list_books()).await?))
}

async fn search_by_title(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TitleQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let catalog = state.catalog;
    Ok(Json(
        blocking("search_by_title", move || catalog.search_by_title(&query.title)).await?,
    ))
}

async fn search_by_author(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<AuthorQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let catalog = state.catalog;
    Ok(Json(
        blocking("search_by_author", move || catalog.search_by_author(&query.author)).await?,
    ))
}

async fn books_in_category(
    State(state): State<AppState>,
    IdPath(category): IdPath<String>,
) -> AppResult<Json<Vec<Book>>> {
    let catalog = state.catalog;
    Ok(Json(
        blocking("books_in_category", move || catalog.search_by_category(&category)).await?,
    ))
}

async fn low_stock(State(state): State<AppState>) -> AppResult<Json<Vec<Book>>> {
    let catalog = state.catalog;
    Ok(Json(blocking("low_stock", move || catalog.low_stock()).await?))
}

async fn update_book(
    State(state): State<AppState>,
    IdPath(id): IdPath<BookId>,
    ValidJson(req): ValidJson<BookRequest>,
) -> AppResult<Json<Book>> {
    let catalog = state.catalog;
    Ok(Json(
        blocking("update_book", move || catalog.update_book(id, req.into())).await?,
    ))
}

async fn delete_book(
    State(state): State<AppState>,
    IdPath(id): IdPath<BookId>,
) -> AppResult<StatusCode> {
    let catalog = state.catalog;
    blocking("delete_book", move || catalog.delete_book(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
