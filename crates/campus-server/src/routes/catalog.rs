//! Public catalog and health.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use serde_json::{Value, json};

use campus_core::entities::Batch;
use campus_core::enums::CourseStatus;
use campus_core::responses::{CourseListResponse, CourseWithSummary};
use campus_db::repos::course::CourseFilter;

use crate::error::{AppError, AppResult};
use crate::json::Json;
use crate::pagination::PageQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/courses", get(list_courses))
        .route("/api/courses/{id}", get(get_course))
        .route("/api/courses/{id}/batches", get(course_batches))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn list_courses(
    State(state): State<AppState>,
    Query(mut filter): Query<CourseFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<CourseListResponse>> {
    filter.public_only = true;
    let (page, limit) = page.resolve(&state.general);
    let (courses, pagination) = state.service.list_courses(&filter, page, limit).await?;
    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<CourseWithSummary>> {
    let course = state.service.get_course(&id).await?;
    if matches!(course.status, CourseStatus::Draft | CourseStatus::Cancelled) {
        return Err(AppError::NotFound("Course not found".into()));
    }
    Ok(Json(course.into()))
}

async fn course_batches(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Batch>>> {
    let course = state.service.get_course(&id).await?;
    if matches!(course.status, CourseStatus::Draft | CourseStatus::Cancelled) {
        return Err(AppError::NotFound("Course not found".into()));
    }
    Ok(Json(state.service.batches_for_course(&id).await?))
}
