//! Student dashboard and lesson progress.

use axum::Router;
use axum::extract::State;
use axum::routing::get;

use campus_core::entities::{Batch, ClassSession, Material, Progress};
use campus_core::responses::StudentCourse;
use campus_core::stats::StudentStats;
use campus_db::updates::progress::ProgressUpdate;

use crate::error::AppResult;
use crate::identity::Student;
use crate::json::Json;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/student/courses", get(courses))
        .route("/api/student/batches", get(batches))
        .route("/api/student/schedule", get(schedule))
        .route("/api/student/materials", get(materials))
        .route("/api/student/stats", get(stats))
        .route("/api/progress", get(progress).post(record_progress))
}

async fn courses(
    Student(me): Student,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<StudentCourse>>> {
    Ok(Json(state.service.student_courses(&me.user_id).await?))
}

async fn batches(
    Student(me): Student,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Batch>>> {
    Ok(Json(state.service.batches_for_student(&me.user_id).await?))
}

async fn schedule(
    Student(me): Student,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ClassSession>>> {
    Ok(Json(state.service.student_schedule(&me.user_id).await?))
}

async fn materials(
    Student(me): Student,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Material>>> {
    Ok(Json(state.service.student_materials(&me.user_id).await?))
}

async fn stats(
    Student(me): Student,
    State(state): State<AppState>,
) -> AppResult<Json<StudentStats>> {
    Ok(Json(state.service.student_stats(&me.user_id).await?))
}

async fn progress(
    Student(me): Student,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Progress>>> {
    Ok(Json(state.service.progress_for_student(&me.user_id).await?))
}

async fn record_progress(
    Student(me): Student,
    State(state): State<AppState>,
    Json(input): Json<ProgressUpdate>,
) -> AppResult<Json<Progress>> {
    Ok(Json(state.service.upsert_progress(&me.user_id, &input).await?))
}
