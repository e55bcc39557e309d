//! Trainer workspace: batches, roster, sessions, materials, attendance.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use serde::Deserialize;

use campus_core::entities::{Attendance, Batch, ClassSession, Material};
use campus_core::enums::{Role, SessionStatus};
use campus_core::responses::RosterEntry;
use campus_core::stats::TrainerStats;
use campus_db::updates::attendance::MarkAttendance;
use campus_db::updates::material::NewMaterial;
use campus_db::updates::session::{NewClassSession, SessionStatusChange};

use crate::error::{AppError, AppResult};
use crate::identity::{Identity, Trainer};
use crate::json::Json;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/trainer/batches", get(batches))
        .route("/api/trainer/students", get(students))
        .route("/api/trainer/sessions", get(sessions).post(create_session))
        .route("/api/trainer/sessions/{id}/status", put(session_status))
        .route("/api/trainer/schedule", get(schedule))
        .route("/api/trainer/stats", get(stats))
        .route("/api/trainer/materials", get(materials).post(upload_material))
        .route("/api/attendance", post(mark_attendance))
        .route("/api/attendance/batch/{id}", get(batch_attendance))
}

/// Trainers may only touch what they own; admins may touch anything.
fn ensure_owner(identity: &Identity, owner: Option<&str>, message: &str) -> AppResult<()> {
    if identity.role == Role::Admin || owner == Some(identity.user_id.as_str()) {
        Ok(())
    } else {
        Err(AppError::Forbidden(message.to_string()))
    }
}

async fn batches(
    Trainer(me): Trainer,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Batch>>> {
    Ok(Json(state.service.batches_for_trainer(&me.user_id).await?))
}

async fn students(
    Trainer(me): Trainer,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RosterEntry>>> {
    Ok(Json(state.service.trainer_roster(&me.user_id).await?))
}

#[derive(Debug, Default, Deserialize)]
struct SessionQuery {
    status: Option<SessionStatus>,
}

async fn sessions(
    Trainer(me): Trainer,
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> AppResult<Json<Vec<ClassSession>>> {
    Ok(Json(
        state
            .service
            .sessions_for_trainer(&me.user_id, query.status)
            .await?,
    ))
}

async fn create_session(
    Trainer(me): Trainer,
    State(state): State<AppState>,
    Json(mut input): Json<NewClassSession>,
) -> AppResult<(StatusCode, Json<ClassSession>)> {
    if me.role == Role::Trainer || input.trainer_id.is_none() {
        input.trainer_id = Some(me.user_id.clone());
    }
    let session = state.service.create_class_session(me.actor(), &input).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

async fn session_status(
    Trainer(me): Trainer,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<SessionStatusChange>,
) -> AppResult<Json<ClassSession>> {
    let session = state.service.get_class_session(&id).await?;
    ensure_owner(
        &me,
        Some(session.trainer_id.as_str()),
        "You can only update your own sessions",
    )?;
    Ok(Json(
        state
            .service
            .change_session_status(me.actor(), &id, &change)
            .await?,
    ))
}

async fn schedule(
    Trainer(me): Trainer,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<ClassSession>>> {
    Ok(Json(state.service.trainer_schedule(&me.user_id).await?))
}

async fn stats(
    Trainer(me): Trainer,
    State(state): State<AppState>,
) -> AppResult<Json<TrainerStats>> {
    Ok(Json(state.service.trainer_stats(&me.user_id).await?))
}

async fn materials(
    Trainer(me): Trainer,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Material>>> {
    Ok(Json(state.service.materials_for_trainer(&me.user_id).await?))
}

async fn upload_material(
    Trainer(me): Trainer,
    State(state): State<AppState>,
    Json(input): Json<NewMaterial>,
) -> AppResult<(StatusCode, Json<Material>)> {
    let material = state
        .service
        .create_material(&me.user_id, me.role, &input)
        .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

async fn mark_attendance(
    Trainer(me): Trainer,
    State(state): State<AppState>,
    Json(input): Json<MarkAttendance>,
) -> AppResult<Json<Attendance>> {
    Ok(Json(
        state
            .service
            .mark_attendance(&me.user_id, me.role, &input)
            .await?,
    ))
}

async fn batch_attendance(
    Trainer(me): Trainer,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<Attendance>>> {
    let batch = state.service.get_batch(&id).await?;
    ensure_owner(
        &me,
        batch.trainer_id.as_deref(),
        "You can only view attendance for your own batches",
    )?;
    Ok(Json(state.service.attendance_for_batch(&id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn who(id: &str, role: Role) -> Identity {
        Identity {
            user_id: id.into(),
            role,
        }
    }

    #[test]
    fn ownership_rules() {
        assert!(ensure_owner(&who("usr-1", Role::Trainer), Some("usr-1"), "x").is_ok());
        assert!(ensure_owner(&who("usr-1", Role::Trainer), Some("usr-2"), "x").is_err());
        assert!(ensure_owner(&who("usr-1", Role::Trainer), None, "x").is_err());
        assert!(ensure_owner(&who("usr-9", Role::Admin), None, "x").is_ok());
    }
}
