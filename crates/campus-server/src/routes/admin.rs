//! Admin back office: courses, batches, planning, enrollments, users, and
//! reporting.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post, put};
use serde::Deserialize;

use campus_core::entities::{AuditEntry, Batch, Enrollment, User};
use campus_core::enums::{LeftoverAction, Role};
use campus_core::responses::{
    BatchDistributionSummary, BatchListResponse, BatchPlanResult, CourseListResponse,
    CourseWithSummary, EnrollmentListResponse, LeftoverResult, MessageResponse,
    PaymentListResponse, UserListResponse,
};
use campus_core::stats::AdminStats;
use campus_db::repos::audit::AuditFilter;
use campus_db::repos::batch::BatchFilter;
use campus_db::repos::course::CourseFilter;
use campus_db::repos::payment::PaymentFilter;
use campus_db::updates::batch::{BatchUpdate, NewBatch};
use campus_db::updates::course::{CourseUpdate, NewCourse};
use campus_db::updates::enrollment::{EnrollmentFilter, EnrollmentStatusChange, NewEnrollment};
use campus_db::updates::user::NewUser;

use crate::error::AppResult;
use crate::identity::Admin;
use crate::json::Json;
use crate::pagination::PageQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/courses", get(list_courses).post(create_course))
        .route(
            "/api/admin/courses/{id}",
            get(get_course).put(update_course).delete(delete_course),
        )
        .route(
            "/api/admin/courses/{id}/batches",
            get(distribution).post(plan_batches),
        )
        .route("/api/admin/batches", get(list_batches).post(create_batch))
        .route(
            "/api/admin/batches/{id}",
            get(get_batch).put(update_batch).delete(delete_batch),
        )
        .route("/api/admin/batches/{id}/leftover", post(leftover))
        .route(
            "/api/admin/enrollments",
            get(list_enrollments).post(create_enrollment),
        )
        .route("/api/admin/enrollments/{id}", patch(assign_batch))
        .route("/api/admin/enrollments/{id}/transfer", post(transfer))
        .route("/api/admin/enrollments/{id}/status", put(change_status))
        .route("/api/admin/users", get(list_users).post(create_user))
        .route("/api/admin/users/{id}", delete(delete_user))
        .route("/api/admin/users/{id}/role", put(update_role))
        .route("/api/admin/trainers", get(list_trainers))
        .route("/api/admin/stats", get(stats))
        .route("/api/admin/payments", get(list_payments))
        .route("/api/admin/audit", get(audit))
}

// ---------------------------------------------------------------------------
// Courses
// ---------------------------------------------------------------------------

async fn list_courses(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(filter): Query<CourseFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<CourseListResponse>> {
    let (page, limit) = page.resolve(&state.general);
    let (courses, pagination) = state.service.list_courses(&filter, page, limit).await?;
    Ok(Json(CourseListResponse {
        courses: courses.into_iter().map(Into::into).collect(),
        pagination,
    }))
}

async fn create_course(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(input): Json<NewCourse>,
) -> AppResult<(StatusCode, Json<CourseWithSummary>)> {
    let course = state.service.create_course(admin.actor(), &input).await?;
    Ok((StatusCode::CREATED, Json(course.into())))
}

async fn get_course(
    Admin(_): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<CourseWithSummary>> {
    Ok(Json(state.service.get_course(&id).await?.into()))
}

async fn update_course(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<CourseUpdate>,
) -> AppResult<Json<CourseWithSummary>> {
    let course = state.service.update_course(admin.actor(), &id, &update).await?;
    Ok(Json(course.into()))
}

async fn delete_course(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.service.delete_course(admin.actor(), &id).await?;
    Ok(Json(MessageResponse::new("Course deleted successfully")))
}

// ---------------------------------------------------------------------------
// Batch planning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PlanAction {
    CreateBatches,
    RecalculateBatches,
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    action: PlanAction,
}

async fn distribution(
    Admin(_): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BatchDistributionSummary>> {
    Ok(Json(state.service.batch_distribution_summary(&id).await?))
}

async fn plan_batches(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PlanRequest>,
) -> AppResult<Json<BatchPlanResult>> {
    let plan = match request.action {
        PlanAction::CreateBatches => {
            state.service.create_batches_for_course(admin.actor(), &id).await?
        }
        PlanAction::RecalculateBatches => {
            state.service.recalculate_batches(admin.actor(), &id).await?
        }
    };
    tracing::info!(
        course_id = %id,
        action = ?request.action,
        batches = plan.batches.len(),
        "batches planned"
    );
    Ok(Json(plan))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LeftoverRequest {
    action: LeftoverAction,
    #[serde(default)]
    target_batch_id: Option<String>,
}

async fn leftover(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<LeftoverRequest>,
) -> AppResult<Json<LeftoverResult>> {
    let result = state
        .service
        .handle_leftover_batch(
            admin.actor(),
            &id,
            request.action,
            request.target_batch_id.as_deref(),
        )
        .await?;
    Ok(Json(result))
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

async fn list_batches(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(filter): Query<BatchFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<BatchListResponse>> {
    let (page, limit) = page.resolve(&state.general);
    let (batches, pagination) = state.service.list_batches(&filter, page, limit).await?;
    Ok(Json(BatchListResponse {
        batches,
        pagination,
    }))
}

async fn create_batch(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(input): Json<NewBatch>,
) -> AppResult<(StatusCode, Json<Batch>)> {
    let batch = state.service.create_batch(admin.actor(), &input).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

async fn get_batch(
    Admin(_): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Batch>> {
    Ok(Json(state.service.get_batch(&id).await?))
}

async fn update_batch(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<BatchUpdate>,
) -> AppResult<Json<Batch>> {
    Ok(Json(
        state.service.update_batch(admin.actor(), &id, &update).await?,
    ))
}

async fn delete_batch(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.service.delete_batch(admin.actor(), &id).await?;
    Ok(Json(MessageResponse::new("Batch deleted successfully")))
}

// ---------------------------------------------------------------------------
// Enrollments
// ---------------------------------------------------------------------------

async fn list_enrollments(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(filter): Query<EnrollmentFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<EnrollmentListResponse>> {
    let (page, limit) = page.resolve(&state.general);
    let (enrollments, pagination) = state
        .service
        .list_enrollments(&filter, page, limit)
        .await?;
    Ok(Json(EnrollmentListResponse {
        enrollments,
        pagination,
    }))
}

async fn create_enrollment(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(input): Json<NewEnrollment>,
) -> AppResult<(StatusCode, Json<Enrollment>)> {
    let enrollment = state.service.create_enrollment(admin.actor(), &input).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchChoice {
    batch_id: String,
    #[serde(default)]
    reason: Option<String>,
}

async fn assign_batch(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(choice): Json<BatchChoice>,
) -> AppResult<Json<Enrollment>> {
    Ok(Json(
        state
            .service
            .assign_batch(admin.actor(), &id, &choice.batch_id)
            .await?,
    ))
}

async fn transfer(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(choice): Json<BatchChoice>,
) -> AppResult<Json<Enrollment>> {
    Ok(Json(
        state
            .service
            .transfer_enrollment(admin.actor(), &id, &choice.batch_id, choice.reason)
            .await?,
    ))
}

async fn change_status(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<EnrollmentStatusChange>,
) -> AppResult<Json<Enrollment>> {
    Ok(Json(
        state
            .service
            .change_enrollment_status(admin.actor(), &id, &change)
            .await?,
    ))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct RoleQuery {
    role: Option<Role>,
}

async fn list_users(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(query): Query<RoleQuery>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<UserListResponse>> {
    let (page, limit) = page.resolve(&state.general);
    let (users, pagination) = state.service.list_users(query.role, page, limit).await?;
    Ok(Json(UserListResponse { users, pagination }))
}

async fn create_user(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(input): Json<NewUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = state.service.create_user(admin.actor(), &input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
struct RoleChange {
    role: String,
}

async fn update_role(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(change): Json<RoleChange>,
) -> AppResult<Json<User>> {
    let user = state
        .service
        .update_user_role(&admin.user_id, admin.role, &id, &change.role)
        .await?;
    Ok(Json(user))
}

async fn delete_user(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state
        .service
        .delete_user(&admin.user_id, admin.role, &id)
        .await?;
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

async fn list_trainers(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<User>>> {
    Ok(Json(state.service.list_trainers().await?))
}

async fn stats(Admin(_): Admin, State(state): State<AppState>) -> AppResult<Json<AdminStats>> {
    Ok(Json(state.service.admin_stats().await?))
}

async fn list_payments(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(filter): Query<PaymentFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<PaymentListResponse>> {
    let (page, limit) = page.resolve(&state.general);
    Ok(Json(state.service.list_payments(&filter, page, limit).await?))
}

async fn audit(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(filter): Query<AuditFilter>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    Ok(Json(state.service.query_audit(&filter).await?))
}
