//! Blog posts and homepage ads, both the admin side and the public side.

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};

use campus_core::entities::{BlogPost, HomepageAd};
use campus_core::enums::{AdEvent, PublishStatus};
use campus_core::responses::{BlogListResponse, BlogPostResponse, MessageResponse, Pagination};
use campus_db::updates::blog::{BlogFilter, BlogUpdate, NewBlogPost};
use campus_db::updates::homepage_ad::{HomepageAdUpdate, NewHomepageAd};

use crate::error::{AppError, AppResult};
use crate::identity::{Admin, MaybeIdentity};
use crate::json::Json;
use crate::pagination::PageQuery;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/admin/blog", get(admin_list_posts).post(create_post))
        .route(
            "/api/admin/blog/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/admin/homepage-ads", get(list_ads).post(create_ad))
        .route(
            "/api/admin/homepage-ads/{id}",
            get(get_ad).put(update_ad).delete(delete_ad),
        )
        .route("/api/blog", get(public_posts))
        .route("/api/blog/upload-video", post(upload_video))
        .route("/api/blog/{slug}", get(view_post))
        .route("/api/homepage-ads", get(active_ads))
        .route("/api/homepage-ads/{id}/track", post(track))
}

// ---------------------------------------------------------------------------
// Blog
// ---------------------------------------------------------------------------

async fn admin_list_posts(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(filter): Query<BlogFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<BlogListResponse>> {
    let (page, limit) = page.resolve(&state.general);
    Ok(Json(state.service.list_blog_posts(&filter, page, limit).await?))
}

async fn create_post(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(input): Json<NewBlogPost>,
) -> AppResult<(StatusCode, Json<BlogPost>)> {
    let post = state.service.create_blog_post(&admin.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn get_post(
    Admin(_): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BlogPost>> {
    Ok(Json(state.service.get_blog_post(&id).await?))
}

async fn update_post(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<BlogUpdate>,
) -> AppResult<Json<BlogPost>> {
    Ok(Json(
        state
            .service
            .update_blog_post(admin.actor(), &id, &update)
            .await?,
    ))
}

async fn delete_post(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.service.delete_blog_post(admin.actor(), &id).await?;
    Ok(Json(MessageResponse::new("Blog post deleted successfully")))
}

async fn public_posts(
    State(state): State<AppState>,
    Query(mut filter): Query<BlogFilter>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<BlogListResponse>> {
    filter.published_only = true;
    let (page, limit) = page.resolve(&state.general);
    Ok(Json(state.service.list_blog_posts(&filter, page, limit).await?))
}

async fn view_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogPostResponse>> {
    Ok(Json(state.service.view_blog_post(&slug).await?))
}

async fn upload_video(Admin(_): Admin) -> AppError {
    AppError::NotImplemented("Video upload is not supported".into())
}

// ---------------------------------------------------------------------------
// Homepage ads
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct AdListResponse {
    ads: Vec<HomepageAd>,
    pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
struct StatusQuery {
    status: Option<PublishStatus>,
}

async fn list_ads(
    Admin(_): Admin,
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<AdListResponse>> {
    let (page, limit) = page.resolve(&state.general);
    let (ads, pagination) = state
        .service
        .list_homepage_ads(query.status, page, limit)
        .await?;
    Ok(Json(AdListResponse { ads, pagination }))
}

async fn create_ad(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(input): Json<NewHomepageAd>,
) -> AppResult<(StatusCode, Json<HomepageAd>)> {
    let ad = state.service.create_homepage_ad(&admin.user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(ad)))
}

async fn get_ad(
    Admin(_): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<HomepageAd>> {
    Ok(Json(state.service.get_homepage_ad(&id).await?))
}

async fn update_ad(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<HomepageAdUpdate>,
) -> AppResult<Json<HomepageAd>> {
    Ok(Json(
        state
            .service
            .update_homepage_ad(admin.actor(), &id, &update)
            .await?,
    ))
}

async fn delete_ad(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.service.delete_homepage_ad(admin.actor(), &id).await?;
    Ok(Json(MessageResponse::new("Homepage ad deleted successfully")))
}

/// Anonymous callers only see ads aimed at everyone.
async fn active_ads(
    MaybeIdentity(identity): MaybeIdentity,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<HomepageAd>>> {
    let role = identity.map(|i| i.role);
    Ok(Json(state.service.active_homepage_ads(role).await?))
}

#[derive(Debug, Deserialize)]
struct TrackRequest {
    action: AdEvent,
}

async fn track(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<TrackRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.service.track_ad_event(&id, request.action).await?;
    Ok(Json(MessageResponse::new("Event tracked")))
}
