//! Route table. Everything is mounted under `/api`.

use axum::Router;

use crate::state::AppState;

mod admin;
mod catalog;
mod content;
mod payments;
mod student;
mod trainer;
mod validate;

/// All API routes, not yet bound to state.
pub fn api() -> Router<AppState> {
    Router::new()
        .merge(catalog::routes())
        .merge(admin::routes())
        .merge(content::routes())
        .merge(trainer::routes())
        .merge(student::routes())
        .merge(payments::routes())
        .merge(validate::routes())
}
