//! Repository modules: one `impl CampusService` block per entity.

pub mod attendance;
pub mod audit;
pub mod batch;
pub mod blog;
pub mod class_session;
pub mod course;
pub mod enrollment;
pub mod homepage_ad;
pub mod material;
pub mod payment;
pub mod progress;
pub mod stats;
pub mod user;
