//! Entity structs for all Campus domain objects.
//!
//! Each entity maps to a table in the libSQL database (see
//! `campus-db/migrations/001_initial.sql`). All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema`; the wire format is camelCase JSON.

mod attendance;
mod audit;
mod batch;
mod blog;
mod class_session;
mod course;
mod enrollment;
mod homepage_ad;
mod material;
mod payment;
mod progress;
mod user;

pub use attendance::Attendance;
pub use audit::AuditEntry;
pub use batch::{Batch, MeetingSchedule};
pub use blog::{BlogPost, estimate_read_time, slugify};
pub use class_session::{ClassSession, minutes_between};
pub use course::{
    BatchTypeConfig, BatchTypeSummary, BatchTypes, Course, CourseBatchSummary, OfflineMaterial,
    OfflineMaterials, PriceBreakdown, Pricing,
};
pub use enrollment::{Enrollment, EnrollmentPayment, EnrollmentProgress, TaskTally, TransferRecord};
pub use homepage_ad::HomepageAd;
pub use material::Material;
pub use payment::Payment;
pub use progress::{Progress, completion_percentage};
pub use user::User;
