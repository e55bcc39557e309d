//! Status enums, classification enums, and audit vocabulary for Campus.
//!
//! Storage strings come from `as_str()` and match the serde representation, so
//! repositories can round-trip any enum through a TEXT column. Status enums with
//! a lifecycle provide `allowed_next_states()` to enforce valid transitions at
//! the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Role of a user. Gates routes and permitted actions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Trainer,
    #[default]
    Student,
}

impl Role {
    pub const ALL: [Self; 3] = [Self::Admin, Self::Trainer, Self::Student];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Trainer => "trainer",
            Self::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role '{s}'"))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// UserStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Invited,
}

impl UserStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Invited => "invited",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Language / Level
// ---------------------------------------------------------------------------

/// Language taught by a course or covered by a blog post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Language {
    English,
    German,
    French,
    Spanish,
    Italian,
    Portuguese,
    Russian,
    Chinese,
    Japanese,
    Korean,
    Arabic,
    Hindi,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::German => "German",
            Self::French => "French",
            Self::Spanish => "Spanish",
            Self::Italian => "Italian",
            Self::Portuguese => "Portuguese",
            Self::Russian => "Russian",
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::Korean => "Korean",
            Self::Arabic => "Arabic",
            Self::Hindi => "Hindi",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proficiency level of a course (CEFR bands plus coarse levels).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Level {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A1 => "A1",
            Self::A2 => "A2",
            Self::B1 => "B1",
            Self::B2 => "B2",
            Self::C1 => "C1",
            Self::C2 => "C2",
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CourseStatus
// ---------------------------------------------------------------------------

/// Status of a course.
///
/// ```text
/// draft → published → active → completed
///       ↖ (unpublish)
/// any non-terminal → cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    Draft,
    Published,
    Active,
    Completed,
    Cancelled,
}

impl CourseStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Draft => &[Self::Published, Self::Cancelled],
            Self::Published => &[Self::Active, Self::Draft, Self::Cancelled],
            Self::Active => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether students can place orders for the course.
    #[must_use]
    pub const fn is_open_for_enrollment(self) -> bool {
        matches!(self, Self::Published | Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CourseCategory
// ---------------------------------------------------------------------------

/// Catalog category accepted by the course form validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseCategory {
    Programming,
    Design,
    Business,
    Marketing,
}

impl CourseCategory {
    pub const ALL: [Self; 4] = [
        Self::Programming,
        Self::Design,
        Self::Business,
        Self::Marketing,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Programming => "programming",
            Self::Design => "design",
            Self::Business => "business",
            Self::Marketing => "marketing",
        }
    }
}

impl fmt::Display for CourseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BatchType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchType {
    #[default]
    Regular,
    Revision,
}

impl BatchType {
    pub const ALL: [Self; 2] = [Self::Regular, Self::Revision];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Revision => "revision",
        }
    }

    /// Capitalized form used in generated batch names.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Regular => "Regular",
            Self::Revision => "Revision",
        }
    }
}

impl fmt::Display for BatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BatchStatus
// ---------------------------------------------------------------------------

/// Status of a batch.
///
/// ```text
/// upcoming → active → completed
///          ↘ cancelled ↙
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

impl BatchStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Upcoming => &[Self::Active, Self::Cancelled],
            Self::Active => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Whether the batch still accepts students.
    #[must_use]
    pub const fn accepts_students(self) -> bool {
        matches!(self, Self::Upcoming | Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EnrollmentStatus
// ---------------------------------------------------------------------------

/// Status of an enrollment.
///
/// ```text
/// pending → enrolled → active → completed
///                             → dropped
///         ↘ active            → transferred → active
/// pending/enrolled → cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Enrolled,
    Active,
    Completed,
    Dropped,
    Cancelled,
    Transferred,
}

impl EnrollmentStatus {
    #[must_use]
    #[allow(clippy::match_same_arms)]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Enrolled, Self::Active, Self::Cancelled],
            Self::Enrolled => &[
                Self::Active,
                Self::Dropped,
                Self::Cancelled,
                Self::Transferred,
            ],
            Self::Active => &[Self::Completed, Self::Dropped, Self::Transferred],
            Self::Transferred => &[Self::Active],
            Self::Completed | Self::Dropped | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Statuses that hold a seat in the course and block a duplicate enrollment.
    #[must_use]
    pub const fn holds_seat(self) -> bool {
        matches!(self, Self::Pending | Self::Enrolled | Self::Active)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Enrolled => "enrolled",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Dropped => "dropped",
            Self::Cancelled => "cancelled",
            Self::Transferred => "transferred",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PaymentState
// ---------------------------------------------------------------------------

/// Payment state recorded on an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Status of a payment order.
///
/// ```text
/// created → paid
///         → failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Created,
    Paid,
    Failed,
}

impl OrderStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Created => &[Self::Paid, Self::Failed],
            Self::Paid | Self::Failed => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SessionType / SessionStatus
// ---------------------------------------------------------------------------

/// Kind of a class session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Lecture,
    Workshop,
    Review,
    Exam,
    Practical,
    Assignment,
}

impl SessionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lecture => "lecture",
            Self::Workshop => "workshop",
            Self::Review => "review",
            Self::Exam => "exam",
            Self::Practical => "practical",
            Self::Assignment => "assignment",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a class session.
///
/// ```text
/// scheduled → in_progress → completed
///           → postponed → scheduled
///           → cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Postponed,
}

impl SessionStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Scheduled => &[Self::InProgress, Self::Cancelled, Self::Postponed],
            Self::Postponed => &[Self::Scheduled, Self::Cancelled],
            Self::InProgress => &[Self::Completed],
            Self::Completed | Self::Cancelled => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Postponed => "postponed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Weekday
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

// ---------------------------------------------------------------------------
// Blog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlogType {
    #[default]
    Text,
    Video,
    Mixed,
}

impl BlogType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Video => "video",
            Self::Mixed => "mixed",
        }
    }
}

impl fmt::Display for BlogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Editorial category of a blog post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BlogCategory {
    #[serde(rename = "Learning Tips")]
    LearningTips,
    #[serde(rename = "Cultural Insights")]
    CulturalInsights,
    #[serde(rename = "Study Plans")]
    StudyPlans,
    Psychology,
    Technology,
    Immersion,
    Grammar,
    Vocabulary,
    Pronunciation,
    Conversation,
    Reading,
    Writing,
    Listening,
    Speaking,
}

impl BlogCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LearningTips => "Learning Tips",
            Self::CulturalInsights => "Cultural Insights",
            Self::StudyPlans => "Study Plans",
            Self::Psychology => "Psychology",
            Self::Technology => "Technology",
            Self::Immersion => "Immersion",
            Self::Grammar => "Grammar",
            Self::Vocabulary => "Vocabulary",
            Self::Pronunciation => "Pronunciation",
            Self::Conversation => "Conversation",
            Self::Reading => "Reading",
            Self::Writing => "Writing",
            Self::Listening => "Listening",
            Self::Speaking => "Speaking",
        }
    }
}

impl fmt::Display for BlogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Homepage ads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdType {
    Popup,
    Banner,
    Toast,
    Badge,
    Flyer,
    FloatingButton,
}

impl AdType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Popup => "popup",
            Self::Banner => "banner",
            Self::Toast => "toast",
            Self::Badge => "badge",
            Self::Flyer => "flyer",
            Self::FloatingButton => "floating_button",
        }
    }
}

impl fmt::Display for AdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdFrequency {
    #[default]
    PerSession,
    PerDay,
    Always,
}

impl AdFrequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PerSession => "per_session",
            Self::PerDay => "per_day",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for AdFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a homepage ad is shown to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TargetAudience {
    #[default]
    All,
    Guest,
    LoggedIn,
    RoleBased,
}

impl TargetAudience {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Guest => "guest",
            Self::LoggedIn => "logged_in",
            Self::RoleBased => "role_based",
        }
    }
}

impl fmt::Display for TargetAudience {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PublishStatus {
    #[default]
    Draft,
    Published,
}

impl PublishStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interaction counted against a homepage ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdEvent {
    Impression,
    Click,
    Close,
}

impl AdEvent {
    /// Counter column incremented by this event.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Impression => "impressions",
            Self::Click => "clicks",
            Self::Close => "closes",
        }
    }
}

// ---------------------------------------------------------------------------
// Materials / attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaterialType {
    Pdf,
    Video,
    Doc,
    Link,
}

impl MaterialType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Video => "video",
            Self::Doc => "doc",
            Self::Link => "link",
        }
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MaterialStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

impl MaterialStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for MaterialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    /// Whether the student counts as having attended.
    #[must_use]
    pub const fn counts_as_attended(self) -> bool {
        matches!(self, Self::Present | Self::Late)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Late => "late",
            Self::Excused => "excused",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Batch planning
// ---------------------------------------------------------------------------

/// Resolution for a leftover batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LeftoverAction {
    Merge,
    Leave,
}

// ---------------------------------------------------------------------------
// EntityType / AuditAction
// ---------------------------------------------------------------------------

/// Entity kinds recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    User,
    Course,
    Batch,
    Enrollment,
    ClassSession,
    Payment,
    Blog,
    HomepageAd,
    Material,
    Progress,
    Attendance,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Course => "course",
            Self::Batch => "batch",
            Self::Enrollment => "enrollment",
            Self::ClassSession => "class_session",
            Self::Payment => "payment",
            Self::Blog => "blog",
            Self::HomepageAd => "homepage_ad",
            Self::Material => "material",
            Self::Progress => "progress",
            Self::Attendance => "attendance",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutation kinds recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    StatusChanged,
    Enrolled,
    Assigned,
    Transferred,
    Merged,
    Planned,
    Paid,
    Failed,
    Recorded,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::StatusChanged => "status_changed",
            Self::Enrolled => "enrolled",
            Self::Assigned => "assigned",
            Self::Transferred => "transferred",
            Self::Merged => "merged",
            Self::Planned => "planned",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Recorded => "recorded",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_serde_roundtrip {
        ($name:ident, $ty:ty, $variant:expr, $expected:expr) => {
            #[test]
            fn $name() {
                let val: $ty = $variant;
                let json = serde_json::to_string(&val).unwrap();
                assert_eq!(json, format!("\"{}\"", $expected));
                let parsed: $ty = serde_json::from_str(&json).unwrap();
                assert_eq!(parsed, val);
                assert_eq!(val.as_str(), $expected);
            }
        };
    }

    test_serde_roundtrip!(role_admin, Role, Role::Admin, "admin");
    test_serde_roundtrip!(role_student, Role, Role::Student, "student");
    test_serde_roundtrip!(language_german, Language, Language::German, "German");
    test_serde_roundtrip!(level_b2, Level, Level::B2, "B2");
    test_serde_roundtrip!(
        course_status_published,
        CourseStatus,
        CourseStatus::Published,
        "published"
    );
    test_serde_roundtrip!(batch_type_revision, BatchType, BatchType::Revision, "revision");
    test_serde_roundtrip!(
        enrollment_transferred,
        EnrollmentStatus,
        EnrollmentStatus::Transferred,
        "transferred"
    );
    test_serde_roundtrip!(
        session_in_progress,
        SessionStatus,
        SessionStatus::InProgress,
        "in_progress"
    );
    test_serde_roundtrip!(
        blog_category_spaced,
        BlogCategory,
        BlogCategory::LearningTips,
        "Learning Tips"
    );
    test_serde_roundtrip!(
        ad_type_floating,
        AdType,
        AdType::FloatingButton,
        "floating_button"
    );
    test_serde_roundtrip!(
        audience_logged_in,
        TargetAudience,
        TargetAudience::LoggedIn,
        "logged_in"
    );
    test_serde_roundtrip!(
        entity_class_session,
        EntityType,
        EntityType::ClassSession,
        "class_session"
    );
    test_serde_roundtrip!(
        audit_status_changed,
        AuditAction,
        AuditAction::StatusChanged,
        "status_changed"
    );

    // --- Transition tests ---

    #[test]
    fn course_valid_transitions() {
        assert!(CourseStatus::Draft.can_transition_to(CourseStatus::Published));
        assert!(CourseStatus::Published.can_transition_to(CourseStatus::Active));
        assert!(CourseStatus::Published.can_transition_to(CourseStatus::Draft));
        assert!(CourseStatus::Active.can_transition_to(CourseStatus::Completed));
        assert!(CourseStatus::Active.can_transition_to(CourseStatus::Cancelled));
    }

    #[test]
    fn course_invalid_transitions() {
        assert!(!CourseStatus::Draft.can_transition_to(CourseStatus::Completed));
        assert!(!CourseStatus::Completed.can_transition_to(CourseStatus::Active));
        assert!(CourseStatus::Cancelled.allowed_next_states().is_empty());
    }

    #[test]
    fn batch_transitions() {
        assert!(BatchStatus::Upcoming.can_transition_to(BatchStatus::Active));
        assert!(BatchStatus::Active.can_transition_to(BatchStatus::Completed));
        assert!(!BatchStatus::Upcoming.can_transition_to(BatchStatus::Completed));
        assert!(!BatchStatus::Completed.can_transition_to(BatchStatus::Active));
    }

    #[test]
    fn enrollment_transitions() {
        assert!(EnrollmentStatus::Pending.can_transition_to(EnrollmentStatus::Active));
        assert!(EnrollmentStatus::Active.can_transition_to(EnrollmentStatus::Dropped));
        assert!(EnrollmentStatus::Transferred.can_transition_to(EnrollmentStatus::Active));
        assert!(!EnrollmentStatus::Completed.can_transition_to(EnrollmentStatus::Active));
        assert!(!EnrollmentStatus::Dropped.can_transition_to(EnrollmentStatus::Active));
        assert!(!EnrollmentStatus::Pending.can_transition_to(EnrollmentStatus::Completed));
    }

    #[test]
    fn session_transitions() {
        assert!(SessionStatus::Scheduled.can_transition_to(SessionStatus::Postponed));
        assert!(SessionStatus::Postponed.can_transition_to(SessionStatus::Scheduled));
        assert!(SessionStatus::InProgress.can_transition_to(SessionStatus::Completed));
        assert!(!SessionStatus::Scheduled.can_transition_to(SessionStatus::Completed));
        assert!(SessionStatus::Completed.allowed_next_states().is_empty());
    }

    #[test]
    fn order_transitions() {
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Paid));
        assert!(OrderStatus::Created.can_transition_to(OrderStatus::Failed));
        assert!(!OrderStatus::Paid.can_transition_to(OrderStatus::Failed));
    }

    #[test]
    fn seat_holding_statuses() {
        assert!(EnrollmentStatus::Pending.holds_seat());
        assert!(EnrollmentStatus::Enrolled.holds_seat());
        assert!(EnrollmentStatus::Active.holds_seat());
        assert!(!EnrollmentStatus::Dropped.holds_seat());
        assert!(!EnrollmentStatus::Completed.holds_seat());
    }

    #[test]
    fn role_parses_from_header_value() {
        assert_eq!("trainer".parse::<Role>(), Ok(Role::Trainer));
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(format!("{}", Role::Admin), "admin");
        assert_eq!(format!("{}", Level::C1), "C1");
        assert_eq!(format!("{}", BlogCategory::StudyPlans), "Study Plans");
        assert_eq!(format!("{}", SessionStatus::InProgress), "in_progress");
        assert_eq!(format!("{}", AuditAction::Transferred), "transferred");
    }
}
