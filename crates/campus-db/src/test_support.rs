//! Shared fixtures for the repo unit tests.

pub mod helpers {
    use chrono::{Duration, Utc};

    use campus_core::entities::{Batch, Course, MeetingSchedule, User};
    use campus_core::enums::{BatchType, CourseStatus, Language, Level, Role, UserStatus};
    use campus_core::ids::PREFIX_USER;

    use crate::service::CampusService;
    use crate::updates::batch::NewBatch;
    use crate::updates::course::NewCourse;
    use crate::updates::user::NewUser;

    pub const TEST_PASSWORD: &str = "secret123";

    pub async fn test_service() -> CampusService {
        CampusService::new_local(":memory:").await.unwrap()
    }

    pub fn new_user(name: &str, email: &str, role: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            role: Some(role.to_string()),
            status: None,
            phone: None,
        }
    }

    /// German A1, March 2026, three months, regular batches only.
    pub fn new_course(total_capacity: u32, batch_size_limit: u32) -> NewCourse {
        NewCourse {
            name: None,
            language: Language::German,
            level: Level::A1,
            month: 3,
            year: 2026,
            total_capacity,
            course_duration: 3,
            batch_size_limit,
            batch_types: campus_core::entities::BatchTypes {
                regular: campus_core::entities::BatchTypeConfig {
                    enabled: true,
                    student_count: 0,
                },
                revision: campus_core::entities::BatchTypeConfig::default(),
            },
            pricing: campus_core::entities::Pricing::default(),
            offline_materials: campus_core::entities::OfflineMaterials::default(),
            description: "Intensive beginner German".to_string(),
            instructor_id: None,
            trainer_ids: Vec::new(),
            status: None,
        }
    }

    /// Insert an account directly, skipping password hashing.
    pub async fn raw_user(svc: &CampusService, name: &str, email: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: svc.db().generate_id(PREFIX_USER).await.unwrap(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            status: UserStatus::Active,
            phone: None,
            created_at: now,
            updated_at: now,
        };
        svc.db()
            .conn()
            .execute(
                "INSERT INTO users (id, name, email, password_hash, role, status, created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'unusable', ?4, 'active', ?5, ?6)",
                libsql::params![
                    user.id.as_str(),
                    user.name.as_str(),
                    user.email.as_str(),
                    role.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await
            .unwrap();
        user
    }

    pub async fn trainer(svc: &CampusService) -> User {
        raw_user(svc, "Tara Trainer", "trainer@example.com", Role::Trainer).await
    }

    pub async fn student(svc: &CampusService, n: usize) -> User {
        raw_user(
            svc,
            &format!("Student {n}"),
            &format!("student{n}@example.com"),
            Role::Student,
        )
        .await
    }

    pub async fn published_course(
        svc: &CampusService,
        total_capacity: u32,
        batch_size_limit: u32,
    ) -> Course {
        let mut input = new_course(total_capacity, batch_size_limit);
        input.status = Some(CourseStatus::Published);
        svc.create_course(None, &input).await.unwrap()
    }

    /// A hand-made regular batch starting next week.
    pub fn new_batch(course_id: &str, trainer_id: &str, max_students: i64) -> NewBatch {
        let start = Utc::now() + Duration::days(7);
        NewBatch {
            name: Some("Evening Batch".to_string()),
            course_id: Some(course_id.to_string()),
            trainer_id: Some(trainer_id.to_string()),
            batch_type: BatchType::Regular,
            start_date: Some(start),
            end_date: Some(start + Duration::days(60)),
            max_students: Some(max_students),
            duration: None,
            meeting_schedule: MeetingSchedule::default(),
            notes: None,
        }
    }

    pub async fn batch(
        svc: &CampusService,
        course_id: &str,
        trainer_id: &str,
        max_students: i64,
    ) -> Batch {
        svc.create_batch(None, &new_batch(course_id, trainer_id, max_students))
            .await
            .unwrap()
    }
}
