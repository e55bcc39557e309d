//! Demo data for `campus seed`.
//!
//! Safe to run more than once: users are matched by email and courses are
//! only created when the catalog is empty.

use chrono::{Datelike, Months, Utc};

use campus_core::entities::{BatchTypeConfig, BatchTypes, OfflineMaterials, PriceBreakdown, Pricing};
use campus_core::enums::{CourseStatus, Language, Level, Role};
use campus_db::error::DatabaseError;
use campus_db::repos::course::CourseFilter;
use campus_db::service::CampusService;
use campus_db::updates::course::NewCourse;
use campus_db::updates::user::NewUser;

/// Password given to every demo account.
pub const DEMO_PASSWORD: &str = "campus123";

const DEMO_USERS: [(&str, &str, Role); 4] = [
    ("Campus Admin", "admin@campus.local", Role::Admin),
    ("Anke Weber", "trainer@campus.local", Role::Trainer),
    ("Lucie Martin", "trainer2@campus.local", Role::Trainer),
    ("Ravi Kumar", "student@campus.local", Role::Student),
];

/// What a seed run created.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub courses_created: usize,
}

fn price(base: u64, material: u64) -> PriceBreakdown {
    PriceBreakdown {
        base_price: base,
        offline_material_cost: material,
        total_price: base + material,
    }
}

fn demo_course(language: Language, level: Level, trainer_id: Option<&str>) -> NewCourse {
    let start = Utc::now()
        .checked_add_months(Months::new(1))
        .unwrap_or_else(Utc::now);
    NewCourse {
        name: None,
        language,
        level,
        month: start.month(),
        year: start.year(),
        total_capacity: 40,
        course_duration: 3,
        batch_size_limit: 10,
        batch_types: BatchTypes {
            regular: BatchTypeConfig {
                enabled: true,
                student_count: 0,
            },
            revision: BatchTypeConfig {
                enabled: true,
                student_count: 0,
            },
        },
        pricing: Pricing {
            regular: price(12_000, 1_500),
            revision: price(6_000, 0),
        },
        offline_materials: OfflineMaterials::default(),
        description: format!(
            "{} {} course with live online classes",
            language.as_str(),
            level.as_str()
        ),
        instructor_id: trainer_id.map(String::from),
        trainer_ids: trainer_id.map(String::from).into_iter().collect(),
        status: Some(CourseStatus::Published),
    }
}

/// Create demo users and courses.
///
/// # Errors
///
/// Returns `DatabaseError` if a write fails.
pub async fn seed(service: &CampusService) -> Result<SeedReport, DatabaseError> {
    let mut report = SeedReport::default();
    let mut trainer_id = None;

    for (name, email, role) in DEMO_USERS {
        let user = match service.find_user_by_email(email).await? {
            Some(user) => user,
            None => {
                report.users_created += 1;
                service
                    .create_user(
                        None,
                        &NewUser {
                            name: name.to_string(),
                            email: email.to_string(),
                            password: DEMO_PASSWORD.to_string(),
                            role: Some(role.as_str().to_string()),
                            ..NewUser::default()
                        },
                    )
                    .await?
            }
        };
        if role == Role::Trainer && trainer_id.is_none() {
            trainer_id = Some(user.id);
        }
    }

    let (_, existing) = service
        .list_courses(&CourseFilter::default(), 1, 1)
        .await?;
    if existing.total == 0 {
        for (language, level) in [
            (Language::German, Level::A1),
            (Language::German, Level::B1),
            (Language::French, Level::A2),
        ] {
            service
                .create_course(None, &demo_course(language, level, trainer_id.as_deref()))
                .await?;
            report.courses_created += 1;
        }
    }

    tracing::info!(
        users = report.users_created,
        courses = report.courses_created,
        "seed complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn seeding_twice_creates_nothing_new() {
        let svc = CampusService::new_local(":memory:").await.unwrap();
        let first = seed(&svc).await.unwrap();
        assert_eq!(
            first,
            SeedReport {
                users_created: 4,
                courses_created: 3,
            }
        );
        assert_eq!(seed(&svc).await.unwrap(), SeedReport::default());

        let admin = svc
            .verify_credentials("admin@campus.local", DEMO_PASSWORD)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(admin.role, Role::Admin);
    }
}
