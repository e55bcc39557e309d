//! Per-course lesson progress.

use chrono::Utc;

use campus_core::entities::{Progress, completion_percentage};
use campus_core::enums::{AuditAction, EntityType};
use campus_core::ids::PREFIX_PROGRESS;

use crate::error::DatabaseError;
use crate::helpers::{get_u32, parse_datetime};
use crate::service::CampusService;
use crate::updates::progress::ProgressUpdate;

const SELECT_COLS: &str =
    "id, student_id, course_id, completed_lessons, total_lessons, percentage, updated_at";

fn row_to_progress(row: &libsql::Row) -> Result<Progress, DatabaseError> {
    Ok(Progress {
        id: row.get::<String>(0)?,
        student_id: row.get::<String>(1)?,
        course_id: row.get::<String>(2)?,
        completed_lessons: get_u32(row, 3)?,
        total_lessons: get_u32(row, 4)?,
        percentage: get_u32(row, 5)?,
        updated_at: parse_datetime(&row.get::<String>(6)?)?,
    })
}

impl CampusService {
    /// Record how far a student got in a course. One row per
    /// `(student, course)`; later calls overwrite the counts.
    ///
    /// # Errors
    ///
    /// Returns `Validation` when more lessons are completed than exist, and
    /// `NotFound` for an unknown student or course.
    pub async fn upsert_progress(
        &self,
        student_id: &str,
        input: &ProgressUpdate,
    ) -> Result<Progress, DatabaseError> {
        if input.completed_lessons > input.total_lessons {
            return Err(DatabaseError::Validation(vec![
                "Completed lessons cannot exceed total lessons".into(),
            ]));
        }
        self.ensure_exists(EntityType::User, "Student", student_id)
            .await?;
        self.ensure_exists(EntityType::Course, "Course", &input.course_id)
            .await?;

        let _gate = self.gate().await;
        let percentage = completion_percentage(input.completed_lessons, input.total_lessons);
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_PROGRESS).await?;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "INSERT INTO progress ({SELECT_COLS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                     ON CONFLICT (student_id, course_id) DO UPDATE SET
                         completed_lessons = excluded.completed_lessons,
                         total_lessons = excluded.total_lessons,
                         percentage = excluded.percentage,
                         updated_at = excluded.updated_at
                     RETURNING {SELECT_COLS}"
                ),
                libsql::params![
                    id,
                    student_id,
                    input.course_id.as_str(),
                    i64::from(input.completed_lessons),
                    i64::from(input.total_lessons),
                    i64::from(percentage),
                    now.to_rfc3339()
                ],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        let progress = row_to_progress(&row)?;
        drop(rows);
        self.audit(
            Some(student_id),
            EntityType::Progress,
            &progress.id,
            AuditAction::Recorded,
            Some(serde_json::to_value(input)?),
        )
        .await?;
        tracing::debug!(
            student_id,
            course_id = %progress.course_id,
            percentage,
            "progress recorded"
        );
        Ok(progress)
    }

    /// A student's progress across courses, most recently touched first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn progress_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<Progress>, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM progress WHERE student_id = ?1
                     ORDER BY updated_at DESC"
                ),
                [student_id],
            )
            .await?;
        let mut progress = Vec::new();
        while let Some(row) = rows.next().await? {
            progress.push(row_to_progress(&row)?);
        }
        Ok(progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{published_course, student, test_service};
    use pretty_assertions::assert_eq;

    fn update(course_id: &str, completed: u32, total: u32) -> ProgressUpdate {
        ProgressUpdate {
            course_id: course_id.to_string(),
            completed_lessons: completed,
            total_lessons: total,
        }
    }

    #[tokio::test]
    async fn upsert_keeps_one_row_per_course() {
        let svc = test_service().await;
        let course = published_course(&svc, 20, 10).await;
        let s = student(&svc, 1).await;

        let first = svc.upsert_progress(&s.id, &update(&course.id, 1, 3)).await.unwrap();
        assert_eq!(first.percentage, 33);
        let second = svc.upsert_progress(&s.id, &update(&course.id, 2, 3)).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.percentage, 67);

        let all = svc.progress_for_student(&s.id).await.unwrap();
        assert_eq!(all, vec![second]);
    }

    #[tokio::test]
    async fn completed_cannot_exceed_total() {
        let svc = test_service().await;
        let course = published_course(&svc, 20, 10).await;
        let s = student(&svc, 1).await;
        let err = svc
            .upsert_progress(&s.id, &update(&course.id, 4, 3))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));

        let err = svc
            .upsert_progress(&s.id, &update("crs-missing", 1, 3))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Course not found: crs-missing");
    }
}
