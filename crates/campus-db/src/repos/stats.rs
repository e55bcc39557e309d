//! Dashboard aggregates for admins, trainers, and students.

use chrono::Utc;

use campus_core::stats::{AdminStats, StudentStats, TrainerStats, minutes_to_hours};

use crate::error::DatabaseError;
use crate::helpers::first_u64;
use crate::service::CampusService;

impl CampusService {
    async fn count(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<u64, DatabaseError> {
        first_u64(self.db().conn().query(sql, params).await?).await
    }

    /// Platform totals. Revenue sums paid orders only.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn admin_stats(&self) -> Result<AdminStats, DatabaseError> {
        let _gate = self.gate().await;
        Ok(AdminStats {
            total_users: self.count("SELECT COUNT(*) FROM users", ()).await?,
            total_courses: self.count("SELECT COUNT(*) FROM courses", ()).await?,
            total_trainers: self
                .count("SELECT COUNT(*) FROM users WHERE role = 'trainer'", ())
                .await?,
            total_batches: self.count("SELECT COUNT(*) FROM batches", ()).await?,
            total_enrollments: self.count("SELECT COUNT(*) FROM enrollments", ()).await?,
            total_revenue: self
                .count(
                    "SELECT COALESCE(SUM(amount), 0) FROM payments WHERE status = 'paid'",
                    (),
                )
                .await?,
            active_students: self
                .count(
                    "SELECT COUNT(DISTINCT student_id) FROM enrollments WHERE status = 'active'",
                    (),
                )
                .await?,
            completed_courses: self
                .count("SELECT COUNT(*) FROM courses WHERE status = 'completed'", ())
                .await?,
        })
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn trainer_stats(&self, trainer_id: &str) -> Result<TrainerStats, DatabaseError> {
        let _gate = self.gate().await;
        let completed_minutes = self
            .count(
                "SELECT COALESCE(SUM(duration), 0) FROM class_sessions
                 WHERE trainer_id = ?1 AND status = 'completed'",
                [trainer_id],
            )
            .await?;
        Ok(TrainerStats {
            total_batches: self
                .count("SELECT COUNT(*) FROM batches WHERE trainer_id = ?1", [trainer_id])
                .await?,
            total_students: self
                .count(
                    "SELECT COALESCE(SUM(current_students), 0) FROM batches WHERE trainer_id = ?1",
                    [trainer_id],
                )
                .await?,
            upcoming_sessions: self
                .count(
                    "SELECT COUNT(*) FROM class_sessions
                     WHERE trainer_id = ?1 AND status = 'scheduled' AND scheduled_date >= ?2",
                    libsql::params![trainer_id, Utc::now().to_rfc3339()],
                )
                .await?,
            completed_sessions: self
                .count(
                    "SELECT COUNT(*) FROM class_sessions
                     WHERE trainer_id = ?1 AND status = 'completed'",
                    [trainer_id],
                )
                .await?,
            total_hours: minutes_to_hours(completed_minutes),
        })
    }

    /// Enrolled courses count every enrollment not dropped or cancelled.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn student_stats(&self, student_id: &str) -> Result<StudentStats, DatabaseError> {
        let _gate = self.gate().await;
        let enrolled = self
            .count(
                "SELECT COUNT(*) FROM enrollments
                 WHERE student_id = ?1 AND status NOT IN ('dropped', 'cancelled')",
                [student_id],
            )
            .await?;
        let progress = self.progress_for_student(student_id).await?;
        let upcoming = self.student_schedule(student_id).await?.len() as u64;
        Ok(StudentStats::from_progress(enrolled, &progress, upcoming))
    }
}
