//! Daily attendance, and the attendance figure it feeds on enrollments.

use chrono::Utc;

use campus_core::entities::Attendance;
use campus_core::enums::{AuditAction, EntityType, Role};
use campus_core::errors::CoreError;
use campus_core::ids::PREFIX_ATTENDANCE;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, parse_date, parse_datetime, parse_enum, to_json};
use crate::repos::enrollment::SELECT_COLS as ENROLLMENT_COLS;
use crate::service::{CampusService, finish};
use crate::updates::attendance::MarkAttendance;

const SELECT_COLS: &str =
    "id, batch_id, student_id, date, status, marked_by, created_at, updated_at";

fn row_to_attendance(row: &libsql::Row) -> Result<Attendance, DatabaseError> {
    Ok(Attendance {
        id: row.get::<String>(0)?,
        batch_id: row.get::<String>(1)?,
        student_id: row.get::<String>(2)?,
        date: parse_date(&row.get::<String>(3)?)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        marked_by: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

/// Share of marked days the student attended, rounded to a whole percent.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn attendance_percentage(records: &[Attendance]) -> u32 {
    if records.is_empty() {
        return 0;
    }
    let attended = records.iter().filter(|r| r.status.counts_as_attended()).count();
    (attended as f64 * 100.0 / records.len() as f64).round() as u32
}

impl CampusService {
    /// Mark one student for one day. Marking the same day again overwrites
    /// the status. The student's enrollment progress picks up the new
    /// attendance percentage in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `Forbidden` when a trainer marks another trainer's batch,
    /// `Validation` when the student has no seat in the batch, and
    /// `NotFound` for an unknown batch.
    pub async fn mark_attendance(
        &self,
        marked_by: &str,
        role: Role,
        input: &MarkAttendance,
    ) -> Result<Attendance, DatabaseError> {
        let _gate = self.gate().await;
        let batch = self.get_batch(&input.batch_id).await?;
        if role == Role::Trainer && batch.trainer_id.as_deref() != Some(marked_by) {
            return Err(CoreError::Forbidden(
                "You can only mark attendance for your own batches".into(),
            )
            .into());
        }

        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            let enrollment = self
                .collect_enrollments(
                    &format!(
                        "SELECT {ENROLLMENT_COLS} FROM enrollments
                         WHERE student_id = ?1 AND batch_id = ?2
                           AND status NOT IN ('dropped', 'cancelled')"
                    ),
                    libsql::params![input.student_id.as_str(), batch.id.as_str()],
                )
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    DatabaseError::Validation(vec!["Student is not enrolled in this batch".into()])
                })?;

            let now = Utc::now();
            let id = self.db().generate_id(PREFIX_ATTENDANCE).await?;
            let mut rows = self
                .db()
                .conn()
                .query(
                    &format!(
                        "INSERT INTO attendance ({SELECT_COLS})
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                         ON CONFLICT (batch_id, student_id, date) DO UPDATE SET
                             status = excluded.status,
                             marked_by = excluded.marked_by,
                             updated_at = excluded.updated_at
                         RETURNING {SELECT_COLS}"
                    ),
                    libsql::params![
                        id,
                        batch.id.as_str(),
                        input.student_id.as_str(),
                        input.date.to_string(),
                        input.status.as_str(),
                        marked_by,
                        now.to_rfc3339(),
                        now.to_rfc3339()
                    ],
                )
                .await?;
            let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
            let record = row_to_attendance(&row)?;
            drop(rows);

            let history = self.attendance_for_student(&batch.id, &input.student_id).await?;
            let mut progress = enrollment.progress.clone();
            progress.attendance = attendance_percentage(&history);
            self.db()
                .conn()
                .execute(
                    "UPDATE enrollments SET progress = ?2, updated_at = ?3 WHERE id = ?1",
                    libsql::params![enrollment.id.as_str(), to_json(&progress)?, now.to_rfc3339()],
                )
                .await?;
            self.audit(
                Some(marked_by),
                EntityType::Attendance,
                &record.id,
                AuditAction::Recorded,
                Some(serde_json::json!({
                    "studentId": record.student_id,
                    "date": record.date,
                    "status": record.status,
                })),
            )
            .await?;
            Ok(record)
        }
        .await;
        let record = finish(tx, result).await?;
        tracing::debug!(
            batch_id = %record.batch_id,
            student_id = %record.student_id,
            status = %record.status,
            "attendance marked"
        );
        Ok(record)
    }

    /// Attendance of a batch, newest day first, then by student.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown batch.
    pub async fn attendance_for_batch(
        &self,
        batch_id: &str,
    ) -> Result<Vec<Attendance>, DatabaseError> {
        let _gate = self.gate().await;
        self.ensure_exists(EntityType::Batch, "Batch", batch_id)
            .await?;
        self.collect_attendance(
            &format!(
                "SELECT {SELECT_COLS} FROM attendance WHERE batch_id = ?1
                 ORDER BY date DESC, student_id"
            ),
            [batch_id],
        )
        .await
    }

    async fn attendance_for_student(
        &self,
        batch_id: &str,
        student_id: &str,
    ) -> Result<Vec<Attendance>, DatabaseError> {
        self.collect_attendance(
            &format!(
                "SELECT {SELECT_COLS} FROM attendance WHERE batch_id = ?1 AND student_id = ?2
                 ORDER BY date"
            ),
            [batch_id, student_id],
        )
        .await
    }

    async fn collect_attendance(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Attendance>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_attendance(&row)?);
        }
        Ok(records)
    }
}
