//! Enrollment repository: enroll, assign, transfer, status changes, rosters.
//!
//! Seat accounting lives here. An enrollment takes one course seat of its
//! batch type when created and one batch seat when placed in a batch. Both
//! are given back only when it is dropped or cancelled, or its student is
//! deleted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use campus_core::audit_detail::{AssignedDetail, StatusChangedDetail, TransferDetail};
use campus_core::entities::{
    Batch, Course, Enrollment, EnrollmentPayment, EnrollmentProgress, TransferRecord,
};
use campus_core::enums::{
    AuditAction, BatchType, EnrollmentStatus, EntityType, PaymentState,
};
use campus_core::errors::CoreError;
use campus_core::ids::PREFIX_ENROLLMENT;
use campus_core::responses::{CourseWithSummary, Pagination, RosterEntry, StudentCourse};

use crate::error::DatabaseError;
use crate::helpers::{
    first_u64, get_opt_string, get_u64, parse_datetime, parse_enum, parse_json,
    parse_optional_datetime, to_i64, to_json,
};
use crate::service::{CampusService, finish};
use crate::updates::enrollment::{EnrollmentFilter, EnrollmentStatusChange, NewEnrollment};

pub(crate) const SELECT_COLS: &str = "id, student_id, course_id, batch_id, batch_type, \
     payment_id, status, payment_amount, payment_status, paid_at, enrolled_at, started_at, \
     completed_at, progress, notes, transfer_history, created_at, updated_at";

/// Statuses whose seats have already been given back.
const RELEASED_STATUSES: &str = "('dropped', 'cancelled')";

pub(crate) fn row_to_enrollment(row: &libsql::Row) -> Result<Enrollment, DatabaseError> {
    let paid_at = get_opt_string(row, 9)?;
    let started_at = get_opt_string(row, 11)?;
    let completed_at = get_opt_string(row, 12)?;
    Ok(Enrollment {
        id: row.get::<String>(0)?,
        student_id: row.get::<String>(1)?,
        course_id: row.get::<String>(2)?,
        batch_id: get_opt_string(row, 3)?,
        batch_type: parse_enum(&row.get::<String>(4)?)?,
        payment_id: get_opt_string(row, 5)?,
        status: parse_enum(&row.get::<String>(6)?)?,
        payment: EnrollmentPayment {
            amount: get_u64(row, 7)?,
            status: parse_enum(&row.get::<String>(8)?)?,
            paid_at: parse_optional_datetime(paid_at.as_deref())?,
        },
        enrolled_at: parse_datetime(&row.get::<String>(10)?)?,
        started_at: parse_optional_datetime(started_at.as_deref())?,
        completed_at: parse_optional_datetime(completed_at.as_deref())?,
        progress: parse_json(&row.get::<String>(13)?)?,
        notes: get_opt_string(row, 14)?,
        transfer_history: parse_json(&row.get::<String>(15)?)?,
        created_at: parse_datetime(&row.get::<String>(16)?)?,
        updated_at: parse_datetime(&row.get::<String>(17)?)?,
    })
}

/// Everything needed to open a new enrollment inside a caller's transaction.
pub(crate) struct EnrollmentDraft<'a> {
    pub student_id: &'a str,
    pub course: &'a Course,
    pub batch_type: BatchType,
    pub status: EnrollmentStatus,
    pub payment_id: Option<String>,
    pub payment: EnrollmentPayment,
    pub notes: Option<String>,
}

fn check_batch_fits(enrollment: &Enrollment, batch: &Batch) -> Result<(), DatabaseError> {
    if batch.course_id != enrollment.course_id {
        return Err(DatabaseError::Validation(vec![
            "Batch belongs to a different course".to_string(),
        ]));
    }
    if batch.batch_type != enrollment.batch_type {
        return Err(DatabaseError::Validation(vec![format!(
            "Batch is a {} batch but the enrollment is {}",
            batch.batch_type, enrollment.batch_type
        )]));
    }
    Ok(())
}

impl CampusService {
    /// Enroll a student on an admin's behalf. Takes a course seat and, when a
    /// batch is named, a seat in that batch.
    ///
    /// # Errors
    ///
    /// Returns `Conflict` for a duplicate enrollment, `CapacityExceeded` when
    /// the course or batch is full, and `NotFound` for unknown references.
    pub async fn create_enrollment(
        &self,
        actor: Option<&str>,
        input: &NewEnrollment,
    ) -> Result<Enrollment, DatabaseError> {
        let mut errors = Vec::new();
        if input.student_id.trim().is_empty() {
            errors.push("Student ID is required".to_string());
        }
        if input.course_id.trim().is_empty() {
            errors.push("Course ID is required".to_string());
        }
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        let _gate = self.gate().await;
        self.ensure_exists(EntityType::User, "Student", &input.student_id)
            .await?;
        let course = self.get_course(&input.course_id).await?;
        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            let mut enrollment = self
                .open_enrollment(
                    actor,
                    EnrollmentDraft {
                        student_id: &input.student_id,
                        course: &course,
                        batch_type: input.batch_type,
                        status: EnrollmentStatus::Pending,
                        payment_id: input.payment_id.clone(),
                        payment: EnrollmentPayment {
                            amount: input.payment_amount,
                            ..EnrollmentPayment::default()
                        },
                        notes: input.notes.clone(),
                    },
                )
                .await?;
            if let Some(ref batch_id) = input.batch_id {
                enrollment = self.place_in_batch(actor, enrollment, batch_id).await?;
            }
            Ok(enrollment)
        }
        .await;
        let enrollment = finish(tx, result).await?;
        tracing::info!(
            enrollment_id = %enrollment.id,
            student_id = %enrollment.student_id,
            course_id = %enrollment.course_id,
            "enrollment created"
        );
        Ok(enrollment)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no enrollment has this id.
    pub async fn get_enrollment(&self, id: &str) -> Result<Enrollment, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM enrollments WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Enrollment", id))?;
        row_to_enrollment(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_enrollments(
        &self,
        filter: &EnrollmentFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Enrollment>, Pagination), DatabaseError> {
        let _gate = self.gate().await;
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        for (column, value) in [
            ("course_id", filter.course_id.as_deref()),
            ("batch_id", filter.batch_id.as_deref()),
            ("student_id", filter.student_id.as_deref()),
            ("status", filter.status.map(EnrollmentStatus::as_str)),
            ("batch_type", filter.batch_type.map(BatchType::as_str)),
        ] {
            if let Some(value) = value {
                params.push(value.into());
                conditions.push(format!("{column} = ?{}", params.len()));
            }
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let total = first_u64(
            self.db()
                .conn()
                .query(
                    &format!("SELECT COUNT(*) FROM enrollments {where_clause}"),
                    libsql::params_from_iter(params.clone()),
                )
                .await?,
        )
        .await?;
        let pagination = Pagination::new(page, limit, total);
        let sql = format!(
            "SELECT {SELECT_COLS} FROM enrollments {where_clause}
             ORDER BY enrolled_at DESC LIMIT {limit} OFFSET {}",
            pagination.offset()
        );
        let enrollments = self
            .collect_enrollments(&sql, libsql::params_from_iter(params))
            .await?;
        Ok((enrollments, pagination))
    }

    /// A student's enrollments, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn enrollments_for_student(
        &self,
        student_id: &str,
    ) -> Result<Vec<Enrollment>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_enrollments(
            &format!(
                "SELECT {SELECT_COLS} FROM enrollments WHERE student_id = ?1
                 ORDER BY enrolled_at DESC"
            ),
            [student_id],
        )
        .await
    }

    /// A student's enrollments paired with their courses. Enrollments whose
    /// course vanished are skipped.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn student_courses(
        &self,
        student_id: &str,
    ) -> Result<Vec<StudentCourse>, DatabaseError> {
        let _gate = self.gate().await;
        let mut out = Vec::new();
        for enrollment in self.enrollments_for_student(student_id).await? {
            match self.get_course(&enrollment.course_id).await {
                Ok(course) => out.push(StudentCourse {
                    enrollment,
                    course: CourseWithSummary::from(course),
                }),
                Err(DatabaseError::Core(CoreError::NotFound { .. })) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Batches a student is placed in.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn batches_for_student(&self, student_id: &str) -> Result<Vec<Batch>, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {} FROM batches WHERE id IN (
                         SELECT batch_id FROM enrollments
                         WHERE student_id = ?1 AND batch_id IS NOT NULL
                           AND status NOT IN {RELEASED_STATUSES})
                     ORDER BY start_date IS NULL, start_date",
                    crate::repos::batch::SELECT_COLS
                ),
                [student_id],
            )
            .await?;
        let mut batches = Vec::new();
        while let Some(row) = rows.next().await? {
            batches.push(crate::repos::batch::row_to_batch(&row)?);
        }
        Ok(batches)
    }

    /// Students placed in a trainer's batches, grouped by batch.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn trainer_roster(
        &self,
        trainer_id: &str,
    ) -> Result<Vec<RosterEntry>, DatabaseError> {
        let _gate = self.gate().await;
        let batches: HashMap<String, Batch> = self
            .batches_for_trainer(trainer_id)
            .await?
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect();
        let enrollments = self
            .collect_enrollments(
                &format!(
                    "SELECT {SELECT_COLS} FROM enrollments
                     WHERE batch_id IN (SELECT id FROM batches WHERE trainer_id = ?1)
                       AND status NOT IN {RELEASED_STATUSES}
                     ORDER BY batch_id, enrolled_at"
                ),
                [trainer_id],
            )
            .await?;

        let mut roster = Vec::with_capacity(enrollments.len());
        for enrollment in enrollments {
            let student = self.get_user(&enrollment.student_id).await?;
            let batch_name = enrollment
                .batch_id
                .as_ref()
                .and_then(|id| batches.get(id))
                .map(|b| b.name.clone())
                .unwrap_or_default();
            roster.push(RosterEntry {
                progress_percentage: enrollment.progress_percentage(),
                student,
                enrollment,
                batch_name,
            });
        }
        Ok(roster)
    }

    /// Place an enrollment in a batch, moving it out of its current one.
    /// The student becomes active.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` when the batch is full, `Validation` when
    /// the batch belongs elsewhere, and `InvalidState` when the enrollment no
    /// longer holds a seat.
    pub async fn assign_batch(
        &self,
        actor: Option<&str>,
        enrollment_id: &str,
        batch_id: &str,
    ) -> Result<Enrollment, DatabaseError> {
        let _gate = self.gate().await;
        let enrollment = self.get_enrollment(enrollment_id).await?;
        if !enrollment.status.holds_seat() {
            return Err(DatabaseError::InvalidState(format!(
                "Cannot assign a {} enrollment to a batch",
                enrollment.status
            )));
        }
        if enrollment.batch_id.as_deref() == Some(batch_id) {
            return Err(DatabaseError::InvalidState(
                "Enrollment is already in this batch".into(),
            ));
        }

        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            let mut enrollment = self.place_in_batch(actor, enrollment, batch_id).await?;
            if enrollment.status != EnrollmentStatus::Active
                && enrollment.status.can_transition_to(EnrollmentStatus::Active)
            {
                enrollment = self
                    .write_status(actor, enrollment, EnrollmentStatus::Active, None)
                    .await?;
            }
            Ok(enrollment)
        }
        .await;
        finish(tx, result).await
    }

    /// Move a placed student to another batch of the same course, keeping a
    /// transfer record. The status is left alone.
    ///
    /// # Errors
    ///
    /// Returns `CapacityExceeded` when the target is full and `InvalidState`
    /// for a transfer onto the current batch.
    pub async fn transfer_enrollment(
        &self,
        actor: Option<&str>,
        enrollment_id: &str,
        to_batch_id: &str,
        reason: Option<String>,
    ) -> Result<Enrollment, DatabaseError> {
        let _gate = self.gate().await;
        let enrollment = self.get_enrollment(enrollment_id).await?;
        if enrollment.batch_id.as_deref() == Some(to_batch_id) {
            return Err(DatabaseError::InvalidState(
                "Cannot transfer to the same batch".into(),
            ));
        }
        if matches!(
            enrollment.status,
            EnrollmentStatus::Completed | EnrollmentStatus::Dropped | EnrollmentStatus::Cancelled
        ) {
            return Err(DatabaseError::InvalidState(format!(
                "Cannot transfer a {} enrollment",
                enrollment.status
            )));
        }
        let target = self.get_batch(to_batch_id).await?;
        check_batch_fits(&enrollment, &target)?;

        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            self.reserve_batch_seats(to_batch_id, 1).await?;
            if let Some(ref from) = enrollment.batch_id {
                self.release_batch_seat(from).await?;
            }
            let now = Utc::now();
            let mut history = enrollment.transfer_history.clone();
            history.push(TransferRecord {
                from_batch: enrollment.batch_id.clone(),
                to_batch: to_batch_id.to_string(),
                reason: reason.clone(),
                transferred_at: now,
            });
            self.db()
                .conn()
                .execute(
                    "UPDATE enrollments SET batch_id = ?2, transfer_history = ?3, updated_at = ?4
                     WHERE id = ?1",
                    libsql::params![
                        enrollment_id,
                        to_batch_id,
                        to_json(&history)?,
                        now.to_rfc3339()
                    ],
                )
                .await?;
            let detail = TransferDetail {
                from_batch: enrollment.batch_id.clone(),
                to_batch: to_batch_id.to_string(),
                reason: reason.clone(),
            };
            self.audit(
                actor,
                EntityType::Enrollment,
                enrollment_id,
                AuditAction::Transferred,
                Some(serde_json::to_value(&detail)?),
            )
            .await?;
            Ok(Enrollment {
                batch_id: Some(to_batch_id.to_string()),
                transfer_history: history,
                updated_at: now,
                ..enrollment.clone()
            })
        }
        .await;
        let moved = finish(tx, result).await?;
        tracing::info!(enrollment_id, to_batch = to_batch_id, "enrollment transferred");
        Ok(moved)
    }

    /// Move an enrollment through its state machine. Dropping or cancelling
    /// gives back its course and batch seats.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for a move the state machine forbids.
    pub async fn change_enrollment_status(
        &self,
        actor: Option<&str>,
        enrollment_id: &str,
        change: &EnrollmentStatusChange,
    ) -> Result<Enrollment, DatabaseError> {
        let _gate = self.gate().await;
        let enrollment = self.get_enrollment(enrollment_id).await?;
        if !enrollment.status.can_transition_to(change.status) {
            return Err(CoreError::InvalidTransition {
                entity_type: "enrollment".into(),
                id: enrollment_id.to_string(),
                from: enrollment.status.as_str().into(),
                to: change.status.as_str().into(),
            }
            .into());
        }

        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            let mut enrollment = enrollment;
            if matches!(
                change.status,
                EnrollmentStatus::Dropped | EnrollmentStatus::Cancelled
            ) {
                self.release_seats(&enrollment).await?;
                self.db()
                    .conn()
                    .execute(
                        "UPDATE enrollments SET batch_id = NULL WHERE id = ?1",
                        [enrollment_id],
                    )
                    .await?;
                enrollment.batch_id = None;
            }
            self.write_status(actor, enrollment, change.status, change.reason.clone())
                .await
        }
        .await;
        finish(tx, result).await
    }

    /// Replace the progress snapshot carried on an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no enrollment has this id.
    pub async fn update_enrollment_progress(
        &self,
        actor: Option<&str>,
        enrollment_id: &str,
        progress: &EnrollmentProgress,
    ) -> Result<Enrollment, DatabaseError> {
        let _gate = self.gate().await;
        let enrollment = self.get_enrollment(enrollment_id).await?;
        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "UPDATE enrollments SET progress = ?2, updated_at = ?3 WHERE id = ?1",
                libsql::params![enrollment_id, to_json(progress)?, now.to_rfc3339()],
            )
            .await?;
        self.audit(
            actor,
            EntityType::Enrollment,
            enrollment_id,
            AuditAction::Updated,
            Some(serde_json::to_value(progress)?),
        )
        .await?;
        Ok(Enrollment {
            progress: progress.clone(),
            updated_at: now,
            ..enrollment
        })
    }

    /// Insert a new enrollment and take its course seat. Must run inside the
    /// caller's transaction with the gate held.
    pub(crate) async fn open_enrollment(
        &self,
        actor: Option<&str>,
        draft: EnrollmentDraft<'_>,
    ) -> Result<Enrollment, DatabaseError> {
        let course = draft.course;
        if !course.batch_types.get(draft.batch_type).enabled {
            return Err(DatabaseError::Validation(vec![format!(
                "{} batches are not offered for this course",
                draft.batch_type.title()
            )]));
        }
        let duplicate = first_u64(
            self.db()
                .conn()
                .query(
                    "SELECT COUNT(*) FROM enrollments
                     WHERE student_id = ?1 AND course_id = ?2
                       AND status IN ('pending', 'enrolled', 'active')",
                    libsql::params![draft.student_id, course.id.as_str()],
                )
                .await?,
        )
        .await?;
        if duplicate > 0 {
            return Err(DatabaseError::Conflict(
                "Student is already enrolled in this course".into(),
            ));
        }
        self.reserve_course_seat(&course.id, draft.batch_type).await?;

        let now = Utc::now();
        let enrollment = Enrollment {
            id: self.db().generate_id(PREFIX_ENROLLMENT).await?,
            student_id: draft.student_id.to_string(),
            course_id: course.id.clone(),
            batch_id: None,
            batch_type: draft.batch_type,
            payment_id: draft.payment_id,
            status: draft.status,
            payment: draft.payment,
            enrolled_at: now,
            started_at: (draft.status == EnrollmentStatus::Active).then_some(now),
            completed_at: None,
            progress: EnrollmentProgress::default(),
            notes: draft.notes,
            transfer_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO enrollments ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17, ?18)"
                ),
                libsql::params![
                    enrollment.id.as_str(),
                    enrollment.student_id.as_str(),
                    enrollment.course_id.as_str(),
                    enrollment.batch_id.as_deref(),
                    enrollment.batch_type.as_str(),
                    enrollment.payment_id.as_deref(),
                    enrollment.status.as_str(),
                    to_i64(enrollment.payment.amount),
                    enrollment.payment.status.as_str(),
                    enrollment.payment.paid_at.map(|d| d.to_rfc3339()),
                    enrollment.enrolled_at.to_rfc3339(),
                    enrollment.started_at.map(|d| d.to_rfc3339()),
                    Option::<String>::None,
                    to_json(&enrollment.progress)?,
                    enrollment.notes.as_deref(),
                    to_json(&enrollment.transfer_history)?,
                    enrollment.created_at.to_rfc3339(),
                    enrollment.updated_at.to_rfc3339()
                ],
            )
            .await?;
        self.audit(
            actor,
            EntityType::Enrollment,
            &enrollment.id,
            AuditAction::Enrolled,
            None,
        )
        .await?;
        Ok(enrollment)
    }

    /// Reserve a seat in `batch_id`, give back the old batch seat, and point
    /// the enrollment at the new batch. Runs inside the caller's transaction.
    pub(crate) async fn place_in_batch(
        &self,
        actor: Option<&str>,
        enrollment: Enrollment,
        batch_id: &str,
    ) -> Result<Enrollment, DatabaseError> {
        let batch = self.get_batch(batch_id).await?;
        check_batch_fits(&enrollment, &batch)?;
        self.reserve_batch_seats(batch_id, 1).await?;
        if let Some(ref old) = enrollment.batch_id {
            self.release_batch_seat(old).await?;
        }
        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "UPDATE enrollments SET batch_id = ?2, updated_at = ?3 WHERE id = ?1",
                libsql::params![enrollment.id.as_str(), batch_id, now.to_rfc3339()],
            )
            .await?;
        let detail = AssignedDetail {
            batch_id: batch_id.to_string(),
        };
        self.audit(
            actor,
            EntityType::Enrollment,
            &enrollment.id,
            AuditAction::Assigned,
            Some(serde_json::to_value(&detail)?),
        )
        .await?;
        Ok(Enrollment {
            batch_id: Some(batch_id.to_string()),
            updated_at: now,
            ..enrollment
        })
    }

    /// Enrollments of a user whose seats are still counted.
    pub(crate) async fn enrollments_holding_seats_of(
        &self,
        student_id: &str,
    ) -> Result<Vec<Enrollment>, DatabaseError> {
        self.collect_enrollments(
            &format!(
                "SELECT {SELECT_COLS} FROM enrollments
                 WHERE student_id = ?1 AND status NOT IN {RELEASED_STATUSES}"
            ),
            [student_id],
        )
        .await
    }

    /// Give back the course seat and any batch seat of an enrollment.
    pub(crate) async fn release_seats(&self, enrollment: &Enrollment) -> Result<(), DatabaseError> {
        self.release_course_seat(&enrollment.course_id, enrollment.batch_type)
            .await?;
        if let Some(ref batch_id) = enrollment.batch_id {
            self.release_batch_seat(batch_id).await?;
        }
        Ok(())
    }

    pub(crate) async fn write_status(
        &self,
        actor: Option<&str>,
        enrollment: Enrollment,
        status: EnrollmentStatus,
        reason: Option<String>,
    ) -> Result<Enrollment, DatabaseError> {
        let now = Utc::now();
        let started_at: Option<DateTime<Utc>> = enrollment
            .started_at
            .or_else(|| (status == EnrollmentStatus::Active).then_some(now));
        let completed_at = enrollment
            .completed_at
            .or_else(|| (status == EnrollmentStatus::Completed).then_some(now));
        self.db()
            .conn()
            .execute(
                "UPDATE enrollments SET status = ?2, started_at = ?3, completed_at = ?4,
                     updated_at = ?5
                 WHERE id = ?1",
                libsql::params![
                    enrollment.id.as_str(),
                    status.as_str(),
                    started_at.map(|d| d.to_rfc3339()),
                    completed_at.map(|d| d.to_rfc3339()),
                    now.to_rfc3339()
                ],
            )
            .await?;
        let detail = StatusChangedDetail {
            from: enrollment.status.as_str().into(),
            to: status.as_str().into(),
            reason,
        };
        self.audit(
            actor,
            EntityType::Enrollment,
            &enrollment.id,
            AuditAction::StatusChanged,
            Some(serde_json::to_value(&detail)?),
        )
        .await?;
        Ok(Enrollment {
            status,
            started_at,
            completed_at,
            updated_at: now,
            ..enrollment
        })
    }

    /// Mark a paid enrollment's payment block. Runs inside the caller's
    /// transaction.
    pub(crate) async fn mark_enrollment_paid(
        &self,
        enrollment_id: &str,
        paid_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE enrollments SET payment_status = ?2, paid_at = ?3 WHERE id = ?1",
                libsql::params![
                    enrollment_id,
                    PaymentState::Paid.as_str(),
                    paid_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn collect_enrollments(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Enrollment>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut enrollments = Vec::new();
        while let Some(row) = rows.next().await? {
            enrollments.push(row_to_enrollment(&row)?);
        }
        Ok(enrollments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{batch, published_course, student, test_service, trainer};
    use crate::updates::course::CourseUpdateBuilder;
    use pretty_assertions::assert_eq;

    fn enroll(student_id: &str, course_id: &str, batch_id: Option<&str>) -> NewEnrollment {
        NewEnrollment {
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            batch_type: BatchType::Regular,
            batch_id: batch_id.map(String::from),
            payment_id: None,
            payment_amount: 12_000,
            notes: None,
        }
    }

    #[tokio::test]
    async fn enrolling_takes_course_and_batch_seats() {
        let svc = test_service().await;
        let tutor = trainer(&svc).await;
        let course = published_course(&svc, 10, 5).await;
        let b = batch(&svc, &course.id, &tutor.id, 5).await;
        let s = student(&svc, 1).await;

        let e = svc
            .create_enrollment(None, &enroll(&s.id, &course.id, Some(&b.id)))
            .await
            .unwrap();
        assert_eq!(e.status, EnrollmentStatus::Pending);
        assert_eq!(e.batch_id.as_deref(), Some(b.id.as_str()));
        assert_eq!(e.payment.amount, 12_000);
        assert_eq!(svc.get_batch(&b.id).await.unwrap().current_students, 1);
        assert_eq!(svc.get_course(&course.id).await.unwrap().total_enrolled(), 1);
        assert_eq!(svc.get_enrollment(&e.id).await.unwrap(), e);
    }

    #[tokio::test]
    async fn enrollment_sees_the_course_as_committed() {
        let svc = std::sync::Arc::new(test_service().await);
        let course = published_course(&svc, 20, 10).await;
        let enable = CourseUpdateBuilder::new().revision_enabled(true).build();
        svc.update_course(None, &course.id, &enable).await.unwrap();
        let s = student(&svc, 1).await;

        let gate = svc.gate().await;
        let pending = tokio::spawn({
            let svc = std::sync::Arc::clone(&svc);
            let mut input = enroll(&s.id, &course.id, None);
            input.batch_type = BatchType::Revision;
            async move { svc.create_enrollment(None, &input).await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        let disable = CourseUpdateBuilder::new().revision_enabled(false).build();
        svc.update_course(None, &course.id, &disable).await.unwrap();
        drop(gate);

        let err = pending.await.unwrap().unwrap_err();
        match err {
            DatabaseError::Validation(errors) => {
                assert_eq!(errors, vec!["Revision batches are not offered for this course"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn duplicate_enrollment_conflicts() {
        let svc = test_service().await;
        let course = published_course(&svc, 10, 5).await;
        let s = student(&svc, 1).await;
        svc.create_enrollment(None, &enroll(&s.id, &course.id, None))
            .await
            .unwrap();
        let err = svc
            .create_enrollment(None, &enroll(&s.id, &course.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Student is already enrolled in this course");
        assert_eq!(svc.get_course(&course.id).await.unwrap().total_enrolled(), 1);
    }

    #[tokio::test]
    async fn full_batch_rolls_back_the_course_seat() {
        let svc = test_service().await;
        let tutor = trainer(&svc).await;
        let course = published_course(&svc, 10, 5).await;
        let b = batch(&svc, &course.id, &tutor.id, 1).await;
        let first = student(&svc, 1).await;
        let second = student(&svc, 2).await;

        svc.create_enrollment(None, &enroll(&first.id, &course.id, Some(&b.id)))
            .await
            .unwrap();
        let err = svc
            .create_enrollment(None, &enroll(&second.id, &course.id, Some(&b.id)))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Batch is full");
        assert_eq!(svc.get_course(&course.id).await.unwrap().total_enrolled(), 1);
        let (all, _) = svc
            .list_enrollments(&EnrollmentFilter::default(), 1, 10)
            .await
            .unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn full_course_refuses_enrollment() {
        let svc = test_service().await;
        let course = published_course(&svc, 1, 5).await;
        let a = student(&svc, 1).await;
        let b = student(&svc, 2).await;
        svc.create_enrollment(None, &enroll(&a.id, &course.id, None))
            .await
            .unwrap();
        let err = svc
            .create_enrollment(None, &enroll(&b.id, &course.id, None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Course is full");
    }

    #[tokio::test]
    async fn assign_moves_seats_and_activates() {
        let svc = test_service().await;
        let tutor = trainer(&svc).await;
        let course = published_course(&svc, 10, 5).await;
        let first = batch(&svc, &course.id, &tutor.id, 5).await;
        let second = batch(&svc, &course.id, &tutor.id, 5).await;
        let s = student(&svc, 1).await;
        let e = svc
            .create_enrollment(None, &enroll(&s.id, &course.id, Some(&first.id)))
            .await
            .unwrap();

        let moved = svc.assign_batch(None, &e.id, &second.id).await.unwrap();
        assert_eq!(moved.status, EnrollmentStatus::Active);
        assert!(moved.started_at.is_some());
        assert_eq!(svc.get_batch(&first.id).await.unwrap().current_students, 0);
        assert_eq!(svc.get_batch(&second.id).await.unwrap().current_students, 1);

        let err = svc.assign_batch(None, &e.id, &second.id).await.unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }

    #[tokio::test]
    async fn transfer_keeps_history_and_status() {
        let svc = test_service().await;
        let tutor = trainer(&svc).await;
        let course = published_course(&svc, 10, 5).await;
        let from = batch(&svc, &course.id, &tutor.id, 5).await;
        let to = batch(&svc, &course.id, &tutor.id, 5).await;
        let s = student(&svc, 1).await;
        let e = svc
            .create_enrollment(None, &enroll(&s.id, &course.id, Some(&from.id)))
            .await
            .unwrap();

        let moved = svc
            .transfer_enrollment(None, &e.id, &to.id, Some("schedule clash".into()))
            .await
            .unwrap();
        assert_eq!(moved.status, EnrollmentStatus::Pending);
        assert_eq!(moved.transfer_history.len(), 1);
        assert_eq!(moved.transfer_history[0].from_batch.as_deref(), Some(from.id.as_str()));
        let stored = svc.get_enrollment(&e.id).await.unwrap();
        assert_eq!(stored.transfer_history, moved.transfer_history);
        assert_eq!(svc.get_batch(&from.id).await.unwrap().current_students, 0);
        assert_eq!(svc.get_batch(&to.id).await.unwrap().current_students, 1);

        let err = svc.transfer_enrollment(None, &e.id, &to.id, None).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot transfer to the same batch");
    }

    #[tokio::test]
    async fn dropping_releases_seats() {
        let svc = test_service().await;
        let tutor = trainer(&svc).await;
        let course = published_course(&svc, 10, 5).await;
        let b = batch(&svc, &course.id, &tutor.id, 5).await;
        let s = student(&svc, 1).await;
        let e = svc
            .create_enrollment(None, &enroll(&s.id, &course.id, Some(&b.id)))
            .await
            .unwrap();
        let e = svc.assign_batch(None, &e.id, &b.id).await;
        assert!(e.is_err(), "already placed in this batch");

        let (list, _) = svc
            .list_enrollments(&EnrollmentFilter::default(), 1, 10)
            .await
            .unwrap();
        let id = list[0].id.clone();
        let change = |status| EnrollmentStatusChange {
            status,
            reason: Some("moved abroad".into()),
        };
        svc.change_enrollment_status(None, &id, &change(EnrollmentStatus::Active))
            .await
            .unwrap();
        let dropped = svc
            .change_enrollment_status(None, &id, &change(EnrollmentStatus::Dropped))
            .await
            .unwrap();
        assert_eq!(dropped.batch_id, None);
        assert_eq!(svc.get_batch(&b.id).await.unwrap().current_students, 0);
        assert_eq!(svc.get_course(&course.id).await.unwrap().total_enrolled(), 0);

        let err = svc
            .change_enrollment_status(None, &id, &change(EnrollmentStatus::Active))
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::Core(CoreError::InvalidTransition { .. })));
    }

    #[tokio::test]
    async fn completing_keeps_counts() {
        let svc = test_service().await;
        let course = published_course(&svc, 10, 5).await;
        let s = student(&svc, 1).await;
        let e = svc
            .create_enrollment(None, &enroll(&s.id, &course.id, None))
            .await
            .unwrap();
        for status in [EnrollmentStatus::Active, EnrollmentStatus::Completed] {
            svc.change_enrollment_status(
                None,
                &e.id,
                &EnrollmentStatusChange {
                    status,
                    reason: None,
                },
            )
            .await
            .unwrap();
        }
        let done = svc.get_enrollment(&e.id).await.unwrap();
        assert!(done.completed_at.is_some());
        assert_eq!(svc.get_course(&course.id).await.unwrap().total_enrolled(), 1);
    }

    #[tokio::test]
    async fn deleting_a_student_releases_seats() {
        let svc = test_service().await;
        let tutor = trainer(&svc).await;
        let admin = svc
            .create_user(
                None,
                &crate::test_support::helpers::new_user("Root", "root@example.com", "admin"),
            )
            .await
            .unwrap();
        let course = published_course(&svc, 10, 5).await;
        let b = batch(&svc, &course.id, &tutor.id, 5).await;
        let s = student(&svc, 1).await;
        svc.create_enrollment(None, &enroll(&s.id, &course.id, Some(&b.id)))
            .await
            .unwrap();

        svc.delete_user(&admin.id, campus_core::enums::Role::Admin, &s.id)
            .await
            .unwrap();
        assert_eq!(svc.get_batch(&b.id).await.unwrap().current_students, 0);
        assert_eq!(svc.get_course(&course.id).await.unwrap().total_enrolled(), 0);
    }

    #[tokio::test]
    async fn roster_and_student_views() {
        let svc = test_service().await;
        let tutor = trainer(&svc).await;
        let course = published_course(&svc, 10, 5).await;
        let b = batch(&svc, &course.id, &tutor.id, 5).await;
        let s = student(&svc, 1).await;
        svc.create_enrollment(None, &enroll(&s.id, &course.id, Some(&b.id)))
            .await
            .unwrap();

        let roster = svc.trainer_roster(&tutor.id).await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].student.id, s.id);
        assert_eq!(roster[0].batch_name, "Evening Batch");

        let courses = svc.student_courses(&s.id).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].course.total_enrolled, 1);
        assert_eq!(svc.batches_for_student(&s.id).await.unwrap()[0].id, b.id);
    }
}
