//! Batch planner: splits a course's placed-but-unassigned students into
//! batches, resolves leftover batches, and reports the distribution.
//!
//! For each enabled batch type the planner fills `batch_size_limit`-sized
//! batches in enrollment order. The remainder lands in one leftover batch
//! that an admin later merges or keeps. A type with no waiting students gets
//! a single empty batch so enrollment can start.

use chrono::{DateTime, Months, NaiveDate, Utc};

use campus_core::audit_detail::{MergeDetail, PlanDetail};
use campus_core::entities::{Batch, Course, MeetingSchedule};
use campus_core::enums::{
    AuditAction, BatchStatus, BatchType, EntityType, LeftoverAction,
};
use campus_core::errors::CoreError;
use campus_core::ids::PREFIX_BATCH;
use campus_core::responses::{
    BatchDistributionSummary, BatchPlanResult, BatchPlanSummary, CapacityUtilization,
    LeftoverResult, TypeDistribution, TypeDistributions,
};

use crate::error::DatabaseError;
use crate::helpers::to_json;
use crate::repos::enrollment::SELECT_COLS as ENROLLMENT_COLS;
use crate::service::{CampusService, finish};

/// First day of the course month through the last day of its final month.
fn course_window(course: &Course) -> Result<(DateTime<Utc>, DateTime<Utc>), DatabaseError> {
    let invalid = || {
        DatabaseError::Validation(vec![format!(
            "Course month {}/{} does not give a valid batch window",
            course.month, course.year
        )])
    };
    let start = NaiveDate::from_ymd_opt(course.year, course.month, 1).ok_or_else(invalid)?;
    let end = start
        .checked_add_months(Months::new(course.course_duration.max(1)))
        .and_then(|next| next.pred_opt())
        .ok_or_else(invalid)?;
    let to_utc = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    Ok((
        to_utc(start).ok_or_else(invalid)?,
        to_utc(end).ok_or_else(invalid)?,
    ))
}

struct PlannedType {
    batches: Vec<Batch>,
    leftover: Option<Batch>,
    students: u32,
    leftover_students: u32,
}

impl CampusService {
    /// Create batches for every enabled type of a course and place its
    /// waiting students.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown course.
    pub async fn create_batches_for_course(
        &self,
        actor: Option<&str>,
        course_id: &str,
    ) -> Result<BatchPlanResult, DatabaseError> {
        let _gate = self.gate().await;
        let course = self.get_course(course_id).await?;
        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> =
            async { self.plan(actor, &course, false).await }.await;
        finish(tx, result).await
    }

    /// Unassign every student of the course, delete its batches, and plan
    /// again from scratch.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown course.
    pub async fn recalculate_batches(
        &self,
        actor: Option<&str>,
        course_id: &str,
    ) -> Result<BatchPlanResult, DatabaseError> {
        let _gate = self.gate().await;
        let course = self.get_course(course_id).await?;
        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            self.db()
                .conn()
                .execute(
                    "UPDATE enrollments SET batch_id = NULL WHERE course_id = ?1",
                    [course_id],
                )
                .await?;
            self.db()
                .conn()
                .execute("DELETE FROM batches WHERE course_id = ?1", [course_id])
                .await?;
            self.plan(actor, &course, true).await
        }
        .await;
        finish(tx, result).await
    }

    /// Merge a leftover batch into another batch, or keep it as it is.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` for a batch that is not a leftover, `Validation`
    /// for a merge without a usable target, and `CapacityExceeded` when the
    /// target cannot take the students.
    pub async fn handle_leftover_batch(
        &self,
        actor: Option<&str>,
        batch_id: &str,
        action: LeftoverAction,
        target_batch_id: Option<&str>,
    ) -> Result<LeftoverResult, DatabaseError> {
        let _gate = self.gate().await;
        let source = self.get_batch(batch_id).await?;
        if !source.is_leftover {
            return Err(DatabaseError::InvalidState(
                "Batch is not a leftover batch".into(),
            ));
        }

        match action {
            LeftoverAction::Leave => {
                let tx = self.begin().await?;
                let result: Result<_, DatabaseError> = async {
                    self.db()
                        .conn()
                        .execute(
                            "UPDATE batches SET is_leftover = 0, updated_at = ?2 WHERE id = ?1",
                            libsql::params![batch_id, Utc::now().to_rfc3339()],
                        )
                        .await?;
                    self.audit(
                        actor,
                        EntityType::Batch,
                        batch_id,
                        AuditAction::Updated,
                        Some(serde_json::json!({ "isLeftover": false })),
                    )
                    .await
                }
                .await;
                finish(tx, result).await?;
                Ok(LeftoverResult {
                    success: true,
                    message: format!("{} kept as a standalone batch", source.label()),
                    merged_students: None,
                    target_batch: None,
                })
            }
            LeftoverAction::Merge => {
                let Some(target_id) = target_batch_id.filter(|t| !t.trim().is_empty()) else {
                    return Err(DatabaseError::Validation(vec![
                        "Action and targetBatchId (for merge) are required".into(),
                    ]));
                };
                let target = self.get_batch(target_id).await?;
                if target.id == source.id {
                    return Err(DatabaseError::Validation(vec![
                        "Cannot merge a batch into itself".into(),
                    ]));
                }
                if target.course_id != source.course_id || target.batch_type != source.batch_type {
                    return Err(DatabaseError::Validation(vec![
                        "Target batch must be of the same course and batch type".into(),
                    ]));
                }

                let tx = self.begin().await?;
                let result = self.merge_into(actor, &source, &target).await;
                let merged = finish(tx, result).await?;
                tracing::info!(
                    source = batch_id,
                    target = target_id,
                    students = source.current_students,
                    "leftover batch merged"
                );
                Ok(LeftoverResult {
                    success: true,
                    message: format!(
                        "Merged {} students into {}",
                        source.current_students,
                        merged.label()
                    ),
                    merged_students: Some(source.current_students),
                    target_batch: Some(merged),
                })
            }
        }
    }

    /// How a course's students are spread over its batches.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown course.
    pub async fn batch_distribution_summary(
        &self,
        course_id: &str,
    ) -> Result<BatchDistributionSummary, DatabaseError> {
        let _gate = self.gate().await;
        let course = self.get_course(course_id).await?;
        let batches = self.batches_for_course(course_id).await?;
        let of_type = |bt: BatchType| TypeDistribution {
            batches: batches
                .iter()
                .filter(|b| b.batch_type == bt)
                .cloned()
                .collect(),
            students: course.batch_types.get(bt).student_count,
        };
        let batch_types = TypeDistributions {
            regular: of_type(BatchType::Regular),
            revision: of_type(BatchType::Revision),
        };
        Ok(BatchDistributionSummary {
            course_id: course.id.clone(),
            total_students: course.total_enrolled(),
            total_batches: u32::try_from(batches.len()).unwrap_or(u32::MAX),
            leftover_batches: batches.iter().filter(|b| b.is_leftover).cloned().collect(),
            batch_types,
            capacity_utilization: CapacityUtilization::new(
                course.total_capacity,
                course.total_enrolled(),
            ),
        })
    }

    async fn plan(
        &self,
        actor: Option<&str>,
        course: &Course,
        recalculated: bool,
    ) -> Result<BatchPlanResult, DatabaseError> {
        let window = course_window(course)?;
        let mut batches = Vec::new();
        let mut leftover_batches = Vec::new();
        let mut summary = BatchPlanSummary::default();

        for batch_type in course.batch_types.enabled() {
            let planned = self.plan_type(course, batch_type, window).await?;
            match batch_type {
                BatchType::Regular => summary.regular_students = planned.students,
                BatchType::Revision => summary.revision_students = planned.students,
            }
            summary.total_students += planned.students;
            summary.leftover_students += planned.leftover_students;
            batches.extend(planned.batches);
            leftover_batches.extend(planned.leftover);
        }
        summary.total_batches = u32::try_from(batches.len() + leftover_batches.len())
            .unwrap_or(u32::MAX);

        let detail = PlanDetail {
            batches_created: summary.total_batches,
            students_assigned: summary.total_students,
            recalculated,
        };
        self.audit(
            actor,
            EntityType::Course,
            &course.id,
            AuditAction::Planned,
            Some(serde_json::to_value(&detail)?),
        )
        .await?;
        tracing::info!(
            course_id = %course.id,
            batches = summary.total_batches,
            students = summary.total_students,
            leftover = summary.leftover_students,
            recalculated,
            "batches planned"
        );
        Ok(BatchPlanResult {
            course_id: course.id.clone(),
            batches,
            leftover_batches,
            summary,
        })
    }

    async fn plan_type(
        &self,
        course: &Course,
        batch_type: BatchType,
        (start, end): (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<PlannedType, DatabaseError> {
        let waiting = self
            .collect_enrollments(
                &format!(
                    "SELECT {ENROLLMENT_COLS} FROM enrollments
                     WHERE course_id = ?1 AND batch_type = ?2 AND batch_id IS NULL
                       AND status IN ('enrolled', 'active')
                     ORDER BY enrolled_at, id"
                ),
                libsql::params![course.id.as_str(), batch_type.as_str()],
            )
            .await?;
        let limit = course.batch_size_limit.max(1) as usize;
        let mut next_number = self.next_batch_number(&course.id, batch_type).await?;
        let mut planned = PlannedType {
            batches: Vec::new(),
            leftover: None,
            students: u32::try_from(waiting.len()).unwrap_or(u32::MAX),
            leftover_students: 0,
        };

        if waiting.is_empty() {
            let batch = self
                .new_planned_batch(course, batch_type, next_number, 0, false, start, end)
                .await?;
            planned.batches.push(batch);
            return Ok(planned);
        }

        for chunk in waiting.chunks(limit) {
            let size = u32::try_from(chunk.len()).unwrap_or(u32::MAX);
            let is_leftover = chunk.len() < limit;
            let batch = self
                .new_planned_batch(course, batch_type, next_number, size, is_leftover, start, end)
                .await?;
            next_number += 1;
            for enrollment in chunk {
                self.db()
                    .conn()
                    .execute(
                        "UPDATE enrollments SET batch_id = ?2, updated_at = ?3 WHERE id = ?1",
                        libsql::params![
                            enrollment.id.as_str(),
                            batch.id.as_str(),
                            batch.created_at.to_rfc3339()
                        ],
                    )
                    .await?;
            }
            if is_leftover {
                planned.leftover_students = size;
                planned.leftover = Some(batch);
            } else {
                planned.batches.push(batch);
            }
        }
        Ok(planned)
    }

    #[allow(clippy::too_many_arguments)]
    async fn new_planned_batch(
        &self,
        course: &Course,
        batch_type: BatchType,
        batch_number: u32,
        current_students: u32,
        is_leftover: bool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Batch, DatabaseError> {
        let now = Utc::now();
        let batch = Batch {
            id: self.db().generate_id(PREFIX_BATCH).await?,
            name: format!("{} Batch {batch_number}", batch_type.title()),
            course_id: course.id.clone(),
            trainer_id: course.instructor_id.clone(),
            batch_number,
            batch_type,
            start_date: Some(start),
            end_date: Some(end),
            max_students: course.batch_size_limit.max(1),
            current_students,
            duration: course.course_duration,
            status: BatchStatus::Upcoming,
            is_leftover,
            merged_from: Vec::new(),
            meeting_schedule: MeetingSchedule::default(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.insert_batch(&batch).await?;
        self.audit(None, EntityType::Batch, &batch.id, AuditAction::Created, None)
            .await?;
        Ok(batch)
    }

    async fn merge_into(
        &self,
        actor: Option<&str>,
        source: &Batch,
        target: &Batch,
    ) -> Result<Batch, DatabaseError> {
        self.reserve_batch_seats(&target.id, source.current_students)
            .await
            .map_err(|e| match e {
                DatabaseError::Core(CoreError::CapacityExceeded(_)) => {
                    DatabaseError::capacity("Cannot merge: would exceed target batch capacity")
                }
                other => other,
            })?;
        self.db()
            .conn()
            .execute(
                "UPDATE enrollments SET batch_id = ?2 WHERE batch_id = ?1",
                libsql::params![source.id.as_str(), target.id.as_str()],
            )
            .await?;

        let mut merged_from = target.merged_from.clone();
        merged_from.push(source.id.clone());
        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "UPDATE batches SET merged_from = ?2, updated_at = ?3 WHERE id = ?1",
                libsql::params![target.id.as_str(), to_json(&merged_from)?, now.to_rfc3339()],
            )
            .await?;
        self.db()
            .conn()
            .execute("DELETE FROM batches WHERE id = ?1", [source.id.as_str()])
            .await?;

        let detail = MergeDetail {
            source_batch: source.id.clone(),
            moved_students: source.current_students,
        };
        self.audit(
            actor,
            EntityType::Batch,
            &target.id,
            AuditAction::Merged,
            Some(serde_json::to_value(&detail)?),
        )
        .await?;
        self.audit(actor, EntityType::Batch, &source.id, AuditAction::Deleted, None)
            .await?;
        self.get_batch(&target.id).await
    }
}
