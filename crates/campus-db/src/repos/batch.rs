//! Batch repository: CRUD, listings, and batch seat counters.

use chrono::Utc;
use serde::Deserialize;

use campus_core::audit_detail::StatusChangedDetail;
use campus_core::entities::Batch;
use campus_core::enums::{AuditAction, BatchStatus, BatchType, EntityType};
use campus_core::errors::CoreError;
use campus_core::ids::PREFIX_BATCH;
use campus_core::responses::Pagination;
use campus_core::validation::validate_batch_data;

use crate::error::DatabaseError;
use crate::helpers::{
    first_u64, get_bool, get_opt_string, get_u32, parse_datetime, parse_enum, parse_json,
    parse_optional_datetime, to_json,
};
use crate::service::{CampusService, finish};
use crate::updates::batch::{BatchUpdate, NewBatch};

pub(crate) const SELECT_COLS: &str = "id, name, course_id, trainer_id, batch_number, batch_type, \
     start_date, end_date, max_students, current_students, duration, status, is_leftover, \
     merged_from, meeting_schedule, notes, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFilter {
    pub course_id: Option<String>,
    pub batch_type: Option<BatchType>,
    pub status: Option<BatchStatus>,
    pub trainer_id: Option<String>,
}

pub(crate) fn row_to_batch(row: &libsql::Row) -> Result<Batch, DatabaseError> {
    let start_date = get_opt_string(row, 6)?;
    let end_date = get_opt_string(row, 7)?;
    Ok(Batch {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        course_id: row.get::<String>(2)?,
        trainer_id: get_opt_string(row, 3)?,
        batch_number: get_u32(row, 4)?,
        batch_type: parse_enum(&row.get::<String>(5)?)?,
        start_date: parse_optional_datetime(start_date.as_deref())?,
        end_date: parse_optional_datetime(end_date.as_deref())?,
        max_students: get_u32(row, 8)?,
        current_students: get_u32(row, 9)?,
        duration: get_u32(row, 10)?,
        status: parse_enum(&row.get::<String>(11)?)?,
        is_leftover: get_bool(row, 12)?,
        merged_from: parse_json(&row.get::<String>(13)?)?,
        meeting_schedule: parse_json(&row.get::<String>(14)?)?,
        notes: get_opt_string(row, 15)?,
        created_at: parse_datetime(&row.get::<String>(16)?)?,
        updated_at: parse_datetime(&row.get::<String>(17)?)?,
    })
}

impl CampusService {
    /// Create a batch by hand. Planner-made batches go through
    /// [`Self::insert_batch`] and skip the form rules.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad form or a disabled batch type, and
    /// `NotFound` for an unknown course or trainer.
    pub async fn create_batch(
        &self,
        actor: Option<&str>,
        input: &NewBatch,
    ) -> Result<Batch, DatabaseError> {
        let errors = validate_batch_data(&input.form());
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        let _gate = self.gate().await;
        let course_id = input.course_id.as_deref().unwrap_or_default().trim();
        let course = self.get_course(course_id).await?;
        if !course.batch_types.get(input.batch_type).enabled {
            return Err(DatabaseError::Validation(vec![format!(
                "{} batches are not enabled for this course",
                input.batch_type.title()
            )]));
        }
        let trainer_id = input.trainer_id.as_deref().map(str::trim);
        if let Some(trainer) = trainer_id {
            self.ensure_exists(EntityType::User, "Trainer", trainer).await?;
        }
        let max_students = input
            .max_students
            .and_then(|m| u32::try_from(m).ok())
            .unwrap_or(course.batch_size_limit);

        let now = Utc::now();
        let batch = Batch {
            id: self.db().generate_id(PREFIX_BATCH).await?,
            name: input.name.as_deref().unwrap_or_default().trim().to_string(),
            course_id: course.id.clone(),
            trainer_id: trainer_id.map(String::from),
            batch_number: self.next_batch_number(&course.id, input.batch_type).await?,
            batch_type: input.batch_type,
            start_date: input.start_date,
            end_date: input.end_date,
            max_students,
            current_students: 0,
            duration: input.duration.unwrap_or(course.course_duration),
            status: BatchStatus::Upcoming,
            is_leftover: false,
            merged_from: Vec::new(),
            meeting_schedule: input.meeting_schedule.clone(),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.insert_batch(&batch).await?;
        self.audit(actor, EntityType::Batch, &batch.id, AuditAction::Created, None)
            .await?;
        tracing::info!(batch_id = %batch.id, course_id = %batch.course_id, "batch created");
        Ok(batch)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no batch has this id.
    pub async fn get_batch(&self, id: &str) -> Result<Batch, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM batches WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Batch", id))?;
        row_to_batch(&row)
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_batches(
        &self,
        filter: &BatchFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Batch>, Pagination), DatabaseError> {
        let _gate = self.gate().await;
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(ref course_id) = filter.course_id {
            params.push(course_id.clone().into());
            conditions.push(format!("course_id = ?{}", params.len()));
        }
        if let Some(batch_type) = filter.batch_type {
            params.push(batch_type.as_str().into());
            conditions.push(format!("batch_type = ?{}", params.len()));
        }
        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(ref trainer_id) = filter.trainer_id {
            params.push(trainer_id.clone().into());
            conditions.push(format!("trainer_id = ?{}", params.len()));
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
                    &format!("SELECT COUNT(*) FROM batches {where_clause}"),
                    libsql::params_from_iter(params.clone()),
                )
                .await?,
        )
        .await?;
        let pagination = Pagination::new(page, limit, total);

        let sql = format!(
            "SELECT {SELECT_COLS} FROM batches {where_clause}
             ORDER BY created_at DESC, batch_number LIMIT {limit} OFFSET {}",
            pagination.offset()
        );
        let batches = self
            .collect_batches(&sql, libsql::params_from_iter(params))
            .await?;
        Ok((batches, pagination))
    }

    /// Every batch of a course, regular before revision, by number.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn batches_for_course(&self, course_id: &str) -> Result<Vec<Batch>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_batches(
            &format!(
                "SELECT {SELECT_COLS} FROM batches WHERE course_id = ?1
                 ORDER BY batch_type, batch_number"
            ),
            [course_id],
        )
        .await
    }

    /// Batches taught by a trainer, soonest start first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn batches_for_trainer(&self, trainer_id: &str) -> Result<Vec<Batch>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_batches(
            &format!(
                "SELECT {SELECT_COLS} FROM batches WHERE trainer_id = ?1
                 ORDER BY start_date IS NULL, start_date, batch_number"
            ),
            [trainer_id],
        )
        .await
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for a disallowed status move and
    /// `Validation` when the new limit is below the current head count.
    pub async fn update_batch(
        &self,
        actor: Option<&str>,
        id: &str,
        update: &BatchUpdate,
    ) -> Result<Batch, DatabaseError> {
        let _gate = self.gate().await;
        let current = self.get_batch(id).await?;

        if let Some(status) = update
            .status
            .filter(|s| *s != current.status && !current.status.can_transition_to(*s))
        {
            return Err(CoreError::InvalidTransition {
                entity_type: "batch".into(),
                id: id.to_string(),
                from: current.status.as_str().into(),
                to: status.as_str().into(),
            }
            .into());
        }
        let mut errors = Vec::new();
        if update.name.as_deref().is_some_and(|n| n.trim().chars().count() < 3) {
            errors.push("Batch name must be at least 3 characters".to_string());
        }
        if let Some(max) = update.max_students {
            if !(1..=100).contains(&max) {
                errors.push("Max students must be between 1 and 100".to_string());
            } else if max < current.current_students {
                errors.push(format!(
                    "Max students cannot be below the {} students already placed",
                    current.current_students
                ));
            }
        }
        let start = update.start_date.or(current.start_date);
        let end = update.end_date.or(current.end_date);
        if matches!((start, end), (Some(s), Some(e)) if e <= s) {
            errors.push("End date must be after start date".to_string());
        }
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        if let Some(Some(ref trainer)) = update.trainer_id {
            self.ensure_exists(EntityType::User, "Trainer", trainer).await?;
        }

        let mut sets = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(ref name) = update.name {
            params.push(name.trim().to_string().into());
            sets.push(format!("name = ?{}", params.len()));
        }
        if let Some(ref trainer_id) = update.trainer_id {
            params.push(trainer_id.clone().map_or(libsql::Value::Null, libsql::Value::Text));
            sets.push(format!("trainer_id = ?{}", params.len()));
        }
        if let Some(start_date) = update.start_date {
            params.push(start_date.to_rfc3339().into());
            sets.push(format!("start_date = ?{}", params.len()));
        }
        if let Some(end_date) = update.end_date {
            params.push(end_date.to_rfc3339().into());
            sets.push(format!("end_date = ?{}", params.len()));
        }
        if let Some(max) = update.max_students {
            params.push(i64::from(max).into());
            sets.push(format!("max_students = ?{}", params.len()));
        }
        if let Some(duration) = update.duration {
            params.push(i64::from(duration).into());
            sets.push(format!("duration = ?{}", params.len()));
        }
        if let Some(status) = update.status {
            params.push(status.as_str().into());
            sets.push(format!("status = ?{}", params.len()));
        }
        if let Some(ref schedule) = update.meeting_schedule {
            params.push(to_json(schedule)?.into());
            sets.push(format!("meeting_schedule = ?{}", params.len()));
        }
        if let Some(ref notes) = update.notes {
            params.push(notes.clone().map_or(libsql::Value::Null, libsql::Value::Text));
            sets.push(format!("notes = ?{}", params.len()));
        }
        if sets.is_empty() {
            return Ok(current);
        }
        params.push(Utc::now().to_rfc3339().into());
        sets.push(format!("updated_at = ?{}", params.len()));
        params.push(id.to_string().into());
        let sql = format!(
            "UPDATE batches SET {} WHERE id = ?{}",
            sets.join(", "),
            params.len()
        );

        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            self.db()
                .conn()
                .execute(&sql, libsql::params_from_iter(params))
                .await?;
            self.audit(
                actor,
                EntityType::Batch,
                id,
                AuditAction::Updated,
                Some(serde_json::to_value(update)?),
            )
            .await?;
            if let Some(status) = update.status.filter(|s| *s != current.status) {
                let detail = StatusChangedDetail {
                    from: current.status.as_str().into(),
                    to: status.as_str().into(),
                    reason: None,
                };
                self.audit(
                    actor,
                    EntityType::Batch,
                    id,
                    AuditAction::StatusChanged,
                    Some(serde_json::to_value(&detail)?),
                )
                .await?;
            }
            Ok(())
        }
        .await;
        finish(tx, result).await?;
        self.get_batch(id).await
    }

    /// Delete a batch. Its students keep their course seats and fall back to
    /// unassigned.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no batch has this id.
    pub async fn delete_batch(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.gate().await;
        self.ensure_exists(EntityType::Batch, "Batch", id).await?;
        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            self.db()
                .conn()
                .execute("DELETE FROM batches WHERE id = ?1", [id])
                .await?;
            self.audit(actor, EntityType::Batch, id, AuditAction::Deleted, None)
                .await
        }
        .await;
        finish(tx, result).await?;
        tracing::info!(batch_id = id, "batch deleted");
        Ok(())
    }

    /// Place `count` students into a batch in one conditional UPDATE. Fails
    /// without changing anything when the seats are not there.
    pub(crate) async fn reserve_batch_seats(
        &self,
        batch_id: &str,
        count: u32,
    ) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE batches SET current_students = current_students + ?2, updated_at = ?3
                 WHERE id = ?1 AND current_students + ?2 <= max_students
                   AND status IN ('upcoming', 'active')",
                libsql::params![batch_id, i64::from(count), Utc::now().to_rfc3339()],
            )
            .await?;
        if changed > 0 {
            return Ok(());
        }
        let batch = self.get_batch(batch_id).await?;
        if batch.status.accepts_students() {
            Err(DatabaseError::capacity("Batch is full"))
        } else {
            Err(DatabaseError::InvalidState(format!(
                "Batch is {} and not accepting students",
                batch.status
            )))
        }
    }

    pub(crate) async fn release_batch_seat(&self, batch_id: &str) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                "UPDATE batches SET current_students = current_students - 1, updated_at = ?2
                 WHERE id = ?1 AND current_students > 0",
                libsql::params![batch_id, Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn next_batch_number(
        &self,
        course_id: &str,
        batch_type: BatchType,
    ) -> Result<u32, DatabaseError> {
        let max = first_u64(
            self.db()
                .conn()
                .query(
                    "SELECT COALESCE(MAX(batch_number), 0) FROM batches
                     WHERE course_id = ?1 AND batch_type = ?2",
                    libsql::params![course_id, batch_type.as_str()],
                )
                .await?,
        )
        .await?;
        u32::try_from(max + 1)
            .map_err(|_| DatabaseError::Query(format!("batch number overflow: {max}")))
    }

    /// Write a fully built batch row.
    pub(crate) async fn insert_batch(&self, batch: &Batch) -> Result<(), DatabaseError> {
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO batches ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17, ?18)"
                ),
                libsql::params![
                    batch.id.as_str(),
                    batch.name.as_str(),
                    batch.course_id.as_str(),
                    batch.trainer_id.as_deref(),
                    i64::from(batch.batch_number),
                    batch.batch_type.as_str(),
                    batch.start_date.map(|d| d.to_rfc3339()),
                    batch.end_date.map(|d| d.to_rfc3339()),
                    i64::from(batch.max_students),
                    i64::from(batch.current_students),
                    i64::from(batch.duration),
                    batch.status.as_str(),
                    i64::from(batch.is_leftover),
                    to_json(&batch.merged_from)?,
                    to_json(&batch.meeting_schedule)?,
                    batch.notes.as_deref(),
                    batch.created_at.to_rfc3339(),
                    batch.updated_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    async fn collect_batches(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Batch>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut batches = Vec::new();
        while let Some(row) = rows.next().await? {
            batches.push(row_to_batch(&row)?);
        }
        Ok(batches)
    }
}
