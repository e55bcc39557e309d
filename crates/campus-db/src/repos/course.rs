//! Course repository: CRUD, listing filters, and course-level seat counters.

use chrono::Utc;
use serde::Deserialize;

use campus_core::audit_detail::StatusChangedDetail;
use campus_core::entities::{BatchTypeConfig, BatchTypes, Course};
use campus_core::enums::{AuditAction, BatchType, CourseStatus, EntityType, Language, Level};
use campus_core::errors::CoreError;
use campus_core::ids::PREFIX_COURSE;
use campus_core::responses::Pagination;
use campus_core::validation::validate_course;

use crate::error::DatabaseError;
use crate::helpers::{
    enum_to_str, first_u64, get_bool, get_opt_string, get_u32, get_u64, parse_datetime,
    parse_enum, parse_json, to_i64, to_json,
};
use crate::service::{CampusService, finish};
use crate::updates::course::{CourseUpdate, NewCourse};

pub(crate) const SELECT_COLS: &str = "id, name, language, level, month, year, total_capacity, \
     course_duration, batch_size_limit, regular_enabled, regular_count, revision_enabled, \
     revision_count, pricing, price, offline_materials, description, instructor_id, trainer_ids, \
     status, created_at, updated_at";

/// Filter criteria for course listings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFilter {
    pub status: Option<CourseStatus>,
    pub language: Option<Language>,
    pub level: Option<Level>,
    /// Hide drafts and cancelled courses unless a status is asked for.
    #[serde(skip)]
    pub public_only: bool,
}

pub(crate) fn row_to_course(row: &libsql::Row) -> Result<Course, DatabaseError> {
    Ok(Course {
        id: row.get::<String>(0)?,
        name: get_opt_string(row, 1)?,
        language: parse_enum(&row.get::<String>(2)?)?,
        level: parse_enum(&row.get::<String>(3)?)?,
        month: get_u32(row, 4)?,
        year: row.get::<i32>(5)?,
        total_capacity: get_u32(row, 6)?,
        course_duration: get_u32(row, 7)?,
        batch_size_limit: get_u32(row, 8)?,
        batch_types: BatchTypes {
            regular: BatchTypeConfig {
                enabled: get_bool(row, 9)?,
                student_count: get_u32(row, 10)?,
            },
            revision: BatchTypeConfig {
                enabled: get_bool(row, 11)?,
                student_count: get_u32(row, 12)?,
            },
        },
        pricing: parse_json(&row.get::<String>(13)?)?,
        price: get_u64(row, 14)?,
        offline_materials: parse_json(&row.get::<String>(15)?)?,
        description: row.get::<String>(16)?,
        instructor_id: get_opt_string(row, 17)?,
        trainer_ids: parse_json(&row.get::<String>(18)?)?,
        status: parse_enum(&row.get::<String>(19)?)?,
        created_at: parse_datetime(&row.get::<String>(20)?)?,
        updated_at: parse_datetime(&row.get::<String>(21)?)?,
    })
}

/// Seat counter column for a batch type.
pub(crate) const fn count_column(batch_type: BatchType) -> &'static str {
    match batch_type {
        BatchType::Regular => "regular_count",
        BatchType::Revision => "revision_count",
    }
}

fn ensure_valid(course: &Course) -> Result<(), DatabaseError> {
    let errors = validate_course(course);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(DatabaseError::Validation(errors))
    }
}

impl CampusService {
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` when the course settings are out of
    /// range, or `NotFound` for an unknown instructor.
    pub async fn create_course(
        &self,
        actor: Option<&str>,
        input: &NewCourse,
    ) -> Result<Course, DatabaseError> {
        let now = Utc::now();
        let mut course = Course {
            id: String::new(),
            name: input.name.clone().filter(|n| !n.trim().is_empty()),
            language: input.language,
            level: input.level,
            month: input.month,
            year: input.year,
            total_capacity: input.total_capacity,
            course_duration: input.course_duration,
            batch_size_limit: input.batch_size_limit,
            batch_types: BatchTypes {
                regular: BatchTypeConfig {
                    enabled: input.batch_types.regular.enabled,
                    student_count: 0,
                },
                revision: BatchTypeConfig {
                    enabled: input.batch_types.revision.enabled,
                    student_count: 0,
                },
            },
            pricing: input.pricing.clone(),
            price: 0,
            offline_materials: input.offline_materials.clone(),
            description: input.description.trim().to_string(),
            instructor_id: input.instructor_id.clone(),
            trainer_ids: input.trainer_ids.clone(),
            status: input.status.unwrap_or(CourseStatus::Draft),
            created_at: now,
            updated_at: now,
        };
        course.recompute_offline_costs();
        ensure_valid(&course)?;
        if let Some(ref instructor) = course.instructor_id {
            self.ensure_exists(EntityType::User, "Instructor", instructor)
                .await?;
        }

        let _gate = self.gate().await;
        course.id = self.db().generate_id(PREFIX_COURSE).await?;
        self.write_course(&course, true).await?;
        self.audit(actor, EntityType::Course, &course.id, AuditAction::Created, None)
            .await?;
        tracing::info!(course_id = %course.id, name = %course.display_name(), "course created");
        Ok(course)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no course has this id.
    pub async fn get_course(&self, id: &str) -> Result<Course, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM courses WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("Course", id))?;
        row_to_course(&row)
    }

    /// Paged course listing, newest intake first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_courses(
        &self,
        filter: &CourseFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Course>, Pagination), DatabaseError> {
        let _gate = self.gate().await;
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        } else if filter.public_only {
            conditions.push("status IN ('published', 'active')".to_string());
        }
        if let Some(language) = filter.language {
            params.push(language.as_str().into());
            conditions.push(format!("language = ?{}", params.len()));
        }
        if let Some(level) = filter.level {
            params.push(level.as_str().into());
            conditions.push(format!("level = ?{}", params.len()));
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
                    &format!("SELECT COUNT(*) FROM courses {where_clause}"),
                    libsql::params_from_iter(params.clone()),
                )
                .await?,
        )
        .await?;
        let pagination = Pagination::new(page, limit, total);

        let sql = format!(
            "SELECT {SELECT_COLS} FROM courses {where_clause}
             ORDER BY year DESC, month DESC, created_at DESC LIMIT {limit} OFFSET {}",
            pagination.offset()
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next().await? {
            courses.push(row_to_course(&row)?);
        }
        Ok((courses, pagination))
    }

    /// Courses a trainer teaches, as instructor or listed trainer.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_courses_for_trainer(
        &self,
        trainer_id: &str,
    ) -> Result<Vec<Course>, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {SELECT_COLS} FROM courses
                     WHERE instructor_id = ?1
                        OR EXISTS (SELECT 1 FROM json_each(courses.trainer_ids) WHERE value = ?1)
                     ORDER BY year DESC, month DESC"
                ),
                [trainer_id],
            )
            .await?;
        let mut courses = Vec::new();
        while let Some(row) = rows.next().await? {
            courses.push(row_to_course(&row)?);
        }
        Ok(courses)
    }

    /// Apply a partial update. Status moves must follow the course state
    /// machine; the result is re-validated as a whole.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `InvalidTransition`, or `Validation` errors.
    pub async fn update_course(
        &self,
        actor: Option<&str>,
        id: &str,
        update: &CourseUpdate,
    ) -> Result<Course, DatabaseError> {
        let _gate = self.gate().await;
        let before = self.get_course(id).await?;
        let mut course = before.clone();

        if let Some(ref name) = update.name {
            course.name = name.clone().filter(|n| !n.trim().is_empty());
        }
        if let Some(language) = update.language {
            course.language = language;
        }
        if let Some(level) = update.level {
            course.level = level;
        }
        if let Some(month) = update.month {
            course.month = month;
        }
        if let Some(year) = update.year {
            course.year = year;
        }
        if let Some(capacity) = update.total_capacity {
            course.total_capacity = capacity;
        }
        if let Some(duration) = update.course_duration {
            course.course_duration = duration;
        }
        if let Some(limit) = update.batch_size_limit {
            course.batch_size_limit = limit;
        }
        if let Some(enabled) = update.regular_enabled {
            course.batch_types.regular.enabled = enabled;
        }
        if let Some(enabled) = update.revision_enabled {
            course.batch_types.revision.enabled = enabled;
        }
        if let Some(ref pricing) = update.pricing {
            course.pricing = pricing.clone();
        }
        if let Some(ref materials) = update.offline_materials {
            course.offline_materials = materials.clone();
        }
        if let Some(ref description) = update.description {
            course.description = description.trim().to_string();
        }
        if let Some(ref instructor) = update.instructor_id {
            if let Some(instructor) = instructor {
                self.ensure_exists(EntityType::User, "Instructor", instructor)
                    .await?;
            }
            course.instructor_id = instructor.clone();
        }
        if let Some(ref trainers) = update.trainer_ids {
            course.trainer_ids = trainers.clone();
        }
        if let Some(status) = update.status.filter(|s| *s != before.status) {
            if !before.status.can_transition_to(status) {
                return Err(CoreError::InvalidTransition {
                    entity_type: "course".into(),
                    id: id.to_string(),
                    from: before.status.as_str().into(),
                    to: status.as_str().into(),
                }
                .into());
            }
            course.status = status;
        }
        course.recompute_offline_costs();
        ensure_valid(&course)?;
        course.updated_at = Utc::now();

        self.write_course(&course, false).await?;
        self.audit(
            actor,
            EntityType::Course,
            id,
            AuditAction::Updated,
            Some(serde_json::to_value(update)?),
        )
        .await?;
        if course.status != before.status {
            let detail = StatusChangedDetail {
                from: before.status.as_str().into(),
                to: course.status.as_str().into(),
                reason: None,
            };
            self.audit(
                actor,
                EntityType::Course,
                id,
                AuditAction::StatusChanged,
                Some(serde_json::to_value(&detail)?),
            )
            .await?;
        }
        Ok(course)
    }

    /// Delete a course together with its batches, enrollments, sessions,
    /// materials, and progress.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no course has this id.
    pub async fn delete_course(&self, actor: Option<&str>, id: &str) -> Result<(), DatabaseError> {
        let _gate = self.gate().await;
        self.ensure_exists(EntityType::Course, "Course", id).await?;
        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            self.db()
                .conn()
                .execute("DELETE FROM courses WHERE id = ?1", [id])
                .await?;
            self.audit(actor, EntityType::Course, id, AuditAction::Deleted, None)
                .await
        }
        .await;
        finish(tx, result).await?;
        tracing::info!(course_id = id, "course deleted");
        Ok(())
    }

    /// Take one course seat of `batch_type`. A single conditional UPDATE, so
    /// concurrent callers can never push the course past its capacity.
    pub(crate) async fn reserve_course_seat(
        &self,
        course_id: &str,
        batch_type: BatchType,
    ) -> Result<(), DatabaseError> {
        let column = count_column(batch_type);
        let changed = self
            .db()
            .conn()
            .execute(
                &format!(
                    "UPDATE courses SET {column} = {column} + 1, updated_at = ?2
                     WHERE id = ?1 AND regular_count + revision_count + 1 <= total_capacity"
                ),
                libsql::params![course_id, Utc::now().to_rfc3339()],
            )
            .await?;
        if changed == 0 {
            self.ensure_exists(EntityType::Course, "Course", course_id)
                .await?;
            return Err(DatabaseError::capacity("Course is full"));
        }
        Ok(())
    }

    /// Give back one course seat of `batch_type`. Never goes below zero.
    pub(crate) async fn release_course_seat(
        &self,
        course_id: &str,
        batch_type: BatchType,
    ) -> Result<(), DatabaseError> {
        let column = count_column(batch_type);
        self.db()
            .conn()
            .execute(
                &format!(
                    "UPDATE courses SET {column} = {column} - 1, updated_at = ?2
                     WHERE id = ?1 AND {column} > 0"
                ),
                libsql::params![course_id, Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    async fn write_course(&self, course: &Course, insert: bool) -> Result<(), DatabaseError> {
        let params = libsql::params![
            course.id.as_str(),
            course.name.as_deref(),
            enum_to_str(&course.language)?,
            enum_to_str(&course.level)?,
            i64::from(course.month),
            course.year,
            i64::from(course.total_capacity),
            i64::from(course.course_duration),
            i64::from(course.batch_size_limit),
            i64::from(course.batch_types.regular.enabled),
            i64::from(course.batch_types.revision.enabled),
            to_json(&course.pricing)?,
            to_i64(course.price),
            to_json(&course.offline_materials)?,
            course.description.as_str(),
            course.instructor_id.as_deref(),
            to_json(&course.trainer_ids)?,
            course.status.as_str(),
            course.created_at.to_rfc3339(),
            course.updated_at.to_rfc3339()
        ];
        let sql = if insert {
            "INSERT INTO courses (id, name, language, level, month, year, total_capacity,
                 course_duration, batch_size_limit, regular_enabled, revision_enabled, pricing,
                 price, offline_materials, description, instructor_id, trainer_ids, status,
                 created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                 ?18, ?19, ?20)"
        } else {
            // Seat counters and created_at (?19) are never rewritten here.
            "UPDATE courses SET name = ?2, language = ?3, level = ?4, month = ?5, year = ?6,
                 total_capacity = ?7, course_duration = ?8, batch_size_limit = ?9,
                 regular_enabled = ?10, revision_enabled = ?11, pricing = ?12, price = ?13,
                 offline_materials = ?14, description = ?15, instructor_id = ?16,
                 trainer_ids = ?17, status = ?18, updated_at = ?20
             WHERE id = ?1"
        };
        self.db().conn().execute(sql, params).await?;
        Ok(())
    }
}
