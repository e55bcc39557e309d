//! Class session repository: scheduling, status changes, and the trainer and
//! student schedules.

use chrono::Utc;

use campus_core::audit_detail::StatusChangedDetail;
use campus_core::entities::ClassSession;
use campus_core::enums::{AuditAction, EntityType, SessionStatus};
use campus_core::errors::CoreError;
use campus_core::ids::PREFIX_CLASS_SESSION;
use campus_core::validation::validate_session_data;

use crate::error::DatabaseError;
use crate::helpers::{get_bool, get_opt_string, get_u32, parse_datetime, parse_enum};
use crate::service::CampusService;
use crate::updates::session::{NewClassSession, SessionStatusChange};

const SELECT_COLS: &str = "id, title, description, batch_id, trainer_id, scheduled_date, \
     start_time, end_time, duration, session_type, location, is_online, meeting_url, status, \
     trainer_notes, created_at, updated_at";

fn row_to_session(row: &libsql::Row) -> Result<ClassSession, DatabaseError> {
    Ok(ClassSession {
        id: row.get::<String>(0)?,
        title: row.get::<String>(1)?,
        description: get_opt_string(row, 2)?,
        batch_id: row.get::<String>(3)?,
        trainer_id: row.get::<String>(4)?,
        scheduled_date: parse_datetime(&row.get::<String>(5)?)?,
        start_time: row.get::<String>(6)?,
        end_time: row.get::<String>(7)?,
        duration: get_u32(row, 8)?,
        session_type: parse_enum(&row.get::<String>(9)?)?,
        location: get_opt_string(row, 10)?,
        is_online: get_bool(row, 11)?,
        meeting_url: get_opt_string(row, 12)?,
        status: parse_enum(&row.get::<String>(13)?)?,
        trainer_notes: get_opt_string(row, 14)?,
        created_at: parse_datetime(&row.get::<String>(15)?)?,
        updated_at: parse_datetime(&row.get::<String>(16)?)?,
    })
}

impl CampusService {
    /// Schedule a class for a batch. The session's trainer must be the
    /// batch's trainer when the batch has one.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a bad form, `NotFound` for an unknown batch,
    /// `Forbidden` for someone else's batch, and `InvalidState` for a batch
    /// that has finished or been cancelled.
    pub async fn create_class_session(
        &self,
        actor: Option<&str>,
        input: &NewClassSession,
    ) -> Result<ClassSession, DatabaseError> {
        let form = input.form();
        let errors = validate_session_data(&form);
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        let batch_id = input.batch_id.as_deref().unwrap_or_default().trim();
        let trainer_id = input.trainer_id.as_deref().unwrap_or_default().trim();
        let _gate = self.gate().await;
        let batch = self.get_batch(batch_id).await?;
        if batch.trainer_id.as_deref().is_some_and(|t| t != trainer_id) {
            return Err(CoreError::Forbidden(
                "You can only schedule sessions for your own batches".into(),
            )
            .into());
        }
        if !batch.status.accepts_students() {
            return Err(DatabaseError::InvalidState(format!(
                "Cannot schedule sessions for a {} batch",
                batch.status
            )));
        }
        let (Some(scheduled_date), Some(duration)) = (
            form.scheduled_date,
            form.duration.and_then(|d| u32::try_from(d).ok()),
        ) else {
            return Err(DatabaseError::Validation(vec![
                "Scheduled date and duration are required".into(),
            ]));
        };

        let now = Utc::now();
        let session = ClassSession {
            id: self.db().generate_id(PREFIX_CLASS_SESSION).await?,
            title: input.title.as_deref().unwrap_or_default().trim().to_string(),
            description: input.description.clone(),
            batch_id: batch.id.clone(),
            trainer_id: trainer_id.to_string(),
            scheduled_date,
            start_time: input.start_time.clone(),
            end_time: input.end_time.clone(),
            duration,
            session_type: input.session_type,
            location: input.location.clone(),
            is_online: input.is_online,
            meeting_url: input.meeting_url.clone(),
            status: SessionStatus::Scheduled,
            trainer_notes: None,
            created_at: now,
            updated_at: now,
        };
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO class_sessions ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17)"
                ),
                libsql::params![
                    session.id.as_str(),
                    session.title.as_str(),
                    session.description.as_deref(),
                    session.batch_id.as_str(),
                    session.trainer_id.as_str(),
                    session.scheduled_date.to_rfc3339(),
                    session.start_time.as_str(),
                    session.end_time.as_str(),
                    i64::from(session.duration),
                    session.session_type.as_str(),
                    session.location.as_deref(),
                    i64::from(session.is_online),
                    session.meeting_url.as_deref(),
                    session.status.as_str(),
                    session.trainer_notes.as_deref(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.audit(
            actor,
            EntityType::ClassSession,
            &session.id,
            AuditAction::Created,
            None,
        )
        .await?;
        tracing::info!(session_id = %session.id, batch_id = %session.batch_id, "session scheduled");
        Ok(session)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no session has this id.
    pub async fn get_class_session(&self, id: &str) -> Result<ClassSession, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM class_sessions WHERE id = ?1"),
                [id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_session(&row),
            None => Err(DatabaseError::not_found("Session", id)),
        }
    }

    /// A trainer's sessions, soonest first, optionally of one status.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn sessions_for_trainer(
        &self,
        trainer_id: &str,
        status: Option<SessionStatus>,
    ) -> Result<Vec<ClassSession>, DatabaseError> {
        let _gate = self.gate().await;
        match status {
            Some(status) => {
                self.collect_sessions(
                    &format!(
                        "SELECT {SELECT_COLS} FROM class_sessions
                         WHERE trainer_id = ?1 AND status = ?2
                         ORDER BY scheduled_date, start_time"
                    ),
                    libsql::params![trainer_id, status.as_str()],
                )
                .await
            }
            None => {
                self.collect_sessions(
                    &format!(
                        "SELECT {SELECT_COLS} FROM class_sessions WHERE trainer_id = ?1
                         ORDER BY scheduled_date, start_time"
                    ),
                    [trainer_id],
                )
                .await
            }
        }
    }

    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn sessions_for_batch(
        &self,
        batch_id: &str,
    ) -> Result<Vec<ClassSession>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_sessions(
            &format!(
                "SELECT {SELECT_COLS} FROM class_sessions WHERE batch_id = ?1
                 ORDER BY scheduled_date, start_time"
            ),
            [batch_id],
        )
        .await
    }

    /// Upcoming scheduled sessions taught by a trainer.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn trainer_schedule(
        &self,
        trainer_id: &str,
    ) -> Result<Vec<ClassSession>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_sessions(
            &format!(
                "SELECT {SELECT_COLS} FROM class_sessions
                 WHERE trainer_id = ?1 AND status = 'scheduled' AND scheduled_date >= ?2
                 ORDER BY scheduled_date, start_time"
            ),
            libsql::params![trainer_id, Utc::now().to_rfc3339()],
        )
        .await
    }

    /// Upcoming scheduled sessions of every batch a student currently sits in.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn student_schedule(
        &self,
        student_id: &str,
    ) -> Result<Vec<ClassSession>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_sessions(
            &format!(
                "SELECT {SELECT_COLS} FROM class_sessions
                 WHERE status = 'scheduled' AND scheduled_date >= ?2
                   AND batch_id IN (
                       SELECT batch_id FROM enrollments
                       WHERE student_id = ?1 AND batch_id IS NOT NULL
                         AND status IN ('pending', 'enrolled', 'active'))
                 ORDER BY scheduled_date, start_time"
            ),
            libsql::params![student_id, Utc::now().to_rfc3339()],
        )
        .await
    }

    /// Move a session through its state machine, optionally recording the
    /// trainer's notes.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session and `InvalidTransition` for
    /// a move the state machine forbids.
    pub async fn change_session_status(
        &self,
        actor: Option<&str>,
        id: &str,
        change: &SessionStatusChange,
    ) -> Result<ClassSession, DatabaseError> {
        let _gate = self.gate().await;
        let session = self.get_class_session(id).await?;
        if !session.status.can_transition_to(change.status) {
            return Err(CoreError::InvalidTransition {
                entity_type: "session".into(),
                id: id.to_string(),
                from: session.status.as_str().into(),
                to: change.status.as_str().into(),
            }
            .into());
        }
        let trainer_notes = change.trainer_notes.clone().or(session.trainer_notes);
        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "UPDATE class_sessions SET status = ?2, trainer_notes = ?3, updated_at = ?4
                 WHERE id = ?1",
                libsql::params![
                    id,
                    change.status.as_str(),
                    trainer_notes.as_deref(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        let detail = StatusChangedDetail {
            from: session.status.as_str().to_string(),
            to: change.status.as_str().to_string(),
            reason: None,
        };
        self.audit(
            actor,
            EntityType::ClassSession,
            id,
            AuditAction::StatusChanged,
            Some(serde_json::to_value(&detail)?),
        )
        .await?;
        Ok(ClassSession {
            status: change.status,
            trainer_notes,
            updated_at: now,
            ..session
        })
    }

    async fn collect_sessions(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<ClassSession>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next().await? {
            sessions.push(row_to_session(&row)?);
        }
        Ok(sessions)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::test_support::helpers::{
        batch, published_course, raw_user, student, test_service, trainer,
    };
    use crate::updates::enrollment::NewEnrollment;
    use campus_core::enums::{BatchType, Role, SessionType};
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    pub(crate) fn new_session(
        batch_id: &str,
        trainer_id: &str,
        days_ahead: i64,
    ) -> NewClassSession {
        NewClassSession {
            title: Some("Dative Case Drill".into()),
            description: None,
            batch_id: Some(batch_id.to_string()),
            trainer_id: Some(trainer_id.to_string()),
            scheduled_date: Some(Utc::now() + Duration::days(days_ahead)),
            start_time: "18:00".into(),
            end_time: "19:30".into(),
            duration: None,
            session_type: SessionType::Lecture,
            location: None,
            is_online: true,
            meeting_url: Some("https://meet.example.com/abc".into()),
        }
    }

    #[tokio::test]
    async fn duration_comes_from_the_times() {
        let svc = test_service().await;
        let course = published_course(&svc, 20, 10).await;
        let t = trainer(&svc).await;
        let b = batch(&svc, &course.id, &t.id, 10).await;

        let session = svc
            .create_class_session(None, &new_session(&b.id, &t.id, 3))
            .await
            .unwrap();
        assert_eq!(session.duration, 90);
        assert_eq!(session.status, SessionStatus::Scheduled);
        assert_eq!(svc.get_class_session(&session.id).await.unwrap(), session);
    }

    #[tokio::test]
    async fn rejects_bad_forms_and_foreign_batches() {
        let svc = test_service().await;
        let course = published_course(&svc, 20, 10).await;
        let t = trainer(&svc).await;
        let b = batch(&svc, &course.id, &t.id, 10).await;

        let mut input = new_session(&b.id, &t.id, 3);
        input.end_time = "18:15".into();
        let err = svc.create_class_session(None, &input).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: Duration must be between 30 and 180 minutes"
        );

        let other = raw_user(&svc, "Otto Other", "otto@example.com", Role::Trainer).await;
        let err = svc
            .create_class_session(None, &new_session(&b.id, &other.id, 3))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "You can only schedule sessions for your own batches"
        );
    }

    #[tokio::test]
    async fn status_follows_the_state_machine() {
        let svc = test_service().await;
        let course = published_course(&svc, 20, 10).await;
        let t = trainer(&svc).await;
        let b = batch(&svc, &course.id, &t.id, 10).await;
        let session = svc
            .create_class_session(None, &new_session(&b.id, &t.id, 3))
            .await
            .unwrap();

        let err = svc
            .change_session_status(
                None,
                &session.id,
                &SessionStatusChange {
                    status: SessionStatus::Completed,
                    trainer_notes: None,
                },
            )
            .await
            .unwrap_err();
        assert!(err.to_string().contains("from scheduled to completed"));

        for status in [SessionStatus::InProgress, SessionStatus::Completed] {
            svc.change_session_status(
                Some(&t.id),
                &session.id,
                &SessionStatusChange {
                    status,
                    trainer_notes: Some("Covered chapter 4".into()),
                },
            )
            .await
            .unwrap();
        }
        let done = svc.get_class_session(&session.id).await.unwrap();
        assert_eq!(done.status, SessionStatus::Completed);
        assert_eq!(done.trainer_notes.as_deref(), Some("Covered chapter 4"));
        assert_eq!(
            svc.sessions_for_trainer(&t.id, Some(SessionStatus::Completed))
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn schedules_show_upcoming_sessions_only() {
        let svc = test_service().await;
        let course = published_course(&svc, 20, 10).await;
        let t = trainer(&svc).await;
        let b = batch(&svc, &course.id, &t.id, 10).await;
        let later = svc
            .create_class_session(None, &new_session(&b.id, &t.id, 5))
            .await
            .unwrap();
        let sooner = svc
            .create_class_session(None, &new_session(&b.id, &t.id, 2))
            .await
            .unwrap();
        let cancelled = svc
            .create_class_session(None, &new_session(&b.id, &t.id, 4))
            .await
            .unwrap();
        svc.change_session_status(
            None,
            &cancelled.id,
            &SessionStatusChange {
                status: SessionStatus::Cancelled,
                trainer_notes: None,
            },
        )
        .await
        .unwrap();

        let schedule: Vec<_> = svc
            .trainer_schedule(&t.id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(schedule, vec![sooner.id.clone(), later.id.clone()]);

        let s = student(&svc, 1).await;
        assert!(svc.student_schedule(&s.id).await.unwrap().is_empty());
        svc.create_enrollment(
            None,
            &NewEnrollment {
                student_id: s.id.clone(),
                course_id: course.id.clone(),
                batch_type: BatchType::Regular,
                batch_id: Some(b.id.clone()),
                payment_id: None,
                payment_amount: 0,
                notes: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(svc.student_schedule(&s.id).await.unwrap().len(), 2);
        assert_eq!(svc.sessions_for_batch(&b.id).await.unwrap().len(), 3);
    }
}
