//! Study material repository.

use chrono::Utc;

use campus_core::entities::Material;
use campus_core::enums::{AuditAction, EntityType, Role};
use campus_core::errors::CoreError;
use campus_core::ids::PREFIX_MATERIAL;

use crate::error::DatabaseError;
use crate::helpers::{get_opt_string, get_u64, parse_datetime, parse_enum};
use crate::service::CampusService;
use crate::updates::material::NewMaterial;

const SELECT_COLS: &str = "id, title, description, file_url, material_type, course_id, batch_id, \
     uploaded_by, status, downloads, created_at, updated_at";

fn row_to_material(row: &libsql::Row) -> Result<Material, DatabaseError> {
    Ok(Material {
        id: row.get::<String>(0)?,
        title: row.get::<String>(1)?,
        description: get_opt_string(row, 2)?,
        file_url: row.get::<String>(3)?,
        material_type: parse_enum(&row.get::<String>(4)?)?,
        course_id: row.get::<String>(5)?,
        batch_id: get_opt_string(row, 6)?,
        uploaded_by: row.get::<String>(7)?,
        status: parse_enum(&row.get::<String>(8)?)?,
        downloads: get_u64(row, 9)?,
        created_at: parse_datetime(&row.get::<String>(10)?)?,
        updated_at: parse_datetime(&row.get::<String>(11)?)?,
    })
}

impl CampusService {
    /// Attach a material to a course, optionally scoped to one of its
    /// batches. Trainers may only upload to courses or batches they teach.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing fields or a batch of another course,
    /// `NotFound` for unknown references, and `Forbidden` for a trainer
    /// outside the course.
    pub async fn create_material(
        &self,
        uploaded_by: &str,
        role: Role,
        input: &NewMaterial,
    ) -> Result<Material, DatabaseError> {
        let mut errors = Vec::new();
        if input.title.trim().is_empty() {
            errors.push("Title is required".to_string());
        }
        if input.file_url.trim().is_empty() {
            errors.push("File URL is required".to_string());
        }
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        let _gate = self.gate().await;
        let course = self.get_course(&input.course_id).await?;
        let batch = match input.batch_id.as_deref() {
            Some(batch_id) => Some(self.get_batch(batch_id).await?),
            None => None,
        };
        if batch.as_ref().is_some_and(|b| b.course_id != course.id) {
            return Err(DatabaseError::Validation(vec![
                "Batch belongs to a different course".into(),
            ]));
        }
        let teaches_batch = batch
            .as_ref()
            .is_some_and(|b| b.trainer_id.as_deref() == Some(uploaded_by));
        if role == Role::Trainer && !course.is_trainer(uploaded_by) && !teaches_batch {
            return Err(CoreError::Forbidden(
                "You can only upload materials for courses you teach".into(),
            )
            .into());
        }

        let now = Utc::now();
        let material = Material {
            id: self.db().generate_id(PREFIX_MATERIAL).await?,
            title: input.title.trim().to_string(),
            description: input.description.clone(),
            file_url: input.file_url.trim().to_string(),
            material_type: input.material_type,
            course_id: course.id.clone(),
            batch_id: batch.map(|b| b.id),
            uploaded_by: uploaded_by.to_string(),
            status: input.status,
            downloads: 0,
            created_at: now,
            updated_at: now,
        };
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO materials ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11)"
                ),
                libsql::params![
                    material.id.as_str(),
                    material.title.as_str(),
                    material.description.as_deref(),
                    material.file_url.as_str(),
                    material.material_type.as_str(),
                    material.course_id.as_str(),
                    material.batch_id.as_deref(),
                    material.uploaded_by.as_str(),
                    material.status.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.audit(
            Some(uploaded_by),
            EntityType::Material,
            &material.id,
            AuditAction::Created,
            None,
        )
        .await?;
        tracing::info!(
            material_id = %material.id,
            course_id = %material.course_id,
            "material uploaded"
        );
        Ok(material)
    }

    /// Materials a trainer uploaded, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn materials_for_trainer(
        &self,
        trainer_id: &str,
    ) -> Result<Vec<Material>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_materials(
            &format!(
                "SELECT {SELECT_COLS} FROM materials WHERE uploaded_by = ?1
                 ORDER BY created_at DESC"
            ),
            [trainer_id],
        )
        .await
    }

    /// Published materials of the student's current courses. Batch-scoped
    /// materials only show to students of that batch.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn student_materials(
        &self,
        student_id: &str,
    ) -> Result<Vec<Material>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_materials(
            &format!(
                "SELECT {SELECT_COLS} FROM materials m
                 WHERE m.status = 'published' AND EXISTS (
                     SELECT 1 FROM enrollments e
                     WHERE e.student_id = ?1 AND e.course_id = m.course_id
                       AND e.status IN ('pending', 'enrolled', 'active', 'completed')
                       AND (m.batch_id IS NULL OR m.batch_id = e.batch_id))
                 ORDER BY m.created_at DESC"
            ),
            [student_id],
        )
        .await
    }

    async fn collect_materials(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Material>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut materials = Vec::new();
        while let Some(row) = rows.next().await? {
            materials.push(row_to_material(&row)?);
        }
        Ok(materials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::helpers::{
        batch, published_course, raw_user, student, test_service, trainer,
    };
    use crate::updates::course::CourseUpdateBuilder;
    use crate::updates::enrollment::NewEnrollment;
    use campus_core::enums::{BatchType, MaterialStatus, MaterialType};
    use pretty_assertions::assert_eq;

    fn new_material(course_id: &str, batch_id: Option<&str>, title: &str) -> NewMaterial {
        NewMaterial {
            title: title.to_string(),
            description: None,
            file_url: "https://files.example.com/a1-workbook.pdf".into(),
            material_type: MaterialType::Pdf,
            course_id: course_id.to_string(),
            batch_id: batch_id.map(String::from),
            status: MaterialStatus::Published,
        }
    }

    #[tokio::test]
    async fn trainers_upload_only_to_their_courses() {
        let svc = test_service().await;
        let course = published_course(&svc, 20, 10).await;
        let t = trainer(&svc).await;
        let outsider = raw_user(&svc, "Otto Other", "otto@example.com", Role::Trainer).await;

        let workbook = new_material(&course.id, None, "Workbook");
        let err = svc
            .create_material(&outsider.id, Role::Trainer, &workbook)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You can only upload materials for courses you teach");

        let assign = CourseUpdateBuilder::new().instructor(Some(t.id.clone())).build();
        svc.update_course(None, &course.id, &assign)
            .await
            .unwrap();
        let material = svc
            .create_material(&t.id, Role::Trainer, &new_material(&course.id, None, "Workbook"))
            .await
            .unwrap();
        assert_eq!(material.downloads, 0);
        assert_eq!(svc.materials_for_trainer(&t.id).await.unwrap(), vec![material]);

        let err = svc
            .create_material("usr-admin", Role::Admin, &new_material(&course.id, None, " "))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: Title is required");
    }

    #[tokio::test]
    async fn students_see_course_and_own_batch_materials() {
        let svc = test_service().await;
        let course = published_course(&svc, 20, 10).await;
        let t = trainer(&svc).await;
        let mine = batch(&svc, &course.id, &t.id, 10).await;
        let other = batch(&svc, &course.id, &t.id, 10).await;
        let s = student(&svc, 1).await;
        svc.create_enrollment(
            None,
            &NewEnrollment {
                student_id: s.id.clone(),
                course_id: course.id.clone(),
                batch_type: BatchType::Regular,
                batch_id: Some(mine.id.clone()),
                payment_id: None,
                payment_amount: 0,
                notes: None,
            },
        )
        .await
        .unwrap();

        for (batch_id, title) in [
            (None, "Course handout"),
            (Some(mine.id.as_str()), "My batch notes"),
            (Some(other.id.as_str()), "Other batch notes"),
        ] {
            svc.create_material(&t.id, Role::Trainer, &new_material(&course.id, batch_id, title))
                .await
                .unwrap();
        }
        let mut draft = new_material(&course.id, None, "Unreleased");
        draft.status = MaterialStatus::Draft;
        svc.create_material("usr-admin", Role::Admin, &draft).await.unwrap();

        let mut titles: Vec<_> = svc
            .student_materials(&s.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        titles.sort();
        assert_eq!(titles, vec!["Course handout", "My batch notes"]);
    }
}
