//! Homepage ad repository: CRUD, audience-targeted listing, and
//! impression/click/close counters.

use chrono::Utc;

use campus_core::entities::HomepageAd;
use campus_core::enums::{AdEvent, AuditAction, EntityType, PublishStatus, Role};
use campus_core::ids::PREFIX_AD;
use campus_core::responses::Pagination;
use campus_core::validation::validate_homepage_ad;

use crate::error::DatabaseError;
use crate::helpers::{
    first_u64, get_opt_string, get_opt_u32, get_u32, get_u64, parse_datetime, parse_enum,
    parse_json, to_i64, to_json,
};
use crate::service::{CampusService, finish};
use crate::updates::homepage_ad::{HomepageAdUpdate, NewHomepageAd};

const SELECT_COLS: &str = "id, course_id, ad_type, special_note, cta_text, cta_link, \
     timer_seconds, frequency, target_audience, target_roles, start_date, end_date, status, \
     impressions, clicks, closes, priority, created_by, created_at, updated_at";

fn row_to_ad(row: &libsql::Row) -> Result<HomepageAd, DatabaseError> {
    Ok(HomepageAd {
        id: row.get::<String>(0)?,
        course_id: get_opt_string(row, 1)?,
        ad_type: parse_enum(&row.get::<String>(2)?)?,
        special_note: row.get::<String>(3)?,
        cta_text: row.get::<String>(4)?,
        cta_link: row.get::<String>(5)?,
        timer_seconds: get_opt_u32(row, 6)?,
        frequency: parse_enum(&row.get::<String>(7)?)?,
        target_audience: parse_enum(&row.get::<String>(8)?)?,
        target_roles: parse_json(&row.get::<String>(9)?)?,
        start_date: parse_datetime(&row.get::<String>(10)?)?,
        end_date: parse_datetime(&row.get::<String>(11)?)?,
        status: parse_enum(&row.get::<String>(12)?)?,
        impressions: get_u64(row, 13)?,
        clicks: get_u64(row, 14)?,
        closes: get_u64(row, 15)?,
        priority: get_u32(row, 16)?,
        created_by: row.get::<String>(17)?,
        created_at: parse_datetime(&row.get::<String>(18)?)?,
        updated_at: parse_datetime(&row.get::<String>(19)?)?,
    })
}

impl CampusService {
    /// # Errors
    ///
    /// Returns `Validation` when the ad breaks a record rule and `NotFound`
    /// for an unknown course.
    pub async fn create_homepage_ad(
        &self,
        created_by: &str,
        input: &NewHomepageAd,
    ) -> Result<HomepageAd, DatabaseError> {
        let now = Utc::now();
        let ad = HomepageAd {
            id: String::new(),
            course_id: input.course_id.clone(),
            ad_type: input.ad_type,
            special_note: input.special_note.trim().to_string(),
            cta_text: input.cta_text.trim().to_string(),
            cta_link: input.cta_link.trim().to_string(),
            timer_seconds: input.timer_seconds,
            frequency: input.frequency,
            target_audience: input.target_audience,
            target_roles: input.target_roles.clone(),
            start_date: input.start_date,
            end_date: input.end_date,
            status: input.status,
            impressions: 0,
            clicks: 0,
            closes: 0,
            priority: input.priority,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        let errors = validate_homepage_ad(&ad);
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        if let Some(ref course_id) = ad.course_id {
            self.ensure_exists(EntityType::Course, "Course", course_id).await?;
        }

        let _gate = self.gate().await;
        let ad = HomepageAd {
            id: self.db().generate_id(PREFIX_AD).await?,
            ..ad
        };
        self.write_ad(&ad, true).await?;
        self.audit(Some(created_by), EntityType::HomepageAd, &ad.id, AuditAction::Created, None)
            .await?;
        tracing::info!(ad_id = %ad.id, ad_type = %ad.ad_type, "homepage ad created");
        Ok(ad)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no ad has this id.
    pub async fn get_homepage_ad(&self, id: &str) -> Result<HomepageAd, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM homepage_ads WHERE id = ?1"), [id])
            .await?;
        match rows.next().await? {
            Some(row) => row_to_ad(&row),
            None => Err(DatabaseError::not_found("Homepage ad", id)),
        }
    }

    /// Admin listing, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn list_homepage_ads(
        &self,
        status: Option<PublishStatus>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<HomepageAd>, Pagination), DatabaseError> {
        let _gate = self.gate().await;
        let (where_clause, params): (&str, Vec<libsql::Value>) = match status {
            Some(status) => ("WHERE status = ?1", vec![status.as_str().into()]),
            None => ("", Vec::new()),
        };
        let total = first_u64(
            self.db()
                .conn()
                .query(
                    &format!("SELECT COUNT(*) FROM homepage_ads {where_clause}"),
                    libsql::params_from_iter(params.clone()),
                )
                .await?,
        )
        .await?;
        let pagination = Pagination::new(page, limit, total);
        let ads = self
            .collect_ads(
                &format!(
                    "SELECT {SELECT_COLS} FROM homepage_ads {where_clause}
                     ORDER BY priority DESC, created_at DESC LIMIT {limit} OFFSET {}",
                    pagination.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        Ok((ads, pagination))
    }

    /// Published ads inside their window that target the caller, highest
    /// priority first, then newest.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn active_homepage_ads(
        &self,
        role: Option<Role>,
    ) -> Result<Vec<HomepageAd>, DatabaseError> {
        let _gate = self.gate().await;
        let now = Utc::now();
        let ads = self
            .collect_ads(
                &format!(
                    "SELECT {SELECT_COLS} FROM homepage_ads
                     WHERE status = 'published' AND start_date <= ?1 AND end_date >= ?1
                     ORDER BY priority DESC, created_at DESC"
                ),
                [now.to_rfc3339()],
            )
            .await?;
        Ok(ads
            .into_iter()
            .filter(|ad| ad.is_active(now) && ad.should_show_to(role))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `NotFound`, or `Validation` when the result breaks a rule.
    pub async fn update_homepage_ad(
        &self,
        actor: Option<&str>,
        id: &str,
        update: &HomepageAdUpdate,
    ) -> Result<HomepageAd, DatabaseError> {
        let _gate = self.gate().await;
        let mut ad = self.get_homepage_ad(id).await?;
        if let Some(ref course_id) = update.course_id {
            ad.course_id.clone_from(course_id);
        }
        if let Some(ad_type) = update.ad_type {
            ad.ad_type = ad_type;
        }
        if let Some(ref note) = update.special_note {
            ad.special_note = note.trim().to_string();
        }
        if let Some(ref text) = update.cta_text {
            ad.cta_text = text.trim().to_string();
        }
        if let Some(ref link) = update.cta_link {
            ad.cta_link = link.trim().to_string();
        }
        if let Some(timer) = update.timer_seconds {
            ad.timer_seconds = timer;
        }
        if let Some(frequency) = update.frequency {
            ad.frequency = frequency;
        }
        if let Some(audience) = update.target_audience {
            ad.target_audience = audience;
        }
        if let Some(ref roles) = update.target_roles {
            ad.target_roles.clone_from(roles);
        }
        if let Some(start) = update.start_date {
            ad.start_date = start;
        }
        if let Some(end) = update.end_date {
            ad.end_date = end;
        }
        if let Some(status) = update.status {
            ad.status = status;
        }
        if let Some(priority) = update.priority {
            ad.priority = priority;
        }
        ad.updated_at = Utc::now();

        let errors = validate_homepage_ad(&ad);
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        if let Some(Some(ref course_id)) = update.course_id {
            self.ensure_exists(EntityType::Course, "Course", course_id).await?;
        }
        self.write_ad(&ad, false).await?;
        self.audit(
            actor,
            EntityType::HomepageAd,
            id,
            AuditAction::Updated,
            Some(serde_json::to_value(update)?),
        )
        .await?;
        Ok(ad)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no ad has this id.
    pub async fn delete_homepage_ad(
        &self,
        actor: Option<&str>,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let _gate = self.gate().await;
        self.ensure_exists(EntityType::HomepageAd, "Homepage ad", id).await?;
        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            self.db()
                .conn()
                .execute("DELETE FROM homepage_ads WHERE id = ?1", [id])
                .await?;
            self.audit(actor, EntityType::HomepageAd, id, AuditAction::Deleted, None)
                .await
        }
        .await;
        finish(tx, result).await
    }

    /// Count one impression, click, or close. Not audited.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no ad has this id.
    pub async fn track_ad_event(&self, id: &str, event: AdEvent) -> Result<(), DatabaseError> {
        let _gate = self.gate().await;
        let column = event.column();
        let changed = self
            .db()
            .conn()
            .execute(
                &format!("UPDATE homepage_ads SET {column} = {column} + 1 WHERE id = ?1"),
                [id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("Homepage ad", id));
        }
        tracing::debug!(ad_id = id, column, "ad event tracked");
        Ok(())
    }

    async fn write_ad(&self, ad: &HomepageAd, insert: bool) -> Result<(), DatabaseError> {
        let sql = if insert {
            format!(
                "INSERT INTO homepage_ads ({SELECT_COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20)"
            )
        } else {
            "UPDATE homepage_ads SET course_id = ?2, ad_type = ?3, special_note = ?4,
                 cta_text = ?5, cta_link = ?6, timer_seconds = ?7, frequency = ?8,
                 target_audience = ?9, target_roles = ?10, start_date = ?11, end_date = ?12,
                 status = ?13, priority = ?17, updated_at = ?20
             WHERE id = ?1"
                .to_string()
        };
        self.db()
            .conn()
            .execute(
                &sql,
                libsql::params![
                    ad.id.as_str(),
                    ad.course_id.as_deref(),
                    ad.ad_type.as_str(),
                    ad.special_note.as_str(),
                    ad.cta_text.as_str(),
                    ad.cta_link.as_str(),
                    ad.timer_seconds.map(i64::from),
                    ad.frequency.as_str(),
                    ad.target_audience.as_str(),
                    to_json(&ad.target_roles)?,
                    ad.start_date.to_rfc3339(),
                    ad.end_date.to_rfc3339(),
                    ad.status.as_str(),
                    to_i64(ad.impressions),
                    to_i64(ad.clicks),
                    to_i64(ad.closes),
                    i64::from(ad.priority),
                    ad.created_by.as_str(),
                    ad.created_at.to_rfc3339(),
                    ad.updated_at.to_rfc3339()
                ],
            )
            .await?;
        Ok(())
    }

    async fn collect_ads(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<HomepageAd>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut ads = Vec::new();
        while let Some(row) = rows.next().await? {
            ads.push(row_to_ad(&row)?);
        }
        Ok(ads)
    }
}
