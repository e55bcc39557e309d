//! User repository: accounts, roles, and password hashes.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;

use campus_core::audit_detail::StatusChangedDetail;
use campus_core::entities::User;
use campus_core::enums::{AuditAction, EntityType, Role, UserStatus};
use campus_core::errors::CoreError;
use campus_core::ids::PREFIX_USER;
use campus_core::permissions::{can_delete_user, can_update_role};
use campus_core::responses::Pagination;
use campus_core::validation::validate_user_data;

use crate::error::DatabaseError;
use crate::helpers::{first_u64, get_opt_string, is_unique_violation, parse_datetime, parse_enum};
use crate::service::{CampusService, finish};
use crate::updates::user::NewUser;

const SELECT_COLS: &str = "id, name, email, role, status, phone, created_at, updated_at";

fn row_to_user(row: &libsql::Row) -> Result<User, DatabaseError> {
    Ok(User {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        email: row.get::<String>(2)?,
        role: parse_enum(&row.get::<String>(3)?)?,
        status: parse_enum(&row.get::<String>(4)?)?,
        phone: get_opt_string(row, 5)?,
        created_at: parse_datetime(&row.get::<String>(6)?)?,
        updated_at: parse_datetime(&row.get::<String>(7)?)?,
    })
}

/// Argon2id hash with a fresh random salt, in PHC string format.
fn hash_password(password: &str) -> Result<String, DatabaseError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::fill(&mut salt_bytes)
        .map_err(|e| DatabaseError::Other(anyhow::anyhow!("salt generation failed: {e}")))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| DatabaseError::Other(anyhow::anyhow!("salt encoding failed: {e}")))?;
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DatabaseError::Other(anyhow::anyhow!("password hashing failed: {e}")))
}

fn password_matches(password: &str, stored: &str) -> bool {
    PasswordHash::new(stored).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

impl CampusService {
    /// Create an account. The role defaults to student.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for bad input and
    /// `DatabaseError::Conflict` when the email is taken.
    pub async fn create_user(
        &self,
        actor: Option<&str>,
        input: &NewUser,
    ) -> Result<User, DatabaseError> {
        let errors = validate_user_data(&input.form());
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        let role: Role = input
            .role
            .as_deref()
            .map_or(Ok(Role::default()), str::parse)
            .map_err(|e| DatabaseError::Validation(vec![e]))?;
        let email = input.email.trim().to_lowercase();
        let password_hash = hash_password(&input.password)?;

        let _gate = self.gate().await;
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_USER).await?;
        let user = User {
            id: id.clone(),
            name: input.name.trim().to_string(),
            email,
            role,
            status: input.status.unwrap_or(UserStatus::Active),
            phone: input.phone.clone(),
            created_at: now,
            updated_at: now,
        };

        let inserted = self
            .db()
            .conn()
            .execute(
                "INSERT INTO users (id, name, email, password_hash, role, status, phone, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    user.id.as_str(),
                    user.name.as_str(),
                    user.email.as_str(),
                    password_hash,
                    user.role.as_str(),
                    user.status.as_str(),
                    user.phone.as_deref(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await;
        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(DatabaseError::Conflict(
                    "User with this email already exists".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        }

        self.audit(actor, EntityType::User, &id, AuditAction::Created, None)
            .await?;
        tracing::info!(user_id = %id, role = %user.role, "user created");
        Ok(user)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no user has this id.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM users WHERE id = ?1"), [id])
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::not_found("User", id))?;
        row_to_user(&row)
    }

    /// Look up by email, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM users WHERE email = ?1"),
                [email.trim().to_lowercase()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row_to_user(&row)?)),
            None => Ok(None),
        }
    }

    /// Check a password against the stored hash. Returns the user on a match.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS}, password_hash FROM users WHERE email = ?1"),
                [email.trim().to_lowercase()],
            )
            .await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let stored = row.get::<String>(8)?;
        if password_matches(password, &stored) {
            Ok(Some(row_to_user(&row)?))
        } else {
            Ok(None)
        }
    }

    /// Paged user listing, optionally narrowed to one role, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_users(
        &self,
        role: Option<Role>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<User>, Pagination), DatabaseError> {
        let _gate = self.gate().await;
        let (where_clause, params): (&str, Vec<libsql::Value>) = match role {
            Some(r) => ("WHERE role = ?1", vec![r.as_str().into()]),
            None => ("", Vec::new()),
        };
        let total = first_u64(
            self.db()
                .conn()
                .query(
                    &format!("SELECT COUNT(*) FROM users {where_clause}"),
                    libsql::params_from_iter(params.clone()),
                )
                .await?,
        )
        .await?;
        let pagination = Pagination::new(page, limit, total);

        let sql = format!(
            "SELECT {SELECT_COLS} FROM users {where_clause}
             ORDER BY created_at DESC, rowid DESC LIMIT {limit} OFFSET {}",
            pagination.offset()
        );
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(&row)?);
        }
        Ok((users, pagination))
    }

    /// All trainers, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_trainers(&self) -> Result<Vec<User>, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM users WHERE role = 'trainer' ORDER BY name"),
                (),
            )
            .await?;
        let mut users = Vec::new();
        while let Some(row) = rows.next().await? {
            users.push(row_to_user(&row)?);
        }
        Ok(users)
    }

    /// Change a user's role. `current_role` is the caller's role.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` when `can_update_role` refuses, or
    /// `NotFound` for an unknown user.
    pub async fn update_user_role(
        &self,
        actor: &str,
        current_role: Role,
        user_id: &str,
        new_role: &str,
    ) -> Result<User, DatabaseError> {
        let _gate = self.gate().await;
        let target = self.get_user(user_id).await?;
        if !can_update_role(current_role.as_str(), target.role.as_str(), new_role) {
            return Err(CoreError::Forbidden("Cannot change this user's role".into()).into());
        }
        let role: Role = new_role
            .parse()
            .map_err(|e: String| DatabaseError::Validation(vec![e]))?;
        let now = Utc::now();
        self.db()
            .conn()
            .execute(
                "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3",
                libsql::params![role.as_str(), now.to_rfc3339(), user_id],
            )
            .await?;

        let detail = StatusChangedDetail {
            from: target.role.as_str().to_string(),
            to: role.as_str().to_string(),
            reason: None,
        };
        self.audit(
            Some(actor),
            EntityType::User,
            user_id,
            AuditAction::Updated,
            Some(serde_json::to_value(&detail)?),
        )
        .await?;
        tracing::info!(user_id, from = %target.role, to = %role, "user role changed");
        Ok(User {
            role,
            updated_at: now,
            ..target
        })
    }

    /// Delete a user. Seats held by the user's enrollments are released first.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Forbidden` when `can_delete_user` refuses, or
    /// `NotFound` for an unknown user.
    pub async fn delete_user(
        &self,
        actor: &str,
        current_role: Role,
        user_id: &str,
    ) -> Result<(), DatabaseError> {
        let _gate = self.gate().await;
        let target = self.get_user(user_id).await?;
        if !can_delete_user(current_role.as_str(), target.role.as_str(), actor, user_id) {
            return Err(CoreError::Forbidden("Cannot delete this user".into()).into());
        }

        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            for enrollment in self.enrollments_holding_seats_of(user_id).await? {
                self.release_seats(&enrollment).await?;
            }
            self.db()
                .conn()
                .execute("DELETE FROM users WHERE id = ?1", [user_id])
                .await?;
            self.audit(Some(actor), EntityType::User, user_id, AuditAction::Deleted, None)
                .await
        }
        .await;
        finish(tx, result).await?;
        tracing::info!(user_id, "user deleted");
        Ok(())
    }
}
