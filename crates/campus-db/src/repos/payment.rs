//! Payment repository: checkout orders, signature verification, failures,
//! and the admin payment listing.
//!
//! An order is created in `created` state with the course's total price for
//! the chosen batch type. Verification checks the gateway signature and, in
//! one transaction, marks the order paid, takes a course seat, activates the
//! student's enrollment, and places it in the earliest batch with room.

use chrono::Utc;
use serde::Deserialize;

use campus_config::PaymentsConfig;
use campus_core::audit_detail::PaymentDetail;
use campus_core::entities::{Enrollment, EnrollmentPayment, Payment};
use campus_core::enums::{
    AuditAction, BatchType, EnrollmentStatus, EntityType, OrderStatus, PaymentState,
};
use campus_core::errors::CoreError;
use campus_core::ids::{PREFIX_ORDER, PREFIX_PAYMENT};
use campus_core::responses::{
    OrderResponse, Pagination, PaymentListResponse, VerifyPaymentResponse,
};
use campus_core::stats::PaymentStats;
use campus_core::validation::{
    OrderNotes, OrderParams, PaymentParams, SUPPORTED_CURRENCY, validate_amount,
    validate_order_params, validate_payment_params,
};

use crate::error::DatabaseError;
use crate::helpers::{
    first_u64, get_opt_string, get_u64, parse_datetime, parse_enum, parse_optional_datetime,
    to_i64,
};
use crate::repos::enrollment::{EnrollmentDraft, SELECT_COLS as ENROLLMENT_COLS};
use crate::service::{CampusService, finish};
use crate::signature::verify_payment_signature;

const SELECT_COLS: &str = "id, user_id, course_id, batch_type, amount, currency, status, \
     order_id, gateway_payment_id, signature, receipt, failure_reason, paid_at, failed_at, \
     created_at, updated_at";

/// A student's request to pay for a course.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub course_id: String,
    #[serde(default)]
    pub batch_type: BatchType,
}

/// The checkout widget's failure callback.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentFailure {
    pub razorpay_order_id: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentFilter {
    pub status: Option<OrderStatus>,
    pub user_id: Option<String>,
    pub course_id: Option<String>,
}

fn row_to_payment(row: &libsql::Row) -> Result<Payment, DatabaseError> {
    Ok(Payment {
        id: row.get::<String>(0)?,
        user_id: row.get::<String>(1)?,
        course_id: row.get::<String>(2)?,
        batch_type: parse_enum(&row.get::<String>(3)?)?,
        amount: get_u64(row, 4)?,
        currency: row.get::<String>(5)?,
        status: parse_enum(&row.get::<String>(6)?)?,
        order_id: row.get::<String>(7)?,
        gateway_payment_id: get_opt_string(row, 8)?,
        signature: get_opt_string(row, 9)?,
        receipt: row.get::<String>(10)?,
        failure_reason: get_opt_string(row, 11)?,
        paid_at: parse_optional_datetime(get_opt_string(row, 12)?.as_deref())?,
        failed_at: parse_optional_datetime(get_opt_string(row, 13)?.as_deref())?,
        created_at: parse_datetime(&row.get::<String>(14)?)?,
        updated_at: parse_datetime(&row.get::<String>(15)?)?,
    })
}

fn require_keys(config: &PaymentsConfig) -> Result<&PaymentsConfig, DatabaseError> {
    config
        .require()
        .map_err(|e| DatabaseError::Other(anyhow::anyhow!(e)))
}

impl CampusService {
    /// Open a checkout order for the caller.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` for a course that is not open, `Conflict` when
    /// the student is already enrolled, `CapacityExceeded` for a full course,
    /// and `Validation` when the price is outside the gateway's range.
    pub async fn create_order(
        &self,
        user_id: &str,
        input: &NewOrder,
        config: &PaymentsConfig,
    ) -> Result<OrderResponse, DatabaseError> {
        let config = require_keys(config)?;
        let _gate = self.gate().await;
        let course = self.get_course(&input.course_id).await?;
        if !course.status.is_open_for_enrollment() {
            return Err(DatabaseError::InvalidState(
                "Course is not open for enrollment".into(),
            ));
        }
        if !course.batch_types.get(input.batch_type).enabled {
            return Err(DatabaseError::Validation(vec![format!(
                "{} batches are not offered for this course",
                input.batch_type.title()
            )]));
        }
        if course.is_full() {
            return Err(DatabaseError::capacity("Course is full"));
        }
        if self.holding_enrollment(user_id, &course.id).await?.is_some() {
            return Err(DatabaseError::Conflict(
                "Student is already enrolled in this course".into(),
            ));
        }

        let amount = course.total_price(input.batch_type);
        let paise = amount.saturating_mul(100);
        if !validate_amount(paise) {
            return Err(DatabaseError::Validation(vec!["Invalid amount".into()]));
        }

        let id = self.db().generate_id(PREFIX_PAYMENT).await?;
        let order_id = self.db().generate_id(PREFIX_ORDER).await?;
        let receipt = format!("rcpt_{id}");
        #[allow(clippy::cast_precision_loss)]
        let errors = validate_order_params(&OrderParams {
            amount: Some(paise as f64),
            currency: Some(SUPPORTED_CURRENCY.to_string()),
            receipt: Some(receipt.clone()),
            notes: Some(OrderNotes {
                course_id: Some(course.id.clone()),
                user_id: Some(user_id.to_string()),
            }),
        });
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }

        let now = Utc::now();
        let payment = Payment {
            id,
            user_id: user_id.to_string(),
            course_id: course.id.clone(),
            batch_type: input.batch_type,
            amount,
            currency: SUPPORTED_CURRENCY.to_string(),
            status: OrderStatus::Created,
            order_id,
            gateway_payment_id: None,
            signature: None,
            receipt,
            failure_reason: None,
            paid_at: None,
            failed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.db()
            .conn()
            .execute(
                &format!(
                    "INSERT INTO payments ({SELECT_COLS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, NULL, NULL, ?9, NULL, NULL, NULL,
                         ?10, ?11)"
                ),
                libsql::params![
                    payment.id.as_str(),
                    payment.user_id.as_str(),
                    payment.course_id.as_str(),
                    payment.batch_type.as_str(),
                    to_i64(payment.amount),
                    payment.currency.as_str(),
                    payment.status.as_str(),
                    payment.order_id.as_str(),
                    payment.receipt.as_str(),
                    now.to_rfc3339(),
                    now.to_rfc3339()
                ],
            )
            .await?;
        self.audit(
            Some(user_id),
            EntityType::Payment,
            &payment.id,
            AuditAction::Created,
            None,
        )
        .await?;
        tracing::info!(
            order_id = %payment.order_id,
            course_id = %payment.course_id,
            amount,
            "order created"
        );

        Ok(OrderResponse {
            order_id: payment.order_id.clone(),
            amount: paise,
            currency: payment.currency.clone(),
            receipt: payment.receipt.clone(),
            key_id: config.key_id.clone(),
            payment,
        })
    }

    /// Check a checkout signature and turn the order into an active
    /// enrollment.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing fields, `InvalidState` for a bad
    /// signature or an order that was already settled, `Forbidden` for
    /// another user's order, and `CapacityExceeded` when the course filled
    /// up after the order was created.
    pub async fn verify_payment(
        &self,
        user_id: &str,
        params: &PaymentParams,
        config: &PaymentsConfig,
    ) -> Result<VerifyPaymentResponse, DatabaseError> {
        let errors = validate_payment_params(params);
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        let config = require_keys(config)?;
        let order_id = params.razorpay_order_id.as_deref().unwrap_or_default().trim();
        let gateway_payment_id = params.razorpay_payment_id.as_deref().unwrap_or_default().trim();
        let signature = params.razorpay_signature.as_deref().unwrap_or_default().trim();

        let _gate = self.gate().await;
        let payment = self.get_payment_by_order(order_id).await?;
        if payment.user_id != user_id {
            return Err(CoreError::Forbidden("This order belongs to another user".into()).into());
        }
        if !verify_payment_signature(&config.key_secret, order_id, gateway_payment_id, signature) {
            tracing::warn!(order_id, "payment signature mismatch");
            return Err(DatabaseError::InvalidState("Invalid payment signature".into()));
        }
        if payment.status != OrderStatus::Created {
            return Err(DatabaseError::InvalidState(format!(
                "Payment is already {}",
                payment.status
            )));
        }
        let course = self.get_course(&payment.course_id).await?;
        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            let now = Utc::now();
            let changed = self
                .db()
                .conn()
                .execute(
                    "UPDATE payments SET status = 'paid', gateway_payment_id = ?2,
                         signature = ?3, paid_at = ?4, updated_at = ?4
                     WHERE order_id = ?1 AND status = 'created'",
                    libsql::params![order_id, gateway_payment_id, signature, now.to_rfc3339()],
                )
                .await?;
            if changed == 0 {
                return Err(DatabaseError::InvalidState(
                    "Payment was already processed".into(),
                ));
            }

            let enrollment = match self.holding_enrollment(user_id, &course.id).await? {
                Some(existing) => {
                    self.db()
                        .conn()
                        .execute(
                            "UPDATE enrollments SET payment_id = ?2, payment_amount = ?3
                             WHERE id = ?1",
                            libsql::params![
                                existing.id.as_str(),
                                payment.id.as_str(),
                                to_i64(payment.amount)
                            ],
                        )
                        .await?;
                    self.mark_enrollment_paid(&existing.id, now).await?;
                    let mut existing = Enrollment {
                        payment_id: Some(payment.id.clone()),
                        payment: EnrollmentPayment {
                            amount: payment.amount,
                            status: PaymentState::Paid,
                            paid_at: Some(now),
                        },
                        ..existing
                    };
                    if existing.status.can_transition_to(EnrollmentStatus::Active) {
                        existing = self
                            .write_status(
                                Some(user_id),
                                existing,
                                EnrollmentStatus::Active,
                                Some("payment verified".into()),
                            )
                            .await?;
                    }
                    existing
                }
                None => {
                    self.open_enrollment(
                        Some(user_id),
                        EnrollmentDraft {
                            student_id: user_id,
                            course: &course,
                            batch_type: payment.batch_type,
                            status: EnrollmentStatus::Active,
                            payment_id: Some(payment.id.clone()),
                            payment: EnrollmentPayment {
                                amount: payment.amount,
                                status: PaymentState::Paid,
                                paid_at: Some(now),
                            },
                            notes: None,
                        },
                    )
                    .await?
                }
            };

            let open_batch = if enrollment.batch_id.is_none() {
                self.open_batch_for(&enrollment).await?
            } else {
                None
            };
            let enrollment = match open_batch {
                Some(batch_id) => {
                    self.place_in_batch(Some(user_id), enrollment, &batch_id)
                        .await?
                }
                None => enrollment,
            };

            let detail = PaymentDetail {
                order_id: order_id.to_string(),
                amount: payment.amount,
                enrollment_id: Some(enrollment.id.clone()),
                reason: None,
            };
            self.audit(
                Some(user_id),
                EntityType::Payment,
                &payment.id,
                AuditAction::Paid,
                Some(serde_json::to_value(&detail)?),
            )
            .await?;
            Ok(enrollment)
        }
        .await;
        let enrollment = finish(tx, result).await?;
        tracing::info!(
            order_id,
            enrollment_id = %enrollment.id,
            batch_id = enrollment.batch_id.as_deref().unwrap_or("-"),
            "payment verified"
        );

        Ok(VerifyPaymentResponse {
            success: true,
            message: "Payment verified and enrollment activated".into(),
            payment: self.get_payment_by_order(order_id).await?,
            enrollment,
        })
    }

    /// Record that checkout failed for an order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown order, `Forbidden` for another
    /// user's order, and `InvalidState` for an order that was already settled.
    pub async fn record_payment_failure(
        &self,
        user_id: &str,
        failure: &PaymentFailure,
    ) -> Result<Payment, DatabaseError> {
        let _gate = self.gate().await;
        let order_id = failure.razorpay_order_id.trim();
        let payment = self.get_payment_by_order(order_id).await?;
        if payment.user_id != user_id {
            return Err(CoreError::Forbidden("This order belongs to another user".into()).into());
        }
        if !payment.status.can_transition_to(OrderStatus::Failed) {
            return Err(DatabaseError::InvalidState(format!(
                "Payment is already {}",
                payment.status
            )));
        }

        let reason = failure
            .reason
            .clone()
            .unwrap_or_else(|| "Payment failed".to_string());
        let now = Utc::now();
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE payments SET status = 'failed', failure_reason = ?2, failed_at = ?3,
                     updated_at = ?3
                 WHERE order_id = ?1 AND status = 'created'",
                libsql::params![order_id, reason.as_str(), now.to_rfc3339()],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::InvalidState(
                "Payment was already processed".into(),
            ));
        }
        let detail = PaymentDetail {
            order_id: order_id.to_string(),
            amount: payment.amount,
            enrollment_id: None,
            reason: Some(reason.clone()),
        };
        self.audit(
            Some(user_id),
            EntityType::Payment,
            &payment.id,
            AuditAction::Failed,
            Some(serde_json::to_value(&detail)?),
        )
        .await?;
        tracing::info!(order_id, %reason, "payment failed");
        Ok(Payment {
            status: OrderStatus::Failed,
            failure_reason: Some(reason),
            failed_at: Some(now),
            updated_at: now,
            ..payment
        })
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no payment carries this gateway order id.
    pub async fn get_payment_by_order(&self, order_id: &str) -> Result<Payment, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM payments WHERE order_id = ?1"),
                [order_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => row_to_payment(&row),
            None => Err(DatabaseError::not_found("Payment", order_id)),
        }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn payment_history(&self, user_id: &str) -> Result<Vec<Payment>, DatabaseError> {
        let _gate = self.gate().await;
        self.collect_payments(
            &format!(
                "SELECT {SELECT_COLS} FROM payments WHERE user_id = ?1
                 ORDER BY created_at DESC, id"
            ),
            [user_id],
        )
        .await
    }

    /// Paginated payments with totals by status over the whole filtered set.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn list_payments(
        &self,
        filter: &PaymentFilter,
        page: u32,
        limit: u32,
    ) -> Result<PaymentListResponse, DatabaseError> {
        let _gate = self.gate().await;
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if let Some(status) = filter.status {
            params.push(status.as_str().into());
            conditions.push(format!("status = ?{}", params.len()));
        }
        if let Some(ref user_id) = filter.user_id {
            params.push(user_id.clone().into());
            conditions.push(format!("user_id = ?{}", params.len()));
        }
        if let Some(ref course_id) = filter.course_id {
            params.push(course_id.clone().into());
            conditions.push(format!("course_id = ?{}", params.len()));
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
                    &format!("SELECT COUNT(*) FROM payments {where_clause}"),
                    libsql::params_from_iter(params.clone()),
                )
                .await?,
        )
        .await?;
        let pagination = Pagination::new(page, limit, total);

        let mut stats = PaymentStats::default();
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT status, COUNT(*), COALESCE(SUM(amount), 0) FROM payments
                     {where_clause} GROUP BY status"
                ),
                libsql::params_from_iter(params.clone()),
            )
            .await?;
        while let Some(row) = rows.next().await? {
            let status: OrderStatus = parse_enum(&row.get::<String>(0)?)?;
            let count = get_u64(&row, 1)?;
            let amount = get_u64(&row, 2)?;
            stats.total_payments += count;
            stats.total_amount += amount;
            let (bucket_count, bucket_amount) = match status {
                OrderStatus::Paid => (&mut stats.completed_count, &mut stats.completed_amount),
                OrderStatus::Created => (&mut stats.pending_count, &mut stats.pending_amount),
                OrderStatus::Failed => (&mut stats.failed_count, &mut stats.failed_amount),
            };
            *bucket_count += count;
            *bucket_amount += amount;
        }

        let payments = self
            .collect_payments(
                &format!(
                    "SELECT {SELECT_COLS} FROM payments {where_clause}
                     ORDER BY created_at DESC, id LIMIT {limit} OFFSET {}",
                    pagination.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(PaymentListResponse {
            payments,
            pagination,
            stats,
        })
    }

    /// The student's seat-holding enrollment in a course, if any.
    async fn holding_enrollment(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Option<Enrollment>, DatabaseError> {
        let mut found = self
            .collect_enrollments(
                &format!(
                    "SELECT {ENROLLMENT_COLS} FROM enrollments
                     WHERE student_id = ?1 AND course_id = ?2
                       AND status IN ('pending', 'enrolled', 'active')
                     LIMIT 1"
                ),
                libsql::params![student_id, course_id],
            )
            .await?;
        Ok(found.pop())
    }

    /// Earliest upcoming or active batch of the enrollment's course and type
    /// that still has a free seat.
    async fn open_batch_for(
        &self,
        enrollment: &Enrollment,
    ) -> Result<Option<String>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                "SELECT id FROM batches
                 WHERE course_id = ?1 AND batch_type = ?2
                   AND status IN ('upcoming', 'active')
                   AND current_students < max_students
                 ORDER BY start_date IS NULL, start_date, batch_number
                 LIMIT 1",
                libsql::params![
                    enrollment.course_id.as_str(),
                    enrollment.batch_type.as_str()
                ],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(row.get::<String>(0)?)),
            None => Ok(None),
        }
    }

    async fn collect_payments(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<Payment>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut payments = Vec::new();
        while let Some(row) = rows.next().await? {
            payments.push(row_to_payment(&row)?);
        }
        Ok(payments)
    }
}
