//! Seat accounting under concurrency, and the checkout flow end to end.
//!
//! Callers share one `CampusService` through an `Arc`, the way the HTTP
//! server does. Seats are the one invariant that must hold no matter how
//! requests interleave: `k` free seats admit exactly `k` students.

use std::sync::Arc;

use chrono::{Duration, Utc};

use campus_config::PaymentsConfig;
use campus_core::entities::{
    BatchTypeConfig, BatchTypes, MeetingSchedule, OfflineMaterials, PriceBreakdown, Pricing,
};
use campus_core::enums::{
    BatchType, CourseStatus, EnrollmentStatus, Language, Level, OrderStatus,
};
use campus_core::errors::CoreError;
use campus_core::validation::PaymentParams;
use campus_db::error::DatabaseError;
use campus_db::repos::payment::{NewOrder, PaymentFailure};
use campus_db::service::CampusService;
use campus_db::signature::payment_signature;
use campus_db::updates::batch::NewBatch;
use campus_db::updates::course::NewCourse;
use campus_db::updates::enrollment::NewEnrollment;

async fn test_service() -> Arc<CampusService> {
    Arc::new(CampusService::new_local(":memory:").await.unwrap())
}

async fn insert_user(svc: &CampusService, id: &str, role: &str) {
    let now = Utc::now().to_rfc3339();
    svc.db()
        .conn()
        .execute(
            "INSERT INTO users (id, name, email, password_hash, role, status, created_at, updated_at)
             VALUES (?1, ?1, ?1 || '@example.com', 'unusable', ?2, 'active', ?3, ?3)",
            libsql::params![id, role, now],
        )
        .await
        .unwrap();
}

async fn open_course(svc: &CampusService, capacity: u32, price: u64) -> String {
    let course = svc
        .create_course(
            None,
            &NewCourse {
                name: None,
                language: Language::German,
                level: Level::B1,
                month: 6,
                year: 2026,
                total_capacity: capacity,
                course_duration: 2,
                batch_size_limit: 10,
                batch_types: BatchTypes {
                    regular: BatchTypeConfig {
                        enabled: true,
                        student_count: 0,
                    },
                    revision: BatchTypeConfig::default(),
                },
                pricing: Pricing {
                    regular: PriceBreakdown {
                        base_price: price,
                        offline_material_cost: 0,
                        total_price: price,
                    },
                    revision: PriceBreakdown::default(),
                },
                offline_materials: OfflineMaterials::default(),
                description: "Intermediate German".to_string(),
                instructor_id: None,
                trainer_ids: Vec::new(),
                status: Some(CourseStatus::Published),
            },
        )
        .await
        .unwrap();
    course.id
}

async fn open_batch(svc: &CampusService, course_id: &str, trainer_id: &str, max: i64) -> String {
    let start = Utc::now() + Duration::days(10);
    svc.create_batch(
        None,
        &NewBatch {
            name: None,
            course_id: Some(course_id.to_string()),
            trainer_id: Some(trainer_id.to_string()),
            batch_type: BatchType::Regular,
            start_date: Some(start),
            end_date: Some(start + Duration::days(56)),
            max_students: Some(max),
            duration: None,
            meeting_schedule: MeetingSchedule::default(),
            notes: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn enrollment(student_id: &str, course_id: &str, batch_id: Option<&str>) -> NewEnrollment {
    NewEnrollment {
        student_id: student_id.to_string(),
        course_id: course_id.to_string(),
        batch_type: BatchType::Regular,
        batch_id: batch_id.map(String::from),
        payment_id: None,
        payment_amount: 0,
        notes: None,
    }
}

fn is_capacity(err: &DatabaseError) -> bool {
    matches!(err, DatabaseError::Core(CoreError::CapacityExceeded(_)))
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn course_seats_admit_exactly_capacity() {
    let svc = test_service().await;
    let course_id = open_course(&svc, 3, 0).await;
    for i in 0..8 {
        insert_user(&svc, &format!("usr-{i:08x}"), "student").await;
    }

    let mut handles = Vec::new();
    for i in 0..8 {
        let svc = Arc::clone(&svc);
        let course_id = course_id.clone();
        handles.push(tokio::spawn(async move {
            svc.create_enrollment(None, &enrollment(&format!("usr-{i:08x}"), &course_id, None))
                .await
        }));
    }
    let mut admitted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => admitted += 1,
            Err(e) => assert!(is_capacity(&e), "unexpected error: {e}"),
        }
    }
    assert_eq!(admitted, 3);

    let course = svc.get_course(&course_id).await.unwrap();
    assert_eq!(course.batch_types.regular.student_count, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn batch_seats_admit_exactly_free_seats() {
    let svc = test_service().await;
    let course_id = open_course(&svc, 20, 0).await;
    insert_user(&svc, "usr-trainer1", "trainer").await;
    let batch_id = open_batch(&svc, &course_id, "usr-trainer1", 2).await;

    let mut enrollment_ids = Vec::new();
    for i in 0..6 {
        let student_id = format!("usr-{i:08x}");
        insert_user(&svc, &student_id, "student").await;
        let created = svc
            .create_enrollment(None, &enrollment(&student_id, &course_id, None))
            .await
            .unwrap();
        enrollment_ids.push(created.id);
    }

    let mut handles = Vec::new();
    for enrollment_id in enrollment_ids {
        let svc = Arc::clone(&svc);
        let batch_id = batch_id.clone();
        handles.push(tokio::spawn(async move {
            svc.assign_batch(None, &enrollment_id, &batch_id).await
        }));
    }
    let mut placed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(e) => {
                assert_eq!(e.status, EnrollmentStatus::Active);
                placed += 1;
            }
            Err(e) => assert!(is_capacity(&e), "unexpected error: {e}"),
        }
    }
    assert_eq!(placed, 2);
    let batch = svc.get_batch(&batch_id).await.unwrap();
    assert_eq!(batch.current_students, 2);
    assert!(batch.is_full());
}

#[tokio::test]
async fn dropping_gives_seats_back() {
    let svc = test_service().await;
    let course_id = open_course(&svc, 1, 0).await;
    insert_user(&svc, "usr-00000001", "student").await;
    insert_user(&svc, "usr-00000002", "student").await;

    let first = svc
        .create_enrollment(None, &enrollment("usr-00000001", &course_id, None))
        .await
        .unwrap();
    let err = svc
        .create_enrollment(None, &enrollment("usr-00000002", &course_id, None))
        .await
        .unwrap_err();
    assert!(is_capacity(&err));

    svc.change_enrollment_status(
        None,
        &first.id,
        &campus_db::updates::enrollment::EnrollmentStatusChange {
            status: EnrollmentStatus::Dropped,
            reason: Some("Moved abroad".into()),
        },
    )
    .await
    .unwrap();
    svc.create_enrollment(None, &enrollment("usr-00000002", &course_id, None))
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

fn keys() -> PaymentsConfig {
    PaymentsConfig {
        key_id: "rzp_test_key".into(),
        key_secret: "integration-secret".into(),
        currency: "INR".into(),
    }
}

#[tokio::test]
async fn paid_order_becomes_an_active_seated_enrollment() {
    let svc = test_service().await;
    let course_id = open_course(&svc, 10, 8_500).await;
    insert_user(&svc, "usr-trainer1", "trainer").await;
    insert_user(&svc, "usr-buyer001", "student").await;
    let batch_id = open_batch(&svc, &course_id, "usr-trainer1", 5).await;

    let order = svc
        .create_order(
            "usr-buyer001",
            &NewOrder {
                course_id: course_id.clone(),
                batch_type: BatchType::Regular,
            },
            &keys(),
        )
        .await
        .unwrap();
    assert_eq!(order.amount, 850_000);
    assert_eq!(order.payment.status, OrderStatus::Created);

    let gateway_id = "pay_Integration01";
    let params = PaymentParams {
        razorpay_order_id: Some(order.order_id.clone()),
        razorpay_payment_id: Some(gateway_id.into()),
        razorpay_signature: Some(payment_signature(
            &keys().key_secret,
            &order.order_id,
            gateway_id,
        )),
    };
    let verified = svc.verify_payment("usr-buyer001", &params, &keys()).await.unwrap();
    assert!(verified.success);
    assert_eq!(verified.payment.status, OrderStatus::Paid);
    assert_eq!(verified.enrollment.status, EnrollmentStatus::Active);
    assert_eq!(verified.enrollment.batch_id.as_deref(), Some(batch_id.as_str()));
    assert_eq!(svc.get_batch(&batch_id).await.unwrap().current_students, 1);

    let err = svc
        .verify_payment("usr-buyer001", &params, &keys())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Payment is already paid");

    let history = svc.payment_history("usr-buyer001").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(svc.admin_stats().await.unwrap().total_revenue, 8_500);
}

#[tokio::test]
async fn tampered_signature_changes_nothing() {
    let svc = test_service().await;
    let course_id = open_course(&svc, 10, 8_500).await;
    insert_user(&svc, "usr-buyer001", "student").await;

    let order = svc
        .create_order(
            "usr-buyer001",
            &NewOrder {
                course_id: course_id.clone(),
                batch_type: BatchType::Regular,
            },
            &keys(),
        )
        .await
        .unwrap();
    let params = PaymentParams {
        razorpay_order_id: Some(order.order_id.clone()),
        razorpay_payment_id: Some("pay_Integration02".into()),
        razorpay_signature: Some(payment_signature("wrong", &order.order_id, "pay_Integration02")),
    };
    let err = svc
        .verify_payment("usr-buyer001", &params, &keys())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid payment signature");
    assert!(svc.enrollments_for_student("usr-buyer001").await.unwrap().is_empty());

    let failed = svc
        .record_payment_failure(
            "usr-buyer001",
            &PaymentFailure {
                razorpay_order_id: order.order_id.clone(),
                reason: Some("Card declined".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(failed.status, OrderStatus::Failed);
    assert_eq!(svc.admin_stats().await.unwrap().total_revenue, 0);
}
