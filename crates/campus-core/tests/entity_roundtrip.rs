//! Serde roundtrip and JsonSchema validation tests for entity and response types.

use campus_core::audit_detail::{MergeDetail, PlanDetail, StatusChangedDetail, TransferDetail};
use campus_core::entities::*;
use campus_core::enums::*;
use campus_core::responses::*;
use campus_core::stats::*;
use chrono::{NaiveDate, Utc};
use schemars::schema_for;

/// Validate a JSON value against a schemars-generated schema.
fn validate_against_schema(
    schema: &serde_json::Value,
    instance: &serde_json::Value,
) -> Vec<String> {
    let validator = jsonschema::validator_for(schema).expect("schema should be valid");
    validator
        .iter_errors(instance)
        .map(|e| format!("{e}"))
        .collect()
}

macro_rules! roundtrip_and_validate {
    ($name:ident, $ty:ty, $instance:expr) => {
        #[test]
        fn $name() {
            let val: $ty = $instance;

            let json_str = serde_json::to_string_pretty(&val).unwrap();
            let recovered: $ty = serde_json::from_str(&json_str).unwrap();
            assert_eq!(
                recovered,
                val,
                "serde roundtrip failed for {}",
                stringify!($ty)
            );

            let schema = serde_json::to_value(schema_for!($ty)).unwrap();
            let instance = serde_json::to_value(&val).unwrap();
            let errors = validate_against_schema(&schema, &instance);
            assert!(
                errors.is_empty(),
                "Schema validation failed for {}: {:?}",
                stringify!($ty),
                errors
            );
        }
    };
}

fn course() -> Course {
    Course {
        id: "crs-a3f8b2c1".into(),
        name: None,
        language: Language::French,
        level: Level::B1,
        month: 9,
        year: 2026,
        total_capacity: 40,
        course_duration: 2,
        batch_size_limit: 10,
        batch_types: BatchTypes {
            regular: BatchTypeConfig {
                enabled: true,
                student_count: 12,
            },
            revision: BatchTypeConfig {
                enabled: false,
                student_count: 0,
            },
        },
        pricing: Pricing {
            regular: PriceBreakdown {
                base_price: 9_000,
                offline_material_cost: 500,
                total_price: 9_500,
            },
            revision: PriceBreakdown::default(),
        },
        price: 9_500,
        offline_materials: OfflineMaterials {
            enabled: true,
            materials: vec![OfflineMaterial {
                name: "Workbook".into(),
                quantity: 1,
                unit_cost: 500,
                total_cost: 500,
            }],
            total_cost: 500,
        },
        description: "Intermediate French conversation".into(),
        instructor_id: Some("usr-0a1b2c3d".into()),
        trainer_ids: vec!["usr-0a1b2c3d".into()],
        status: CourseStatus::Published,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn batch() -> Batch {
    Batch {
        id: "bat-c4e2d1f0".into(),
        name: "Regular Batch 1".into(),
        course_id: "crs-a3f8b2c1".into(),
        trainer_id: Some("usr-0a1b2c3d".into()),
        batch_number: 1,
        batch_type: BatchType::Regular,
        start_date: Some(Utc::now()),
        end_date: None,
        max_students: 10,
        current_students: 10,
        duration: 2,
        status: BatchStatus::Upcoming,
        is_leftover: false,
        merged_from: vec!["bat-99999999".into()],
        meeting_schedule: MeetingSchedule {
            days: vec![Weekday::Tuesday, Weekday::Friday],
            start_time: Some("18:00".into()),
            end_time: Some("19:30".into()),
            timezone: "Asia/Kolkata".into(),
        },
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn payment() -> Payment {
    Payment {
        id: "pay-e1c4b2d3".into(),
        user_id: "usr-5e6f7a8b".into(),
        course_id: "crs-a3f8b2c1".into(),
        batch_type: BatchType::Regular,
        amount: 9_500,
        currency: "INR".into(),
        status: OrderStatus::Paid,
        order_id: "order-7d8e9f0a".into(),
        gateway_payment_id: Some("pay_live_123".into()),
        signature: None,
        receipt: "receipt_usr-5e6f7a8b_1".into(),
        failure_reason: None,
        paid_at: Some(Utc::now()),
        failed_at: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

roundtrip_and_validate!(
    user_roundtrip,
    User,
    User {
        id: "usr-5e6f7a8b".into(),
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        role: Role::Student,
        status: UserStatus::Active,
        phone: Some("+91 98450 00000".into()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(course_roundtrip, Course, course());

roundtrip_and_validate!(batch_roundtrip, Batch, batch());

roundtrip_and_validate!(
    enrollment_roundtrip,
    Enrollment,
    Enrollment {
        id: "enr-b7a3f9e2".into(),
        student_id: "usr-5e6f7a8b".into(),
        course_id: "crs-a3f8b2c1".into(),
        batch_id: Some("bat-c4e2d1f0".into()),
        batch_type: BatchType::Regular,
        payment_id: Some("order-7d8e9f0a".into()),
        status: EnrollmentStatus::Active,
        payment: EnrollmentPayment {
            amount: 9_500,
            status: PaymentState::Paid,
            paid_at: Some(Utc::now()),
        },
        enrolled_at: Utc::now(),
        started_at: Some(Utc::now()),
        completed_at: None,
        progress: EnrollmentProgress {
            attendance: 80,
            assignments: TaskTally {
                completed: 2,
                total: 5,
            },
            tests: TaskTally::default(),
            overall_grade: Some(7.5),
        },
        notes: None,
        transfer_history: vec![TransferRecord {
            from_batch: None,
            to_batch: "bat-c4e2d1f0".into(),
            reason: Some("Schedule change".into()),
            transferred_at: Utc::now(),
        }],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    class_session_roundtrip,
    ClassSession,
    ClassSession {
        id: "cls-d2f5a8c1".into(),
        title: "Subjunctive mood".into(),
        description: None,
        batch_id: "bat-c4e2d1f0".into(),
        trainer_id: "usr-0a1b2c3d".into(),
        scheduled_date: Utc::now(),
        start_time: "18:00".into(),
        end_time: "19:30".into(),
        duration: 90,
        session_type: SessionType::Lecture,
        location: None,
        is_online: true,
        meeting_url: Some("https://meet.example.com/abc".into()),
        status: SessionStatus::Scheduled,
        trainer_notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

#[test]
fn payment_signature_is_never_serialized() {
    let mut p = payment();
    p.signature = Some("deadbeef".into());
    let json = serde_json::to_value(&p).unwrap();
    assert!(json.get("signature").is_none());
    assert_eq!(json["orderId"], "order-7d8e9f0a");
}

roundtrip_and_validate!(payment_roundtrip, Payment, payment());

roundtrip_and_validate!(
    blog_roundtrip,
    BlogPost,
    BlogPost {
        id: "blg-f3b7c1e4".into(),
        title: "Ten habits of fluent speakers".into(),
        slug: "ten-habits-of-fluent-speakers".into(),
        excerpt: "Small daily routines add up.".into(),
        content: "Speak every day.".into(),
        blog_type: BlogType::Text,
        category: BlogCategory::LearningTips,
        difficulty: Difficulty::Beginner,
        language: Language::English,
        video_url: None,
        thumbnail: None,
        featured: true,
        published: true,
        published_at: Some(Utc::now()),
        author_id: "usr-admin001".into(),
        views: 12,
        likes: 3,
        tags: vec!["habits".into(), "speaking".into()],
        read_time: "1 min read".into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    homepage_ad_roundtrip,
    HomepageAd,
    HomepageAd {
        id: "adv-1a2b3c4d".into(),
        course_id: Some("crs-a3f8b2c1".into()),
        ad_type: AdType::FloatingButton,
        special_note: "Batch starts Monday".into(),
        cta_text: "Join now".into(),
        cta_link: "/courses/crs-a3f8b2c1".into(),
        timer_seconds: None,
        frequency: AdFrequency::PerDay,
        target_audience: TargetAudience::RoleBased,
        target_roles: vec![Role::Student],
        start_date: Utc::now(),
        end_date: Utc::now(),
        status: PublishStatus::Published,
        impressions: 100,
        clicks: 7,
        closes: 20,
        priority: 8,
        created_by: "usr-admin001".into(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    material_roundtrip,
    Material,
    Material {
        id: "mat-2b3c4d5e".into(),
        title: "Verb tables".into(),
        description: None,
        file_url: "https://files.example.com/verbs.pdf".into(),
        material_type: MaterialType::Pdf,
        course_id: "crs-a3f8b2c1".into(),
        batch_id: None,
        uploaded_by: "usr-0a1b2c3d".into(),
        status: MaterialStatus::Published,
        downloads: 4,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    attendance_roundtrip,
    Attendance,
    Attendance {
        id: "att-3c4d5e6f".into(),
        batch_id: "bat-c4e2d1f0".into(),
        student_id: "usr-5e6f7a8b".into(),
        date: NaiveDate::from_ymd_opt(2026, 9, 14).unwrap(),
        status: AttendanceStatus::Late,
        marked_by: Some("usr-0a1b2c3d".into()),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    audit_entry_roundtrip,
    AuditEntry,
    AuditEntry {
        id: "aud-4d5e6f7a".into(),
        actor_id: Some("usr-admin001".into()),
        entity_type: EntityType::Batch,
        entity_id: "bat-c4e2d1f0".into(),
        action: AuditAction::Merged,
        detail: Some(
            serde_json::to_value(MergeDetail {
                source_batch: "bat-99999999".into(),
                moved_students: 3,
            })
            .unwrap()
        ),
        created_at: Utc::now(),
    }
);

roundtrip_and_validate!(
    status_changed_detail_roundtrip,
    StatusChangedDetail,
    StatusChangedDetail {
        from: "upcoming".into(),
        to: "active".into(),
        reason: None,
    }
);

roundtrip_and_validate!(
    transfer_detail_roundtrip,
    TransferDetail,
    TransferDetail {
        from_batch: Some("bat-1".into()),
        to_batch: "bat-2".into(),
        reason: Some("Timing".into()),
    }
);

roundtrip_and_validate!(
    plan_detail_roundtrip,
    PlanDetail,
    PlanDetail {
        batches_created: 3,
        students_assigned: 23,
        recalculated: false,
    }
);

roundtrip_and_validate!(
    course_with_summary_roundtrip,
    CourseWithSummary,
    CourseWithSummary::from(course())
);

roundtrip_and_validate!(
    distribution_summary_roundtrip,
    BatchDistributionSummary,
    BatchDistributionSummary {
        course_id: "crs-a3f8b2c1".into(),
        total_students: 12,
        total_batches: 1,
        batch_types: TypeDistributions {
            regular: TypeDistribution {
                batches: vec![batch()],
                students: 12,
            },
            revision: TypeDistribution {
                batches: Vec::new(),
                students: 0,
            },
        },
        leftover_batches: Vec::new(),
        capacity_utilization: CapacityUtilization::new(40, 12),
    }
);

roundtrip_and_validate!(
    payment_list_roundtrip,
    PaymentListResponse,
    PaymentListResponse {
        payments: Vec::new(),
        pagination: Pagination::new(1, 10, 0),
        stats: PaymentStats::default(),
    }
);

#[test]
fn course_wire_format_is_camel_case() {
    let json = serde_json::to_value(CourseWithSummary::from(course())).unwrap();
    assert_eq!(json["displayName"], "French B1 Sep 2026");
    assert_eq!(json["batchTypes"]["regular"]["studentCount"], 12);
    assert_eq!(json["batchSummary"]["regular"]["leftoverStudents"], 2);
    assert_eq!(json["totalCapacity"], 40);
    assert_eq!(json["language"], "French");
}
