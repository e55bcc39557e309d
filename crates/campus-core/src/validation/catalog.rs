//! Record-level checks for catalog entities.
//!
//! Unlike the form validators, these run against a fully built entity right
//! before it is written, so creates and partial updates share one rule set.

use crate::entities::{BlogPost, Course, HomepageAd};
use crate::enums::{BlogType, TargetAudience};

pub const MAX_BLOG_TITLE_CHARS: usize = 200;
pub const MAX_BLOG_EXCERPT_CHARS: usize = 500;

#[must_use]
pub fn validate_course(course: &Course) -> Vec<String> {
    let mut errors = Vec::new();

    if !(1..=12).contains(&course.month) {
        errors.push("Month must be between 1 and 12".to_string());
    }
    if !(2020..=2030).contains(&course.year) {
        errors.push("Year must be between 2020 and 2030".to_string());
    }
    if !(1..=1000).contains(&course.total_capacity) {
        errors.push("Total capacity must be between 1 and 1000".to_string());
    }
    if !(1..=24).contains(&course.course_duration) {
        errors.push("Course duration must be between 1 and 24 months".to_string());
    }
    if !(5..=100).contains(&course.batch_size_limit) {
        errors.push("Batch size limit must be between 5 and 100".to_string());
    }
    if course.batch_types.enabled().is_empty() {
        errors.push("At least one batch type must be enabled".to_string());
    }
    if course.description.trim().is_empty() {
        errors.push("Description is required".to_string());
    }
    if course.total_enrolled() > course.total_capacity {
        errors.push("Total capacity cannot be below the number of enrolled students".to_string());
    }

    errors
}

#[must_use]
pub fn validate_blog_post(post: &BlogPost) -> Vec<String> {
    let mut errors = Vec::new();

    if post.title.trim().is_empty() {
        errors.push("Title is required".to_string());
    } else if post.title.chars().count() > MAX_BLOG_TITLE_CHARS {
        errors.push("Title cannot exceed 200 characters".to_string());
    }
    if post.slug.is_empty() {
        errors.push("Title must contain letters or digits".to_string());
    }
    if post.excerpt.trim().is_empty() {
        errors.push("Excerpt is required".to_string());
    } else if post.excerpt.chars().count() > MAX_BLOG_EXCERPT_CHARS {
        errors.push("Excerpt cannot exceed 500 characters".to_string());
    }
    if post.content.trim().is_empty() {
        errors.push("Content is required".to_string());
    }
    if post.blog_type != BlogType::Text
        && post.video_url.as_deref().is_none_or(|u| u.trim().is_empty())
    {
        errors.push("Video URL is required for video posts".to_string());
    }

    errors
}

#[must_use]
pub fn validate_homepage_ad(ad: &HomepageAd) -> Vec<String> {
    let mut errors = Vec::new();

    if ad.special_note.trim().is_empty() {
        errors.push("Special note is required".to_string());
    }
    if ad.cta_text.trim().is_empty() {
        errors.push("CTA text is required".to_string());
    }
    if ad.cta_link.trim().is_empty() {
        errors.push("CTA link is required".to_string());
    }
    if ad.timer_seconds.is_some_and(|t| !(1..=300).contains(&t)) {
        errors.push("Timer must be between 1 and 300 seconds".to_string());
    }
    if !(1..=10).contains(&ad.priority) {
        errors.push("Priority must be between 1 and 10".to_string());
    }
    if ad.end_date <= ad.start_date {
        errors.push("End date must be after start date".to_string());
    }
    if ad.target_audience == TargetAudience::RoleBased && ad.target_roles.is_empty() {
        errors.push("Target roles are required for role-based ads".to_string());
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BatchTypeConfig, BatchTypes, OfflineMaterials, Pricing};
    use crate::enums::{
        AdFrequency, AdType, BlogCategory, CourseStatus, Difficulty, Language, Level,
        PublishStatus, Role,
    };
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn course() -> Course {
        let now = Utc::now();
        Course {
            id: "crs-00000001".into(),
            name: None,
            language: Language::German,
            level: Level::A1,
            month: 3,
            year: 2026,
            total_capacity: 40,
            course_duration: 3,
            batch_size_limit: 10,
            batch_types: BatchTypes {
                regular: BatchTypeConfig {
                    enabled: true,
                    student_count: 0,
                },
                revision: BatchTypeConfig::default(),
            },
            pricing: Pricing::default(),
            price: 0,
            offline_materials: OfflineMaterials::default(),
            description: "Intensive beginner German".into(),
            instructor_id: None,
            trainer_ids: Vec::new(),
            status: CourseStatus::Draft,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn valid_course_passes() {
        assert_eq!(validate_course(&course()), Vec::<String>::new());
    }

    #[test]
    fn course_ranges_are_checked_independently() {
        let bad = Course {
            month: 13,
            year: 2019,
            batch_size_limit: 4,
            batch_types: BatchTypes::default(),
            ..course()
        };
        assert_eq!(
            validate_course(&bad),
            vec![
                "Month must be between 1 and 12",
                "Year must be between 2020 and 2030",
                "Batch size limit must be between 5 and 100",
                "At least one batch type must be enabled",
            ]
        );
    }

    #[test]
    fn capacity_cannot_drop_below_enrolled() {
        let mut c = course();
        c.batch_types.regular.student_count = 12;
        c.total_capacity = 10;
        assert!(
            validate_course(&c)
                .contains(&"Total capacity cannot be below the number of enrolled students".into())
        );
    }

    fn post() -> BlogPost {
        let now = Utc::now();
        BlogPost {
            id: "blg-00000001".into(),
            title: "Ten Tips".into(),
            slug: "ten-tips".into(),
            excerpt: "Short".into(),
            content: "Body".into(),
            blog_type: BlogType::Text,
            category: BlogCategory::LearningTips,
            difficulty: Difficulty::Beginner,
            language: Language::English,
            video_url: None,
            thumbnail: None,
            featured: false,
            published: false,
            published_at: None,
            author_id: "usr-1".into(),
            views: 0,
            likes: 0,
            tags: Vec::new(),
            read_time: "1 min read".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn blog_limits() {
        assert!(validate_blog_post(&post()).is_empty());
        let long = BlogPost {
            title: "x".repeat(201),
            excerpt: "y".repeat(501),
            blog_type: BlogType::Video,
            ..post()
        };
        assert_eq!(
            validate_blog_post(&long),
            vec![
                "Title cannot exceed 200 characters",
                "Excerpt cannot exceed 500 characters",
                "Video URL is required for video posts",
            ]
        );
    }

    fn ad() -> HomepageAd {
        let now = Utc::now();
        HomepageAd {
            id: "adv-00000001".into(),
            course_id: None,
            ad_type: AdType::Popup,
            special_note: "New batch".into(),
            cta_text: "Enroll".into(),
            cta_link: "/courses".into(),
            timer_seconds: Some(10),
            frequency: AdFrequency::Always,
            target_audience: TargetAudience::All,
            target_roles: Vec::new(),
            start_date: now,
            end_date: now + Duration::days(7),
            status: PublishStatus::Draft,
            impressions: 0,
            clicks: 0,
            closes: 0,
            priority: 5,
            created_by: "usr-1".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ad_rules() {
        assert!(validate_homepage_ad(&ad()).is_empty());
        let start = Utc::now();
        let bad = HomepageAd {
            timer_seconds: Some(301),
            priority: 0,
            start_date: start,
            end_date: start,
            target_audience: TargetAudience::RoleBased,
            ..ad()
        };
        assert_eq!(
            validate_homepage_ad(&bad),
            vec![
                "Timer must be between 1 and 300 seconds",
                "Priority must be between 1 and 10",
                "End date must be after start date",
                "Target roles are required for role-based ads",
            ]
        );
        let targeted = HomepageAd {
            target_audience: TargetAudience::RoleBased,
            target_roles: vec![Role::Student],
            ..ad()
        };
        assert!(validate_homepage_ad(&targeted).is_empty());
    }
}
