use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{BlogCategory, BlogType, Difficulty, Language};

const WORDS_PER_MINUTE: usize = 200;

/// A blog article or video post.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    #[serde(rename = "type")]
    pub blog_type: BlogType,
    pub category: BlogCategory,
    pub difficulty: Difficulty,
    pub language: Language,
    pub video_url: Option<String>,
    pub thumbnail: Option<String>,
    pub featured: bool,
    pub published: bool,
    /// Set the first time the post is published and never cleared.
    pub published_at: Option<DateTime<Utc>>,
    pub author_id: String,
    pub views: u64,
    pub likes: u64,
    pub tags: Vec<String>,
    pub read_time: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// URL slug for a title: lowercase ASCII letters, digits, and single dashes.
#[must_use]
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    slug.trim_matches('-').to_string()
}

/// `"N min read"` at 200 words per minute, never below one minute.
#[must_use]
pub fn estimate_read_time(content: &str) -> String {
    let words = content.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    format!("{minutes} min read")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Hello World", "hello-world")]
    #[case("  10 Tips for Learning German!  ", "10-tips-for-learning-german")]
    #[case("Grammar -- the  hard   parts", "grammar-the-hard-parts")]
    #[case("Café & Crêpes", "caf-crpes")]
    #[case("---", "")]
    fn slugify_cases(#[case] title: &str, #[case] expected: &str) {
        assert_eq!(slugify(title), expected);
    }

    #[test]
    fn read_time_rounds_up() {
        assert_eq!(estimate_read_time(""), "1 min read");
        assert_eq!(estimate_read_time(&"word ".repeat(200)), "1 min read");
        assert_eq!(estimate_read_time(&"word ".repeat(201)), "2 min read");
    }
}
