//! Blog repository: posts, slugs, the public listing, and view counts.

use chrono::Utc;

use campus_core::entities::{BlogPost, estimate_read_time, slugify};
use campus_core::enums::{AuditAction, EntityType};
use campus_core::ids::PREFIX_BLOG;
use campus_core::responses::{BlogListResponse, BlogPostResponse, Pagination};
use campus_core::validation::validate_blog_post;

use crate::error::DatabaseError;
use crate::helpers::{
    first_u64, get_bool, get_opt_string, get_u64, is_unique_violation, parse_datetime,
    parse_enum, parse_json, parse_optional_datetime, to_i64, to_json,
};
use crate::service::{CampusService, finish};
use crate::updates::blog::{BlogFilter, BlogUpdate, NewBlogPost};

const SELECT_COLS: &str = "id, title, slug, excerpt, content, blog_type, category, difficulty, \
     language, video_url, thumbnail, featured, published, published_at, author_id, views, likes, \
     tags, read_time, created_at, updated_at";

const RELATED_POSTS: u32 = 3;

fn row_to_post(row: &libsql::Row) -> Result<BlogPost, DatabaseError> {
    Ok(BlogPost {
        id: row.get::<String>(0)?,
        title: row.get::<String>(1)?,
        slug: row.get::<String>(2)?,
        excerpt: row.get::<String>(3)?,
        content: row.get::<String>(4)?,
        blog_type: parse_enum(&row.get::<String>(5)?)?,
        category: parse_enum(&row.get::<String>(6)?)?,
        difficulty: parse_enum(&row.get::<String>(7)?)?,
        language: parse_enum(&row.get::<String>(8)?)?,
        video_url: get_opt_string(row, 9)?,
        thumbnail: get_opt_string(row, 10)?,
        featured: get_bool(row, 11)?,
        published: get_bool(row, 12)?,
        published_at: parse_optional_datetime(get_opt_string(row, 13)?.as_deref())?,
        author_id: row.get::<String>(14)?,
        views: get_u64(row, 15)?,
        likes: get_u64(row, 16)?,
        tags: parse_json(&row.get::<String>(17)?)?,
        read_time: row.get::<String>(18)?,
        created_at: parse_datetime(&row.get::<String>(19)?)?,
        updated_at: parse_datetime(&row.get::<String>(20)?)?,
    })
}

fn slug_conflict(e: libsql::Error) -> DatabaseError {
    if is_unique_violation(&e) {
        DatabaseError::Conflict("A post with this title already exists".into())
    } else {
        e.into()
    }
}

impl CampusService {
    /// # Errors
    ///
    /// Returns `Validation` when the post breaks a record rule and `Conflict`
    /// when its slug is taken.
    pub async fn create_blog_post(
        &self,
        author_id: &str,
        input: &NewBlogPost,
    ) -> Result<BlogPost, DatabaseError> {
        let now = Utc::now();
        let post = BlogPost {
            id: String::new(),
            title: input.title.trim().to_string(),
            slug: slugify(&input.title),
            excerpt: input.excerpt.trim().to_string(),
            content: input.content.clone(),
            blog_type: input.blog_type,
            category: input.category,
            difficulty: input.difficulty,
            language: input.language,
            video_url: input.video_url.clone(),
            thumbnail: input.thumbnail.clone(),
            featured: input.featured,
            published: input.published,
            published_at: input.published.then_some(now),
            author_id: author_id.to_string(),
            views: 0,
            likes: 0,
            tags: input.tags.clone(),
            read_time: estimate_read_time(&input.content),
            created_at: now,
            updated_at: now,
        };
        let errors = validate_blog_post(&post);
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }

        let _gate = self.gate().await;
        let post = BlogPost {
            id: self.db().generate_id(PREFIX_BLOG).await?,
            ..post
        };
        self.write_post(&post, true).await?;
        self.audit(Some(author_id), EntityType::Blog, &post.id, AuditAction::Created, None)
            .await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "blog post created");
        Ok(post)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no post has this id.
    pub async fn get_blog_post(&self, id: &str) -> Result<BlogPost, DatabaseError> {
        let _gate = self.gate().await;
        let mut rows = self
            .db()
            .conn()
            .query(&format!("SELECT {SELECT_COLS} FROM blog_posts WHERE id = ?1"), [id])
            .await?;
        match rows.next().await? {
            Some(row) => row_to_post(&row),
            None => Err(DatabaseError::not_found("Blog post", id)),
        }
    }

    /// Public view of a published post by slug. Counts the view and returns
    /// up to three newer-first posts of the same category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown or unpublished slug.
    pub async fn view_blog_post(&self, slug: &str) -> Result<BlogPostResponse, DatabaseError> {
        let _gate = self.gate().await;
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE blog_posts SET views = views + 1 WHERE slug = ?1 AND published = 1",
                [slug],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::not_found("Blog post", slug));
        }
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {SELECT_COLS} FROM blog_posts WHERE slug = ?1"),
                [slug],
            )
            .await?;
        let post = match rows.next().await? {
            Some(row) => row_to_post(&row)?,
            None => return Err(DatabaseError::not_found("Blog post", slug)),
        };
        let related_posts = self
            .collect_posts(
                &format!(
                    "SELECT {SELECT_COLS} FROM blog_posts
                     WHERE published = 1 AND category = ?1 AND id != ?2
                     ORDER BY published_at DESC, created_at DESC LIMIT {RELATED_POSTS}"
                ),
                libsql::params![post.category.as_str(), post.id.as_str()],
            )
            .await?;
        Ok(BlogPostResponse {
            post,
            related_posts,
        })
    }

    /// Paginated posts, newest first. Featured posts lead the public listing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if a query fails.
    pub async fn list_blog_posts(
        &self,
        filter: &BlogFilter,
        page: u32,
        limit: u32,
    ) -> Result<BlogListResponse, DatabaseError> {
        let _gate = self.gate().await;
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();
        if filter.published_only {
            conditions.push("published = 1".to_string());
        }
        if let Some(category) = filter.category {
            params.push(category.as_str().into());
            conditions.push(format!("category = ?{}", params.len()));
        }
        if let Some(language) = filter.language {
            params.push(language.as_str().into());
            conditions.push(format!("language = ?{}", params.len()));
        }
        if let Some(difficulty) = filter.difficulty {
            params.push(difficulty.as_str().into());
            conditions.push(format!("difficulty = ?{}", params.len()));
        }
        if let Some(blog_type) = filter.blog_type {
            params.push(blog_type.as_str().into());
            conditions.push(format!("blog_type = ?{}", params.len()));
        }
        if let Some(featured) = filter.featured {
            params.push(i64::from(featured).into());
            conditions.push(format!("featured = ?{}", params.len()));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            params.push(format!("%{}%", search.to_lowercase()).into());
            let n = params.len();
            conditions.push(format!(
                "(lower(title) LIKE ?{n} OR lower(excerpt) LIKE ?{n} OR lower(tags) LIKE ?{n})"
            ));
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
                    &format!("SELECT COUNT(*) FROM blog_posts {where_clause}"),
                    libsql::params_from_iter(params.clone()),
                )
                .await?,
        )
        .await?;
        let pagination = Pagination::new(page, limit, total);
        let posts = self
            .collect_posts(
                &format!(
                    "SELECT {SELECT_COLS} FROM blog_posts {where_clause}
                     ORDER BY featured DESC, COALESCE(published_at, created_at) DESC
                     LIMIT {limit} OFFSET {}",
                    pagination.offset()
                ),
                libsql::params_from_iter(params),
            )
            .await?;
        Ok(BlogListResponse { posts, pagination })
    }

    /// Apply a partial update. A new title regenerates the slug, new content
    /// re-estimates the read time, and the first publish stamps `published_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Validation`, or `Conflict` for a taken slug.
    pub async fn update_blog_post(
        &self,
        actor: Option<&str>,
        id: &str,
        update: &BlogUpdate,
    ) -> Result<BlogPost, DatabaseError> {
        let _gate = self.gate().await;
        let mut post = self.get_blog_post(id).await?;
        if let Some(ref title) = update.title {
            post.title = title.trim().to_string();
            post.slug = slugify(title);
        }
        if let Some(ref excerpt) = update.excerpt {
            post.excerpt = excerpt.trim().to_string();
        }
        if let Some(ref content) = update.content {
            post.content.clone_from(content);
            post.read_time = estimate_read_time(content);
        }
        if let Some(blog_type) = update.blog_type {
            post.blog_type = blog_type;
        }
        if let Some(category) = update.category {
            post.category = category;
        }
        if let Some(difficulty) = update.difficulty {
            post.difficulty = difficulty;
        }
        if let Some(language) = update.language {
            post.language = language;
        }
        if let Some(ref video_url) = update.video_url {
            post.video_url.clone_from(video_url);
        }
        if let Some(ref thumbnail) = update.thumbnail {
            post.thumbnail.clone_from(thumbnail);
        }
        if let Some(featured) = update.featured {
            post.featured = featured;
        }
        if let Some(ref tags) = update.tags {
            post.tags.clone_from(tags);
        }
        let now = Utc::now();
        if let Some(published) = update.published {
            post.published = published;
            if published && post.published_at.is_none() {
                post.published_at = Some(now);
            }
        }
        post.updated_at = now;

        let errors = validate_blog_post(&post);
        if !errors.is_empty() {
            return Err(DatabaseError::Validation(errors));
        }
        self.write_post(&post, false).await?;
        self.audit(
            actor,
            EntityType::Blog,
            id,
            AuditAction::Updated,
            Some(serde_json::to_value(update)?),
        )
        .await?;
        Ok(post)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no post has this id.
    pub async fn delete_blog_post(
        &self,
        actor: Option<&str>,
        id: &str,
    ) -> Result<(), DatabaseError> {
        let _gate = self.gate().await;
        self.ensure_exists(EntityType::Blog, "Blog post", id).await?;
        let tx = self.begin().await?;
        let result: Result<_, DatabaseError> = async {
            self.db()
                .conn()
                .execute("DELETE FROM blog_posts WHERE id = ?1", [id])
                .await?;
            self.audit(actor, EntityType::Blog, id, AuditAction::Deleted, None)
                .await
        }
        .await;
        finish(tx, result).await
    }

    async fn write_post(&self, post: &BlogPost, insert: bool) -> Result<(), DatabaseError> {
        let sql = if insert {
            format!(
                "INSERT INTO blog_posts ({SELECT_COLS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                     ?17, ?18, ?19, ?20, ?21)"
            )
        } else {
            "UPDATE blog_posts SET title = ?2, slug = ?3, excerpt = ?4, content = ?5,
                 blog_type = ?6, category = ?7, difficulty = ?8, language = ?9, video_url = ?10,
                 thumbnail = ?11, featured = ?12, published = ?13, published_at = ?14,
                 tags = ?18, read_time = ?19, updated_at = ?21
             WHERE id = ?1"
                .to_string()
        };
        self.db()
            .conn()
            .execute(
                &sql,
                libsql::params![
                    post.id.as_str(),
                    post.title.as_str(),
                    post.slug.as_str(),
                    post.excerpt.as_str(),
                    post.content.as_str(),
                    post.blog_type.as_str(),
                    post.category.as_str(),
                    post.difficulty.as_str(),
                    post.language.as_str(),
                    post.video_url.as_deref(),
                    post.thumbnail.as_deref(),
                    i64::from(post.featured),
                    i64::from(post.published),
                    post.published_at.map(|d| d.to_rfc3339()),
                    post.author_id.as_str(),
                    to_i64(post.views),
                    to_i64(post.likes),
                    to_json(&post.tags)?,
                    post.read_time.as_str(),
                    post.created_at.to_rfc3339(),
                    post.updated_at.to_rfc3339()
                ],
            )
            .await
            .map_err(slug_conflict)?;
        Ok(())
    }

    async fn collect_posts(
        &self,
        sql: &str,
        params: impl libsql::params::IntoParams,
    ) -> Result<Vec<BlogPost>, DatabaseError> {
        let mut rows = self.db().conn().query(sql, params).await?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next().await? {
            posts.push(row_to_post(&row)?);
        }
        Ok(posts)
    }
}
