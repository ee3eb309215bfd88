use crate::{
    query::PostQuery,
    record::{
        AuthenticationRecord, CategoryRecord, CommentRecord, CredentialsRecord, PopularPostRecord,
        PostCategoryRecord, PostRecord, UserRecord,
    },
};
use sqlx::{PgPool, QueryBuilder, postgres::PgPoolOptions};
use std::{collections::HashMap, num::NonZeroU64};
use thiserror::Error;
use tagebuch_common::{
    model::{
        Id, ModelValidationError,
        auth::{AuthTokenHash, Authentication, PasswordHash, PositiveDuration},
        category::{Category, CategoryMarker},
        comment::{Comment, CommentMarker, CommentText},
        contact::{ContactMessageMarker, CreateContactMessage},
        post::{CreatePost, PopularPost, Post, PostMarker},
        user::{User, UserMarker, Username},
    },
    pager::{Page, PageNumber, Pagination},
};

pub type Result<T, E = DbError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DbError {
    /// Whether this error is the store rejecting a duplicate key, e.g. a
    /// taken username. Callers surface that as a validation failure instead
    /// of an internal error.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::Sqlx(sqlx::Error::Database(database_error))
                if database_error.is_unique_violation()
        )
    }
}

#[derive(Debug)]
pub struct DbClient {
    pool: PgPool,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    pub async fn fetch_user(&self, user_id: Id<UserMarker>) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.is_superuser
            FROM
                users.users AS users
            WHERE
                users.user_id = $1
            ",
        )
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let user = record.map(User::try_from).transpose()?;
        Ok(user)
    }

    pub async fn create_user(
        &self,
        username: &Username,
        password_hash: &PasswordHash,
    ) -> Result<Id<UserMarker>> {
        let user_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO users.users (username, password_hash, is_superuser)
            VALUES ($1, $2, FALSE)
            RETURNING user_id
            ",
        )
        .bind(username.get())
        .bind(password_hash.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(user_id.into())
    }

    pub async fn fetch_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<(User, PasswordHash)>> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "
            SELECT
                users.user_id,
                users.username,
                users.is_superuser,
                users.password_hash
            FROM
                users.users AS users
            WHERE
                users.username = $1
            ",
        )
        .bind(username.get())
        .fetch_optional(&self.pool)
        .await?;

        let credentials = record.map(CredentialsRecord::into_credentials).transpose()?;
        Ok(credentials)
    }

    pub async fn create_auth(
        &self,
        user_id: Id<UserMarker>,
        token_hash: &AuthTokenHash,
        expires_after: Option<PositiveDuration>,
    ) -> Result<()> {
        sqlx::query(
            "
            INSERT INTO users.auth_tokens (user_id, token_hash, expires_after_seconds)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(user_id.get())
        .bind(token_hash.0.as_slice())
        .bind(expires_after.map(|duration| duration.get().whole_seconds()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = sqlx::query_as::<_, AuthenticationRecord>(
            "
            SELECT
                auth_tokens.user_id,
                auth_tokens.token_hash,
                auth_tokens.created_at,
                auth_tokens.expires_after_seconds
            FROM
                users.auth_tokens AS auth_tokens
            WHERE
                auth_tokens.token_hash = $1
            ",
        )
        .bind(token_hash.0.as_slice())
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }

    /// Executes the accumulated post query once: counts, clamps the
    /// requested page against the count, then fetches exactly that page with
    /// authors preloaded and comment counts annotated, newest first.
    pub async fn fetch_posts(
        &self,
        query: &PostQuery,
        requested: PageNumber,
        per_page: NonZeroU64,
    ) -> Result<Page<Post>> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM posts.posts AS posts WHERE TRUE");
        query.push_predicates(&mut count_builder);
        let total_items: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let pagination = Pagination::clamp(requested, per_page, total_items.cast_unsigned());

        let mut builder = QueryBuilder::new(
            "
            SELECT
                posts.post_id,
                posts.title,
                posts.content,
                posts.image,
                posts.created_at,
                users.user_id AS author_id,
                users.username AS author_username,
                users.is_superuser AS author_is_superuser,
                (
                    SELECT COUNT(*)
                    FROM posts.comments AS comments
                    WHERE comments.post_id = posts.post_id
                ) AS num_comments
            FROM posts.posts AS posts
            JOIN users.users AS users ON users.user_id = posts.author_id
            WHERE TRUE",
        );
        query.push_predicates(&mut builder);
        builder.push(" ORDER BY posts.created_at DESC LIMIT ");
        builder.push_bind(pagination.limit().cast_signed());
        builder.push(" OFFSET ");
        builder.push_bind(pagination.offset().cast_signed());

        let records: Vec<PostRecord> = builder.build_query_as().fetch_all(&self.pool).await?;

        let post_ids: Vec<i64> = records.iter().map(|record| record.post_id).collect();
        let mut categories = self.fetch_categories_per_post(&post_ids).await?;

        let posts = records
            .into_iter()
            .map(|record| {
                let post_categories = categories.remove(&record.post_id).unwrap_or_default();
                record.into_post(post_categories)
            })
            .collect::<Result<Vec<_>, ModelValidationError>>()?;

        Ok(Page::new(pagination, posts))
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = sqlx::query_as::<_, PostRecord>(
            "
            SELECT
                posts.post_id,
                posts.title,
                posts.content,
                posts.image,
                posts.created_at,
                users.user_id AS author_id,
                users.username AS author_username,
                users.is_superuser AS author_is_superuser,
                (
                    SELECT COUNT(*)
                    FROM posts.comments AS comments
                    WHERE comments.post_id = posts.post_id
                ) AS num_comments
            FROM posts.posts AS posts
            JOIN users.users AS users ON users.user_id = posts.author_id
            WHERE posts.post_id = $1
            ",
        )
        .bind(post_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let Some(record) = record else {
            return Ok(None);
        };

        let mut categories = self.fetch_categories_per_post(&[record.post_id]).await?;
        let post_categories = categories.remove(&record.post_id).unwrap_or_default();

        Ok(Some(record.into_post(post_categories)?))
    }

    pub async fn post_exists(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts.posts WHERE post_id = $1)")
                .bind(post_id.get())
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    /// Writes the post row and its category links in one transaction.
    pub async fn create_post(
        &self,
        post: &CreatePost,
        author: Id<UserMarker>,
    ) -> Result<Id<PostMarker>> {
        let mut transaction = self.pool.begin().await?;

        let post_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO posts.posts (title, content, image, author_id)
            VALUES ($1, $2, $3, $4)
            RETURNING post_id
            ",
        )
        .bind(post.title.get())
        .bind(&post.content)
        .bind(post.image.as_deref())
        .bind(author.get())
        .fetch_one(&mut *transaction)
        .await?;

        for category in &post.categories {
            sqlx::query("INSERT INTO posts.post_categories (post_id, category_id) VALUES ($1, $2)")
                .bind(post_id)
                .bind(category.get())
                .execute(&mut *transaction)
                .await?;
        }

        transaction.commit().await?;

        Ok(post_id.into())
    }

    /// Replaces the post's fields and category links. Returns `false` when
    /// the post does not exist.
    pub async fn update_post(&self, post_id: Id<PostMarker>, post: &CreatePost) -> Result<bool> {
        let mut transaction = self.pool.begin().await?;

        let updated = sqlx::query(
            "
            UPDATE posts.posts
            SET title = $1, content = $2, image = $3
            WHERE post_id = $4
            ",
        )
        .bind(post.title.get())
        .bind(&post.content)
        .bind(post.image.as_deref())
        .bind(post_id.get())
        .execute(&mut *transaction)
        .await?
        .rows_affected()
            > 0;

        if updated {
            sqlx::query("DELETE FROM posts.post_categories WHERE post_id = $1")
                .bind(post_id.get())
                .execute(&mut *transaction)
                .await?;

            for category in &post.categories {
                sqlx::query(
                    "INSERT INTO posts.post_categories (post_id, category_id) VALUES ($1, $2)",
                )
                .bind(post_id.get())
                .bind(category.get())
                .execute(&mut *transaction)
                .await?;
            }
        }

        transaction.commit().await?;

        Ok(updated)
    }

    /// Deletes the post along with its comments and category links. Returns
    /// `false` when the post does not exist.
    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let mut transaction = self.pool.begin().await?;

        sqlx::query("DELETE FROM posts.comments WHERE post_id = $1")
            .bind(post_id.get())
            .execute(&mut *transaction)
            .await?;
        sqlx::query("DELETE FROM posts.post_categories WHERE post_id = $1")
            .bind(post_id.get())
            .execute(&mut *transaction)
            .await?;
        let deleted = sqlx::query("DELETE FROM posts.posts WHERE post_id = $1")
            .bind(post_id.get())
            .execute(&mut *transaction)
            .await?
            .rows_affected()
            > 0;

        transaction.commit().await?;

        Ok(deleted)
    }

    pub async fn fetch_comments(
        &self,
        post_id: Id<PostMarker>,
        requested: PageNumber,
        per_page: NonZeroU64,
    ) -> Result<Page<Comment>> {
        let total_items: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM posts.comments WHERE post_id = $1")
                .bind(post_id.get())
                .fetch_one(&self.pool)
                .await?;

        let pagination = Pagination::clamp(requested, per_page, total_items.cast_unsigned());

        let records = sqlx::query_as::<_, CommentRecord>(
            "
            SELECT
                comments.comment_id,
                comments.text,
                comments.created_at,
                users.user_id AS author_id,
                users.username AS author_username,
                users.is_superuser AS author_is_superuser
            FROM posts.comments AS comments
            JOIN users.users AS users ON users.user_id = comments.author_id
            WHERE comments.post_id = $1
            ORDER BY comments.created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(post_id.get())
        .bind(pagination.limit().cast_signed())
        .bind(pagination.offset().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(pagination, comments))
    }

    pub async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        text: &CommentText,
    ) -> Result<Id<CommentMarker>> {
        let comment_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO posts.comments (post_id, author_id, text)
            VALUES ($1, $2, $3)
            RETURNING comment_id
            ",
        )
        .bind(post_id.get())
        .bind(author.get())
        .bind(text.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(comment_id.into())
    }

    /// Deletes a comment only when it belongs to `author` and to `post_id`;
    /// the ownership filter is part of the statement, so a foreign comment
    /// reports `false` exactly like a missing one.
    pub async fn delete_own_comment(
        &self,
        comment_id: Id<CommentMarker>,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
    ) -> Result<bool> {
        let deleted = sqlx::query(
            "
            DELETE FROM posts.comments
            WHERE comment_id = $1 AND post_id = $2 AND author_id = $3
            ",
        )
        .bind(comment_id.get())
        .bind(post_id.get())
        .bind(author.get())
        .execute(&self.pool)
        .await?
        .rows_affected()
            > 0;

        Ok(deleted)
    }

    pub async fn fetch_category(
        &self,
        category_id: Id<CategoryMarker>,
    ) -> Result<Option<Category>> {
        let record = sqlx::query_as::<_, CategoryRecord>(
            "
            SELECT
                categories.category_id,
                categories.name
            FROM
                posts.categories AS categories
            WHERE
                categories.category_id = $1
            ",
        )
        .bind(category_id.get())
        .fetch_optional(&self.pool)
        .await?;

        let category = record.map(Category::try_from).transpose()?;
        Ok(category)
    }

    /// All categories, alphabetically.
    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        let records = sqlx::query_as::<_, CategoryRecord>(
            "
            SELECT
                categories.category_id,
                categories.name
            FROM
                posts.categories AS categories
            ORDER BY
                categories.name
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        let categories = records
            .into_iter()
            .map(Category::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    pub async fn fetch_categories_by_ids(
        &self,
        category_ids: &[Id<CategoryMarker>],
    ) -> Result<Vec<Category>> {
        let raw_ids: Vec<i64> = category_ids.iter().map(|id| id.get()).collect();

        let records = sqlx::query_as::<_, CategoryRecord>(
            "
            SELECT
                categories.category_id,
                categories.name
            FROM
                posts.categories AS categories
            WHERE
                categories.category_id = ANY($1)
            ORDER BY
                categories.name
            ",
        )
        .bind(&raw_ids)
        .fetch_all(&self.pool)
        .await?;

        let categories = records
            .into_iter()
            .map(Category::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// The most-commented posts, for the sidebar.
    pub async fn fetch_popular_posts(&self, count: u64) -> Result<Vec<PopularPost>> {
        let records = sqlx::query_as::<_, PopularPostRecord>(
            "
            SELECT
                posts.post_id,
                posts.title,
                (
                    SELECT COUNT(*)
                    FROM posts.comments AS comments
                    WHERE comments.post_id = posts.post_id
                ) AS num_comments
            FROM posts.posts AS posts
            ORDER BY num_comments DESC, posts.created_at DESC
            LIMIT $1
            ",
        )
        .bind(count.cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(PopularPost::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    pub async fn create_contact_message(
        &self,
        message: &CreateContactMessage,
    ) -> Result<Id<ContactMessageMarker>> {
        let message_id: i64 = sqlx::query_scalar(
            "
            INSERT INTO contact.messages (name, email, subject, message)
            VALUES ($1, $2, $3, $4)
            RETURNING message_id
            ",
        )
        .bind(message.name.get())
        .bind(message.email.get())
        .bind(message.subject.get())
        .bind(message.message.get())
        .fetch_one(&self.pool)
        .await?;

        Ok(message_id.into())
    }

    /// One query for the category sets of a whole page of posts, grouped by
    /// post id with each set alphabetical.
    async fn fetch_categories_per_post(
        &self,
        post_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Category>>> {
        let records = sqlx::query_as::<_, PostCategoryRecord>(
            "
            SELECT
                post_categories.post_id,
                categories.category_id,
                categories.name
            FROM posts.post_categories AS post_categories
            JOIN posts.categories AS categories
                ON categories.category_id = post_categories.category_id
            WHERE post_categories.post_id = ANY($1)
            ORDER BY categories.name
            ",
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut categories_per_post: HashMap<i64, Vec<Category>> = HashMap::new();
        for record in records {
            let post_id = record.post_id;
            let category = Category::try_from(CategoryRecord {
                category_id: record.category_id,
                name: record.name,
            })?;
            categories_per_post
                .entry(post_id)
                .or_default()
                .push(category);
        }

        Ok(categories_per_post)
    }
}
