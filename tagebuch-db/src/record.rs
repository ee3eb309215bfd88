use sqlx::FromRow;
use tagebuch_common::model::{
    ModelValidationError,
    auth::{Authentication, PasswordHash},
    category::{Category, CategoryName},
    comment::{Comment, CommentText},
    post::{PopularPost, Post, PostTitle},
    user::{User, Username},
};
use time::{Duration, PrimitiveDateTime};

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct UserRecord {
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CredentialsRecord {
    pub user_id: i64,
    pub username: String,
    pub is_superuser: bool,
    pub password_hash: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub author_is_superuser: bool,
    pub num_comments: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PopularPostRecord {
    pub post_id: i64,
    pub title: String,
    pub num_comments: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct CategoryRecord {
    pub category_id: i64,
    pub name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct PostCategoryRecord {
    pub post_id: i64,
    pub category_id: i64,
    pub name: String,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_id: i64,
    pub text: String,
    pub created_at: PrimitiveDateTime,
    pub author_id: i64,
    pub author_username: String,
    pub author_is_superuser: bool,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_id: i64,
    pub token_hash: Vec<u8>,
    pub created_at: PrimitiveDateTime,
    pub expires_after_seconds: Option<i64>,
}

impl TryFrom<UserRecord> for User {
    type Error = ModelValidationError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.user_id.into(),
            username: Username::new(value.username)?,
            is_superuser: value.is_superuser,
        })
    }
}

impl CredentialsRecord {
    pub(crate) fn into_credentials(self) -> Result<(User, PasswordHash), ModelValidationError> {
        let password_hash = PasswordHash::from_phc_string(self.password_hash);
        let user = User {
            id: self.user_id.into(),
            username: Username::new(self.username)?,
            is_superuser: self.is_superuser,
        };

        Ok((user, password_hash))
    }
}

impl PostRecord {
    /// Builds the domain post from this row plus its separately fetched
    /// category set.
    pub(crate) fn into_post(self, categories: Vec<Category>) -> Result<Post, ModelValidationError> {
        Ok(Post {
            id: self.post_id.into(),
            title: PostTitle::new(self.title)?,
            content: self.content,
            image: self.image,
            created_at: self.created_at.as_utc(),
            author: User {
                id: self.author_id.into(),
                username: Username::new(self.author_username)?,
                is_superuser: self.author_is_superuser,
            },
            categories,
            num_comments: self.num_comments.cast_unsigned(),
        })
    }
}

impl TryFrom<PopularPostRecord> for PopularPost {
    type Error = ModelValidationError;

    fn try_from(value: PopularPostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.post_id.into(),
            title: PostTitle::new(value.title)?,
            num_comments: value.num_comments.cast_unsigned(),
        })
    }
}

impl TryFrom<CategoryRecord> for Category {
    type Error = ModelValidationError;

    fn try_from(value: CategoryRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.category_id.into(),
            name: CategoryName::new(value.name)?,
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.comment_id.into(),
            text: CommentText::new(value.text)?,
            created_at: value.created_at.as_utc(),
            author: User {
                id: value.author_id.into(),
                username: Username::new(value.author_username)?,
                is_superuser: value.author_is_superuser,
            },
        })
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: value.user_id.into(),
            token_hash: value.token_hash.into_boxed_slice().try_into()?,
            created_at: value.created_at.as_utc(),
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::record::{AuthenticationRecord, CommentRecord, PostRecord, UserRecord};
    use tagebuch_common::model::{
        ModelValidationError, auth::AUTH_TOKEN_HASH_LEN, category::Category, comment::Comment,
        user::User,
    };
    use time::macros::datetime;

    #[test]
    fn user_record_conversion() {
        let record = UserRecord {
            user_id: 3,
            username: "alice".to_owned(),
            is_superuser: true,
        };

        let user = User::try_from(record).unwrap();
        assert_eq!(user.id.get(), 3);
        assert_eq!(user.username.get(), "alice");
        assert!(user.is_superuser);
    }

    #[test]
    fn user_record_with_empty_username_is_invalid() {
        let record = UserRecord {
            user_id: 3,
            username: String::new(),
            is_superuser: false,
        };

        assert!(matches!(
            User::try_from(record),
            Err(ModelValidationError::Username(_))
        ));
    }

    #[test]
    fn post_record_conversion_keeps_annotations() {
        let record = PostRecord {
            post_id: 10,
            title: "Test title".to_owned(),
            content: "Lorem ipsum dolor".to_owned(),
            image: None,
            created_at: datetime!(2025-06-01 12:00),
            author_id: 3,
            author_username: "alice".to_owned(),
            author_is_superuser: false,
            num_comments: 2,
        };

        let post = record.into_post(Vec::<Category>::new()).unwrap();
        assert_eq!(post.id.get(), 10);
        assert_eq!(post.num_comments, 2);
        assert_eq!(post.author.id.get(), 3);
        assert_eq!(post.created_at, datetime!(2025-06-01 12:00).as_utc());
        assert!(post.categories.is_empty());
    }

    #[test]
    fn comment_record_conversion() {
        let record = CommentRecord {
            comment_id: 5,
            text: "Test comment".to_owned(),
            created_at: datetime!(2025-06-02 08:30),
            author_id: 3,
            author_username: "alice".to_owned(),
            author_is_superuser: false,
        };

        let comment = Comment::try_from(record).unwrap();
        assert_eq!(comment.id.get(), 5);
        assert_eq!(comment.text.get(), "Test comment");
        assert_eq!(comment.author.username.get(), "alice");
    }

    #[test]
    fn authentication_record_rejects_wrong_hash_length() {
        let record = AuthenticationRecord {
            user_id: 3,
            token_hash: vec![0; AUTH_TOKEN_HASH_LEN - 1],
            created_at: datetime!(2025-06-01 12:00),
            expires_after_seconds: None,
        };

        assert!(matches!(
            tagebuch_common::model::auth::Authentication::try_from(record),
            Err(ModelValidationError::TokenHash(_))
        ));
    }

    #[test]
    fn authentication_record_rejects_non_positive_expiry() {
        let record = AuthenticationRecord {
            user_id: 3,
            token_hash: vec![0; AUTH_TOKEN_HASH_LEN],
            created_at: datetime!(2025-06-01 12:00),
            expires_after_seconds: Some(0),
        };

        assert!(matches!(
            tagebuch_common::model::auth::Authentication::try_from(record),
            Err(ModelValidationError::NonPositiveDuration(_))
        ));
    }
}
