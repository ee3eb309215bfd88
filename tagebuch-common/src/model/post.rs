use crate::model::{
    Id,
    category::{Category, CategoryMarker},
    user::User,
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;
use time::UtcDateTime;

pub const POST_TITLE_MAX_LEN: usize = 255;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

/// A post as rendered on the index and detail pages: author and categories
/// preloaded, comment count annotated at query time.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub title: PostTitle,
    pub content: String,
    pub image: Option<String>,
    pub created_at: UtcDateTime,
    pub author: User,
    pub categories: Vec<Category>,
    pub num_comments: u64,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreatePost {
    pub title: PostTitle,
    pub content: String,
    pub image: Option<String>,
    pub categories: Vec<Id<CategoryMarker>>,
}

/// Sidebar entry: the most-commented posts.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PopularPost {
    pub id: Id<PostMarker>,
    pub title: PostTitle,
    pub num_comments: u64,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct PostTitle(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidPostTitleError {
    #[error("A title is required")]
    Empty,
    #[error("A title may be at most {POST_TITLE_MAX_LEN} characters long")]
    TooLong,
}

impl PostTitle {
    pub fn new(title: String) -> Result<Self, InvalidPostTitleError> {
        if title.trim().is_empty() {
            Err(InvalidPostTitleError::Empty)
        } else if title.chars().count() > POST_TITLE_MAX_LEN {
            Err(InvalidPostTitleError::TooLong)
        } else {
            Ok(PostTitle(title))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl<'de> Deserialize<'de> for PostTitle {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        PostTitle::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"PostTitle"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::post::{InvalidPostTitleError, POST_TITLE_MAX_LEN, PostTitle};

    #[test]
    fn title_bounds() {
        assert!(PostTitle::new("Hello world".to_owned()).is_ok());
        assert!(PostTitle::new("t".repeat(POST_TITLE_MAX_LEN)).is_ok());

        assert_eq!(PostTitle::new(String::new()), Err(InvalidPostTitleError::Empty));
        assert_eq!(
            PostTitle::new(" \t ".to_owned()),
            Err(InvalidPostTitleError::Empty)
        );
        assert_eq!(
            PostTitle::new("t".repeat(POST_TITLE_MAX_LEN + 1)),
            Err(InvalidPostTitleError::TooLong)
        );
    }
}
