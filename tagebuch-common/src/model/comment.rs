use crate::model::{Id, user::User};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;
use time::UtcDateTime;

pub const COMMENT_TEXT_MAX_LEN: usize = 255;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub text: CommentText,
    pub created_at: UtcDateTime,
    pub author: User,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct CommentText(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidCommentTextError {
    #[error("A comment may not be empty")]
    Empty,
    #[error("A comment may be at most {COMMENT_TEXT_MAX_LEN} characters long")]
    TooLong,
}

impl CommentText {
    pub fn new(text: String) -> Result<Self, InvalidCommentTextError> {
        if text.trim().is_empty() {
            Err(InvalidCommentTextError::Empty)
        } else if text.chars().count() > COMMENT_TEXT_MAX_LEN {
            Err(InvalidCommentTextError::TooLong)
        } else {
            Ok(CommentText(text))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CommentText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        CommentText::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"CommentText"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::comment::{COMMENT_TEXT_MAX_LEN, CommentText, InvalidCommentTextError};

    #[test]
    fn comment_text_bounds() {
        assert!(CommentText::new("Nice post!".to_owned()).is_ok());
        assert!(CommentText::new("c".repeat(COMMENT_TEXT_MAX_LEN)).is_ok());

        assert_eq!(
            CommentText::new(String::new()),
            Err(InvalidCommentTextError::Empty)
        );
        assert_eq!(
            CommentText::new("\n".to_owned()),
            Err(InvalidCommentTextError::Empty)
        );
        assert_eq!(
            CommentText::new("c".repeat(COMMENT_TEXT_MAX_LEN + 1)),
            Err(InvalidCommentTextError::TooLong)
        );
    }
}
