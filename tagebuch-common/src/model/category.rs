use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;

pub const CATEGORY_NAME_MAX_LEN: usize = 100;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CategoryMarker;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
pub struct Category {
    pub id: Id<CategoryMarker>,
    pub name: CategoryName,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct CategoryName(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidCategoryNameError {
    #[error("A category name is required")]
    Empty,
    #[error("A category name may be at most {CATEGORY_NAME_MAX_LEN} characters long")]
    TooLong,
}

impl CategoryName {
    pub fn new(name: String) -> Result<Self, InvalidCategoryNameError> {
        if name.trim().is_empty() {
            Err(InvalidCategoryNameError::Empty)
        } else if name.chars().count() > CATEGORY_NAME_MAX_LEN {
            Err(InvalidCategoryNameError::TooLong)
        } else {
            Ok(CategoryName(name))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CategoryName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        CategoryName::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"CategoryName"))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::category::{CATEGORY_NAME_MAX_LEN, CategoryName, InvalidCategoryNameError};

    #[test]
    fn category_name_bounds() {
        assert!(CategoryName::new("Rust".to_owned()).is_ok());
        assert_eq!(
            CategoryName::new(String::new()),
            Err(InvalidCategoryNameError::Empty)
        );
        assert_eq!(
            CategoryName::new("x".repeat(CATEGORY_NAME_MAX_LEN + 1)),
            Err(InvalidCategoryNameError::TooLong)
        );
    }
}
