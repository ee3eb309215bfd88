use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

pub const USERNAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub username: Username,
    pub is_superuser: bool,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidUsernameError {
    #[error("A username is required")]
    Empty,
    #[error("A username may be at most {USERNAME_MAX_LEN} characters long")]
    TooLong,
}

impl Username {
    pub fn new(username: String) -> Result<Self, InvalidUsernameError> {
        if username.trim().is_empty() {
            Err(InvalidUsernameError::Empty)
        } else if username.chars().count() > USERNAME_MAX_LEN {
            Err(InvalidUsernameError::TooLong)
        } else {
            Ok(Username(username))
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

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let inner = String::deserialize(deserializer)?;
        Username::new(inner.clone())
            .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &"Username"))
    }
}

/// A plaintext password as submitted on sign-up or login. Never stored and
/// never printed.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Password(String);

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("A password must be at least {PASSWORD_MIN_LEN} characters long")]
pub struct InvalidPasswordError;

impl Password {
    pub fn new(password: String) -> Result<Self, InvalidPasswordError> {
        if password.chars().count() < PASSWORD_MIN_LEN {
            Err(InvalidPasswordError)
        } else {
            Ok(Password(password))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

impl Debug for Password {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Password").field(&"[redacted]").finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::model::user::{
        InvalidPasswordError, InvalidUsernameError, Password, USERNAME_MAX_LEN, Username,
    };

    #[test]
    fn username_bounds() {
        assert!(Username::new("alice".to_owned()).is_ok());
        assert!(Username::new("a".repeat(USERNAME_MAX_LEN)).is_ok());

        assert_eq!(
            Username::new(String::new()),
            Err(InvalidUsernameError::Empty)
        );
        assert_eq!(
            Username::new("   ".to_owned()),
            Err(InvalidUsernameError::Empty)
        );
        assert_eq!(
            Username::new("a".repeat(USERNAME_MAX_LEN + 1)),
            Err(InvalidUsernameError::TooLong)
        );
    }

    #[test]
    fn password_minimum_length() {
        assert!(Password::new("Test12345".to_owned()).is_ok());
        assert_eq!(
            Password::new("short".to_owned()),
            Err(InvalidPasswordError)
        );
    }

    #[test]
    fn password_debug_is_redacted() {
        let password = Password::new("Test12345".to_owned()).unwrap();
        assert!(!format!("{password:?}").contains("Test12345"));
    }
}
