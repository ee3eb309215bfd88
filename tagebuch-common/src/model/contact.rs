use crate::model::Id;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;
use time::UtcDateTime;

pub const SENDER_NAME_MAX_LEN: usize = 63;
pub const EMAIL_ADDRESS_MAX_LEN: usize = 254;
pub const SUBJECT_MAX_LEN: usize = 100;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ContactMessageMarker;

/// A persisted contact-form submission. Append-only: created once, never
/// mutated.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize, Serialize)]
pub struct ContactMessage {
    pub id: Id<ContactMessageMarker>,
    pub name: SenderName,
    pub email: EmailAddress,
    pub subject: Subject,
    pub message: MessageBody,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreateContactMessage {
    pub name: SenderName,
    pub email: EmailAddress,
    pub subject: Subject,
    pub message: MessageBody,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct SenderName(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidSenderNameError {
    #[error("A name is required")]
    Empty,
    #[error("A name may be at most {SENDER_NAME_MAX_LEN} characters long")]
    TooLong,
}

impl SenderName {
    pub fn new(name: String) -> Result<Self, InvalidSenderNameError> {
        if name.trim().is_empty() {
            Err(InvalidSenderNameError::Empty)
        } else if name.chars().count() > SENDER_NAME_MAX_LEN {
            Err(InvalidSenderNameError::TooLong)
        } else {
            Ok(SenderName(name))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidEmailAddressError {
    #[error("An email address is required")]
    Empty,
    #[error("An email address may be at most {EMAIL_ADDRESS_MAX_LEN} characters long")]
    TooLong,
    #[error("Enter a valid email address")]
    Malformed,
}

impl EmailAddress {
    pub fn new(email: String) -> Result<Self, InvalidEmailAddressError> {
        if email.is_empty() {
            return Err(InvalidEmailAddressError::Empty);
        }
        if email.chars().count() > EMAIL_ADDRESS_MAX_LEN {
            return Err(InvalidEmailAddressError::TooLong);
        }

        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty()
                    && !domain.is_empty()
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
            })
            && !email.chars().any(char::is_whitespace);

        if well_formed {
            Ok(EmailAddress(email))
        } else {
            Err(InvalidEmailAddressError::Malformed)
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct Subject(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidSubjectError {
    #[error("A subject is required")]
    Empty,
    #[error("A subject may be at most {SUBJECT_MAX_LEN} characters long")]
    TooLong,
}

impl Subject {
    pub fn new(subject: String) -> Result<Self, InvalidSubjectError> {
        if subject.trim().is_empty() {
            Err(InvalidSubjectError::Empty)
        } else if subject.chars().count() > SUBJECT_MAX_LEN {
            Err(InvalidSubjectError::TooLong)
        } else {
            Ok(Subject(subject))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageBody(String);

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidMessageBodyError {
    #[error("A message is required")]
    Empty,
}

impl MessageBody {
    pub fn new(message: String) -> Result<Self, InvalidMessageBodyError> {
        if message.trim().is_empty() {
            Err(InvalidMessageBodyError::Empty)
        } else {
            Ok(MessageBody(message))
        }
    }

    #[must_use]
    pub fn get(&self) -> &str {
        &self.0
    }
}

macro_rules! validating_deserialize {
    ($name:ident) => {
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let inner = String::deserialize(deserializer)?;
                $name::new(inner.clone()).map_err(|_| {
                    Error::invalid_value(Unexpected::Str(&inner), &stringify!($name))
                })
            }
        }
    };
}

validating_deserialize!(SenderName);
validating_deserialize!(EmailAddress);
validating_deserialize!(Subject);
validating_deserialize!(MessageBody);

#[cfg(test)]
mod tests {
    use crate::model::contact::{
        EmailAddress, InvalidEmailAddressError, InvalidSenderNameError, MessageBody, SENDER_NAME_MAX_LEN,
        SenderName, Subject,
    };

    #[test]
    fn sender_name_bounds() {
        assert!(SenderName::new("Test Name".to_owned()).is_ok());
        assert_eq!(
            SenderName::new(String::new()),
            Err(InvalidSenderNameError::Empty)
        );
        assert_eq!(
            SenderName::new("n".repeat(SENDER_NAME_MAX_LEN + 1)),
            Err(InvalidSenderNameError::TooLong)
        );
    }

    #[test]
    fn email_address_shapes() {
        assert!(EmailAddress::new("test@email.com".to_owned()).is_ok());
        assert!(EmailAddress::new("first.last@sub.example.org".to_owned()).is_ok());

        assert_eq!(
            EmailAddress::new(String::new()),
            Err(InvalidEmailAddressError::Empty)
        );
        for malformed in [
            "plainaddress",
            "@example.com",
            "user@",
            "user@nodot",
            "user@.example.com",
            "user@example.com.",
            "user name@example.com",
        ] {
            assert_eq!(
                EmailAddress::new(malformed.to_owned()),
                Err(InvalidEmailAddressError::Malformed),
                "{malformed} should be rejected"
            );
        }
    }

    #[test]
    fn subject_and_message_required() {
        assert!(Subject::new("Hello".to_owned()).is_ok());
        assert!(Subject::new("  ".to_owned()).is_err());
        assert!(MessageBody::new("A message".to_owned()).is_ok());
        assert!(MessageBody::new(String::new()).is_err());
    }
}
