//! External message correlation id.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MessageId`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum MessageIdError {
    /// The input string is empty.
    #[error("message id cannot be empty")]
    Empty,
    /// The input does not start with the `msg_` prefix.
    #[error("message id must start with msg_")]
    MissingPrefix,
}

/// Opaque external correlation id for a contact message.
///
/// Returned to the contact-form submitter, embedded as a tag on outbound
/// emails, and matched against webhook events from the email provider.
/// Immutable once assigned to a message.
///
/// Ids are generated by the intake service with the `msg_` prefix, a
/// time-based component, and random bytes; this type only enforces the shape,
/// not the generation scheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Prefix carried by every generated id.
    pub const PREFIX: &'static str = "msg_";

    /// Parse a `MessageId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or lacks the `msg_` prefix.
    pub fn parse(s: &str) -> Result<Self, MessageIdError> {
        if s.is_empty() {
            return Err(MessageIdError::Empty);
        }

        if !s.starts_with(Self::PREFIX) {
            return Err(MessageIdError::MissingPrefix);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `MessageId` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for MessageId {
    type Err = MessageIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for MessageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// SQLx support (with postgres feature)
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for MessageId {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for MessageId {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // Database values are assumed valid
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for MessageId {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
