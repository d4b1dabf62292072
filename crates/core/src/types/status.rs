//! Delivery status of a contact message.

use serde::{Deserialize, Serialize};

/// Delivery-lifecycle status of a contact message.
///
/// A message starts out `Pending` and is moved between the other states by
/// webhook events from the email provider. Transitions are deliberately
/// unconstrained: the provider may emit events in any order or combination
/// (a `Delivered` can arrive after an `Opened`), so no state is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    #[default]
    Pending,
    Delivered,
    Bounced,
    Opened,
    Clicked,
    Complained,
}

impl MessageStatus {
    /// All recognized statuses, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Delivered,
        Self::Bounced,
        Self::Opened,
        Self::Clicked,
        Self::Complained,
    ];

    /// The wire/database representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Delivered => "delivered",
            Self::Bounced => "bounced",
            Self::Opened => "opened",
            Self::Clicked => "clicked",
            Self::Complained => "complained",
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "delivered" => Ok(Self::Delivered),
            "bounced" => Ok(Self::Bounced),
            "opened" => Ok(Self::Opened),
            "clicked" => Ok(Self::Clicked),
            "complained" => Ok(Self::Complained),
            _ => Err(format!("invalid message status: {s}")),
        }
    }
}

// Stored as TEXT; sqlx's derive would want a Postgres enum type, so the
// impls delegate to String like the other core newtypes.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for MessageStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for MessageStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(s.parse::<Self>()?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for MessageStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
    }
}
