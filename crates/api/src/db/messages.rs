//! Message repository for database operations.
//!
//! Uses the runtime query API throughout; the list query is assembled with
//! `QueryBuilder` because its WHERE clause depends on the active filters.

use sqlx::{PgPool, Postgres, QueryBuilder, Row};

use portfolio_core::{EmailAddress, MessageDbId, MessageId, MessageStatus};

use super::RepositoryError;
use crate::models::Message;

/// Hard cap on `limit`; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: i64 = 10_000;

/// Default page size when `limit` is unset.
pub const DEFAULT_PAGE_SIZE: i64 = 15;

/// Maximum accepted length of the search term.
pub const MAX_SEARCH_LENGTH: usize = 100;

/// Fields a new message is created from.
#[derive(Debug)]
pub struct NewMessage {
    pub name: String,
    pub email: EmailAddress,
    pub subject: String,
    pub body: String,
    pub message_id: MessageId,
}

/// Whitelisted sort columns for the admin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    CreatedAt,
    Name,
    Email,
    Subject,
    IsRead,
}

impl SortColumn {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::Name => "name",
            Self::Email => "email",
            Self::Subject => "subject",
            Self::IsRead => "is_read",
        }
    }
}

impl std::str::FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_at" => Ok(Self::CreatedAt),
            "name" => Ok(Self::Name),
            "email" => Ok(Self::Email),
            "subject" => Ok(Self::Subject),
            "is_read" => Ok(Self::IsRead),
            _ => Err(format!("invalid sort column: {s}")),
        }
    }
}

/// Sort direction for the admin list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(format!("invalid sort order: {s}")),
        }
    }
}

/// Validated parameters for the paginated admin list.
#[derive(Debug, Default)]
pub struct MessageListQuery {
    /// 1-based page number.
    pub page: i64,
    /// Page size, already clamped to `1..=MAX_PAGE_SIZE`.
    pub limit: i64,
    pub sort: SortColumn,
    pub order: SortOrder,
    pub is_read: Option<bool>,
    pub status: Option<MessageStatus>,
    /// Substring matched case-insensitively across name, email, subject, and
    /// body.
    pub search: Option<String>,
}

impl MessageListQuery {
    /// Clamp raw pagination numbers into their valid ranges.
    ///
    /// `limit` silently clamps to `1..=MAX_PAGE_SIZE` and `page` to `>= 1`;
    /// unset values take the documented defaults (page 1, 15 per page).
    #[must_use]
    pub fn clamped(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        (page, limit)
    }

    const fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// One page of messages plus the paginator metadata the dashboard renders.
#[derive(Debug)]
pub struct MessagePage {
    pub items: Vec<Message>,
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
}

impl MessagePage {
    /// Last page number (at least 1, like Eloquent's paginator).
    #[must_use]
    pub const fn last_page(&self) -> i64 {
        let pages = (self.total + self.per_page - 1) / self.per_page;
        if pages < 1 { 1 } else { pages }
    }

    /// 1-based index of the first item on this page, `None` when empty.
    #[must_use]
    pub fn from(&self) -> Option<i64> {
        (!self.items.is_empty()).then(|| (self.current_page - 1) * self.per_page + 1)
    }

    /// 1-based index of the last item on this page, `None` when empty.
    #[must_use]
    pub fn to(&self) -> Option<i64> {
        self.from().map(|from| {
            let len = i64::try_from(self.items.len()).unwrap_or(0);
            from + len - 1
        })
    }
}

const MESSAGE_COLUMNS: &str =
    "id, name, email, subject, message, message_id, status, is_read, created_at, updated_at";

/// Repository for message database operations.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new submission with status `pending` and `is_read = false`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the external id already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new: NewMessage) -> Result<Message, RepositoryError> {
        let message = sqlx::query_as::<_, Message>(
            r"
            INSERT INTO messages (name, email, subject, message, message_id, status, is_read)
            VALUES ($1, $2, $3, $4, $5, 'pending', FALSE)
            RETURNING id, name, email, subject, message, message_id, status, is_read,
                      created_at, updated_at
            ",
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.subject)
        .bind(&new.body)
        .bind(&new.message_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("message_id already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(message)
    }

    /// Get a message by its database id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_id(&self, id: MessageDbId) -> Result<Option<Message>, RepositoryError> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(message)
    }

    /// Get a message by its external correlation id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_message_id(
        &self,
        message_id: &MessageId,
    ) -> Result<Option<Message>, RepositoryError> {
        let message = sqlx::query_as::<_, Message>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = $1"
        ))
        .bind(message_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(message)
    }

    /// Update only the delivery status of a message.
    ///
    /// Returns `false` when no row matched. Concurrent updates for the same
    /// row are last-write-wins; webhook deliveries are not serialized.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: MessageDbId,
        status: MessageStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE messages SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a single message as read. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn mark_as_read(&self, id: MessageDbId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set the read flag for a batch of messages; returns affected rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_read(&self, ids: &[i32], is_read: bool) -> Result<u64, RepositoryError> {
        let result = sqlx::query("UPDATE messages SET is_read = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(is_read)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete a batch of messages; returns affected rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_many(&self, ids: &[i32]) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = ANY($1)")
            .bind(ids)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Fetch one page of messages matching the filters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either the count or the page
    /// query fails.
    pub async fn list(&self, query: &MessageListQuery) -> Result<MessagePage, RepositoryError> {
        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM messages");
        push_filters(&mut count_builder, query);

        let total: i64 = count_builder
            .build()
            .fetch_one(self.pool)
            .await?
            .try_get(0)?;

        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {MESSAGE_COLUMNS} FROM messages"));
        push_filters(&mut builder, query);

        // Sort column and order come from closed enums, never from the
        // request string.
        builder.push(format!(
            " ORDER BY {} {}",
            query.sort.as_sql(),
            query.order.as_sql()
        ));
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset());

        let items = builder
            .build_query_as::<Message>()
            .fetch_all(self.pool)
            .await?;

        Ok(MessagePage {
            items,
            total,
            per_page: query.limit,
            current_page: query.page,
        })
    }

    /// Count messages, optionally restricted by read flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, is_read: Option<bool>) -> Result<i64, RepositoryError> {
        let count: i64 = match is_read {
            Some(flag) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE is_read = $1")
                    .bind(flag)
                    .fetch_one(self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM messages")
                    .fetch_one(self.pool)
                    .await?
            }
        };

        Ok(count)
    }
}

/// Append the WHERE clause for the active filters.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &MessageListQuery) {
    let mut has_where = false;
    let mut push_clause = |builder: &mut QueryBuilder<'_, Postgres>| {
        if has_where {
            builder.push(" AND ");
        } else {
            builder.push(" WHERE ");
            has_where = true;
        }
    };

    if let Some(is_read) = query.is_read {
        push_clause(builder);
        builder.push("is_read = ");
        builder.push_bind(is_read);
    }

    if let Some(status) = query.status {
        push_clause(builder);
        builder.push("status = ");
        builder.push_bind(status);
    }

    if let Some(search) = query.search.as_deref()
        && !search.is_empty()
    {
        let pattern = format!("%{search}%");
        push_clause(builder);
        builder.push("(name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR subject ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR message ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clamped_defaults() {
        let (page, limit) = MessageListQuery::clamped(None, None);
        assert_eq!(page, 1);
        assert_eq!(limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_clamped_limit_upper_bound() {
        let (_, limit) = MessageListQuery::clamped(None, Some(99_999));
        assert_eq!(limit, MAX_PAGE_SIZE);
    }

    #[test]
    fn test_clamped_lower_bounds() {
        let (page, limit) = MessageListQuery::clamped(Some(0), Some(0));
        assert_eq!(page, 1);
        assert_eq!(limit, 1);
        let (page, limit) = MessageListQuery::clamped(Some(-3), Some(-10));
        assert_eq!(page, 1);
        assert_eq!(limit, 1);
    }

    #[test]
    fn test_sort_column_whitelist() {
        assert_eq!("created_at".parse::<SortColumn>().unwrap(), SortColumn::CreatedAt);
        assert_eq!("is_read".parse::<SortColumn>().unwrap(), SortColumn::IsRead);
        assert!("status".parse::<SortColumn>().is_err());
        assert!("id; DROP TABLE messages".parse::<SortColumn>().is_err());
    }

    #[test]
    fn test_sort_order_whitelist() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("DESC".parse::<SortOrder>().is_err());
    }

    #[test]
    fn test_page_math() {
        let page = MessagePage {
            items: Vec::new(),
            total: 31,
            per_page: 15,
            current_page: 3,
        };
        assert_eq!(page.last_page(), 3);
        assert_eq!(page.from(), None);
        assert_eq!(page.to(), None);
    }

    #[test]
    fn test_page_math_empty_table() {
        let page = MessagePage {
            items: Vec::new(),
            total: 0,
            per_page: 15,
            current_page: 1,
        };
        assert_eq!(page.last_page(), 1);
    }

    #[test]
    fn test_filter_sql_contains_bound_clauses() {
        let query = MessageListQuery {
            page: 1,
            limit: 15,
            is_read: Some(false),
            status: Some(portfolio_core::MessageStatus::Pending),
            search: Some("hello".to_string()),
            ..Default::default()
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM messages");
        push_filters(&mut builder, &query);
        let sql = builder.sql();

        assert!(sql.contains("WHERE is_read = "));
        assert!(sql.contains(" AND status = "));
        assert!(sql.contains("ILIKE"));
        // Search term must be bound, never spliced
        assert!(!sql.contains("hello"));
    }
}
