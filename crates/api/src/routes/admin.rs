//! Admin message management route handlers.
//!
//! Every handler here requires an authenticated admin session via the
//! [`RequireAdmin`] extractor.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use portfolio_core::{MessageDbId, MessageStatus};

use crate::db::RepositoryError;
use crate::db::messages::{
    MAX_SEARCH_LENGTH, MessageListQuery, MessageRepository, SortColumn, SortOrder,
};
use crate::error::{ApiError, FieldErrors, Result};
use crate::middleware::RequireAdmin;
use crate::models::Message;
use crate::state::AppState;

/// Raw query parameters for the message list.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub is_read: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

/// Paginator metadata, shaped like the dashboard expects.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub per_page: i64,
    pub current_page: i64,
    pub last_page: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

/// Response for the paginated message list.
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub success: bool,
    pub data: Vec<Message>,
    pub pagination: PaginationMeta,
}

/// Response for a single message fetch.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub data: Message,
}

/// Message statistics.
#[derive(Debug, Serialize)]
pub struct Statistics {
    pub total: i64,
    pub read: i64,
    pub unread: i64,
}

/// Response for the statistics endpoint.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    pub success: bool,
    pub statistics: Statistics,
}

/// Bulk action request body.
#[derive(Debug, Deserialize)]
pub struct BulkActionRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub ids: Vec<i32>,
}

/// Response for a bulk action.
#[derive(Debug, Serialize)]
pub struct BulkActionResponse {
    pub success: bool,
    pub message: String,
    pub affected_rows: u64,
}

/// List messages with pagination, filters, and sorting.
///
/// GET /admin/messages
#[instrument(skip(state, _admin, params))]
pub async fn list_messages(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<MessageListResponse>> {
    let query = parse_list_params(&params)?;

    if query.limit > 5000 {
        // Large query; worth a trace for capacity monitoring
        warn!(limit = query.limit, "Large dataset query");
    }

    let repo = MessageRepository::new(state.pool());
    let page = repo.list(&query).await.map_err(map_list_error)?;

    let pagination = PaginationMeta {
        total: page.total,
        per_page: page.per_page,
        current_page: page.current_page,
        last_page: page.last_page(),
        from: page.from(),
        to: page.to(),
    };

    Ok(Json(MessageListResponse {
        success: true,
        data: page.items,
        pagination,
    }))
}

/// Message statistics for the dashboard header.
///
/// GET /admin/messages/stats
#[instrument(skip(state, _admin))]
pub async fn statistics(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<StatisticsResponse>> {
    let repo = MessageRepository::new(state.pool());

    let total = repo.count(None).await?;
    let unread = repo.count(Some(false)).await?;

    Ok(Json(StatisticsResponse {
        success: true,
        statistics: Statistics {
            total,
            read: total - unread,
            unread,
        },
    }))
}

/// Fetch a single message, marking it read on first view.
///
/// GET /admin/messages/{id}
#[instrument(skip(state, _admin))]
pub async fn get_message(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>> {
    let repo = MessageRepository::new(state.pool());
    let id = MessageDbId::new(id);

    let mut message = repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;

    // First admin view flips the read flag (false -> true only)
    if !message.is_read {
        repo.mark_as_read(id).await?;
        message = repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Message not found".to_string()))?;
    }

    Ok(Json(MessageResponse {
        success: true,
        data: message,
    }))
}

/// Apply a bulk action to a set of messages.
///
/// PATCH /admin/bulk/messages
#[instrument(skip(state, _admin, request), fields(action = %request.action, count = request.ids.len()))]
pub async fn bulk_action(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(request): Json<BulkActionRequest>,
) -> Result<Json<BulkActionResponse>> {
    validate_bulk_request(&request)?;

    let repo = MessageRepository::new(state.pool());

    let affected_rows = match request.action.as_str() {
        "mark_read" => repo.set_read(&request.ids, true).await?,
        "mark_unread" => repo.set_read(&request.ids, false).await?,
        "delete" => repo.delete_many(&request.ids).await?,
        // Unreachable past validation
        other => return Err(ApiError::BadRequest(format!("Unknown action: {other}"))),
    };

    info!(action = %request.action, affected_rows, "Bulk action completed");

    Ok(Json(BulkActionResponse {
        success: true,
        message: format!("Bulk action '{}' completed", request.action),
        affected_rows,
    }))
}

/// Parse and validate the raw list parameters.
///
/// `page` and `limit` clamp silently; everything else is a whitelist and
/// rejects with field-level errors.
fn parse_list_params(params: &ListParams) -> Result<MessageListQuery> {
    let mut errors = FieldErrors::new();

    let sort = match params.sort.as_deref() {
        None => SortColumn::default(),
        Some(raw) => raw.parse::<SortColumn>().unwrap_or_else(|e| {
            errors.entry("sort".to_string()).or_default().push(e);
            SortColumn::default()
        }),
    };

    let order = match params.order.as_deref() {
        None => SortOrder::default(),
        Some(raw) => raw.parse::<SortOrder>().unwrap_or_else(|e| {
            errors.entry("order".to_string()).or_default().push(e);
            SortOrder::default()
        }),
    };

    let is_read = match params.is_read.as_deref() {
        None => None,
        Some("0") => Some(false),
        Some("1") => Some(true),
        Some(other) => {
            errors
                .entry("is_read".to_string())
                .or_default()
                .push(format!("is_read must be 0 or 1, got: {other}"));
            None
        }
    };

    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<MessageStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                errors.entry("status".to_string()).or_default().push(e);
                None
            }
        },
    };

    let search = match params.search.as_deref() {
        None | Some("") => None,
        Some(raw) if raw.len() > MAX_SEARCH_LENGTH => {
            errors.entry("search".to_string()).or_default().push(format!(
                "search must be at most {MAX_SEARCH_LENGTH} characters"
            ));
            None
        }
        Some(raw) => Some(raw.to_string()),
    };

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let (page, limit) = MessageListQuery::clamped(params.page, params.limit);

    Ok(MessageListQuery {
        page,
        limit,
        sort,
        order,
        is_read,
        status,
        search,
    })
}

/// Validate a bulk action request.
fn validate_bulk_request(request: &BulkActionRequest) -> Result<()> {
    let mut errors = FieldErrors::new();

    if !matches!(request.action.as_str(), "mark_read" | "mark_unread" | "delete") {
        errors.entry("action".to_string()).or_default().push(format!(
            "action must be one of mark_read, mark_unread, delete; got: {}",
            request.action
        ));
    }

    if request.ids.is_empty() {
        errors
            .entry("ids".to_string())
            .or_default()
            .push("ids must not be empty".to_string());
    } else if request.ids.iter().any(|id| *id <= 0) {
        errors
            .entry("ids".to_string())
            .or_default()
            .push("ids must be positive integers".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Map a list-query failure, surfacing resource pressure distinctly.
fn map_list_error(error: RepositoryError) -> ApiError {
    let detail = error.to_string();
    if detail.contains("memory") || detail.contains("timeout") || detail.contains("exhausted") {
        ApiError::ResourceExhausted(detail)
    } else {
        ApiError::Database(error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_params_defaults() {
        let query = parse_list_params(&ListParams::default()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 15);
        assert_eq!(query.sort, SortColumn::CreatedAt);
        assert_eq!(query.order, SortOrder::Desc);
        assert!(query.is_read.is_none());
        assert!(query.status.is_none());
        assert!(query.search.is_none());
    }

    #[test]
    fn test_parse_list_params_limit_clamps_silently() {
        let params = ListParams {
            limit: Some(99_999),
            ..Default::default()
        };
        let query = parse_list_params(&params).unwrap();
        assert_eq!(query.limit, 10_000);
    }

    #[test]
    fn test_parse_list_params_rejects_bad_sort() {
        let params = ListParams {
            sort: Some("status; DROP TABLE messages".to_string()),
            ..Default::default()
        };
        let err = parse_list_params(&params).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn test_parse_list_params_is_read_flag() {
        let params = ListParams {
            is_read: Some("1".to_string()),
            ..Default::default()
        };
        assert_eq!(parse_list_params(&params).unwrap().is_read, Some(true));

        let params = ListParams {
            is_read: Some("yes".to_string()),
            ..Default::default()
        };
        assert!(parse_list_params(&params).is_err());
    }

    #[test]
    fn test_parse_list_params_status_whitelist() {
        let params = ListParams {
            status: Some("bounced".to_string()),
            ..Default::default()
        };
        assert_eq!(
            parse_list_params(&params).unwrap().status,
            Some(MessageStatus::Bounced)
        );

        let params = ListParams {
            status: Some("email.bounced".to_string()),
            ..Default::default()
        };
        assert!(parse_list_params(&params).is_err());
    }

    #[test]
    fn test_validate_bulk_request() {
        let ok = BulkActionRequest {
            action: "mark_read".to_string(),
            ids: vec![1, 2, 3],
        };
        assert!(validate_bulk_request(&ok).is_ok());

        let bad_action = BulkActionRequest {
            action: "archive".to_string(),
            ids: vec![1],
        };
        assert!(validate_bulk_request(&bad_action).is_err());

        let empty_ids = BulkActionRequest {
            action: "delete".to_string(),
            ids: Vec::new(),
        };
        assert!(validate_bulk_request(&empty_ids).is_err());

        let negative_ids = BulkActionRequest {
            action: "delete".to_string(),
            ids: vec![1, -2],
        };
        assert!(validate_bulk_request(&negative_ids).is_err());
    }

    #[test]
    fn test_map_list_error_detects_resource_pressure() {
        let err = map_list_error(RepositoryError::DataCorruption(
            "statement timeout exceeded".to_string(),
        ));
        assert!(matches!(err, ApiError::ResourceExhausted(_)));

        let err = map_list_error(RepositoryError::NotFound);
        assert!(matches!(err, ApiError::Database(_)));
    }
}
