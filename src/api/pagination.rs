//! Pagination utilities for list endpoints

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::HOST, request::Parts},
};
use serde::Deserialize;
use url::Url;

use super::response::{HttpUrl, ItemEnvelope, PaginatedEnvelope};
use crate::config::Settings;
use crate::error::{ApiError, ApiResult};

/// Page-number query parameters
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PageParams {
    /// Page number (1-indexed)
    pub page: Option<i64>,

    /// Items per page
    pub page_size: Option<i64>,
}

/// Limit/offset query parameters
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LimitOffsetParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Page-number pagination producing [`PaginatedEnvelope`]s with
/// `next`/`previous` links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageNumberPagination {
    page_size: u64,
    max_page_size: u64,
}

impl PageNumberPagination {
    pub const PAGE_QUERY_PARAM: &'static str = "page";

    pub fn new(page_size: u64, max_page_size: u64) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            max_page_size: max_page_size.max(page_size),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.pagination_per_page, settings.pagination_max_page_size)
    }

    /// Requested page size, falling back to the default when absent or
    /// non-positive, cut off at `max_page_size`.
    pub fn page_size(&self, requested: Option<i64>) -> u64 {
        match requested {
            Some(size) if size > 0 => (size as u64).min(self.max_page_size),
            _ => self.page_size,
        }
    }

    /// Slice one page out of `items`.
    ///
    /// `base_url` is the absolute URL of the current request; the links
    /// rewrite its `page` query parameter.
    pub fn paginate<T>(
        &self,
        items: Vec<T>,
        base_url: &Url,
        params: &PageParams,
    ) -> ApiResult<PaginatedEnvelope<T>> {
        let page_size = self.page_size(params.page_size);
        let page = params.page.unwrap_or(1);
        let count = items.len() as u64;
        // The first page of an empty collection is still a page.
        let num_pages = count.div_ceil(page_size).max(1);

        if page < 1 {
            return Err(invalid_page(page, "That page number is less than 1"));
        }
        if page as u64 > num_pages {
            return Err(invalid_page(page, "That page contains no results"));
        }
        let page = page as u64;

        let start = ((page - 1) * page_size) as usize;
        let results: Vec<T> = items
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        let next = (page < num_pages)
            .then(|| replace_query_param(base_url, Self::PAGE_QUERY_PARAM, page + 1))
            .transpose()?;
        let previous = match page {
            1 => None,
            2 => Some(remove_query_param(base_url, Self::PAGE_QUERY_PARAM)?),
            _ => Some(replace_query_param(
                base_url,
                Self::PAGE_QUERY_PARAM,
                page - 1,
            )?),
        };

        tracing::debug!(
            count,
            page,
            page_size,
            returned = results.len(),
            "Paginated by page number"
        );

        Ok(PaginatedEnvelope::new(count, next, previous, results))
    }
}

/// Limit/offset pagination producing [`ItemEnvelope`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitOffsetPagination {
    default_limit: u64,
    max_limit: u64,
}

impl LimitOffsetPagination {
    pub fn new(default_limit: u64, max_limit: u64) -> Self {
        let default_limit = default_limit.max(1);
        Self {
            default_limit,
            max_limit: max_limit.max(default_limit),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.pagination_per_page, settings.pagination_max_page_size)
    }

    pub fn paginate<T>(
        &self,
        items: Vec<T>,
        params: &LimitOffsetParams,
    ) -> ApiResult<ItemEnvelope<T>> {
        let limit = match params.limit {
            None => self.default_limit,
            Some(limit) if limit >= 1 => (limit as u64).min(self.max_limit),
            Some(limit) => {
                return Err(ApiError::BadRequest(format!(
                    "limit must be greater than or equal to 1, got {limit}"
                )))
            }
        };
        let offset = match params.offset.unwrap_or(0) {
            offset if offset >= 0 => offset as u64,
            offset => {
                return Err(ApiError::BadRequest(format!(
                    "offset must be greater than or equal to 0, got {offset}"
                )))
            }
        };

        let count = items.len() as u64;
        let items: Vec<T> = items
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect();

        tracing::debug!(count, limit, offset, returned = items.len(), "Paginated by offset");

        Ok(ItemEnvelope::new(count, items))
    }
}

fn invalid_page(page: i64, reason: &str) -> ApiError {
    ApiError::NotFound(format!("Invalid page. {page} {reason}"))
}

fn rebuild_query<F>(url: &Url, key: &str, rewrite: F) -> ApiResult<HttpUrl>
where
    F: FnOnce(&mut Vec<(String, String)>),
{
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != key)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    rewrite(&mut pairs);

    let mut url = url.clone();
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
    HttpUrl::try_from(url).map_err(ApiError::from)
}

/// Set `key` to `value`, dropping any previous occurrences.
pub fn replace_query_param(url: &Url, key: &str, value: impl ToString) -> ApiResult<HttpUrl> {
    let value = value.to_string();
    rebuild_query(url, key, |pairs| pairs.push((key.to_string(), value)))
}

/// Drop every occurrence of `key`.
pub fn remove_query_param(url: &Url, key: &str) -> ApiResult<HttpUrl> {
    rebuild_query(url, key, |_| {})
}

/// Absolute URL of the current request, rebuilt from the `Host` header.
#[derive(Debug, Clone)]
pub struct AbsoluteUrl(pub Url);

#[async_trait]
impl<S> FromRequestParts<S> for AbsoluteUrl
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let host = parts
            .headers
            .get(HOST)
            .and_then(|value| value.to_str().ok())
            .or_else(|| parts.uri.authority().map(|authority| authority.as_str()))
            .ok_or_else(|| ApiError::BadRequest("Missing Host header".to_string()))?;

        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|value| value.to_str().ok())
            .unwrap_or("http");

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let url = Url::parse(&format!("{scheme}://{host}{path_and_query}"))
            .map_err(|e| ApiError::BadRequest(format!("Invalid request URL: {e}")))?;

        Ok(AbsoluteUrl(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn page(page: i64) -> PageParams {
        PageParams {
            page: Some(page),
            page_size: None,
        }
    }

    #[test]
    fn test_page_size_fallback_and_cutoff() {
        let pagination = PageNumberPagination::new(10, 50);
        assert_eq!(pagination.page_size(None), 10);
        assert_eq!(pagination.page_size(Some(0)), 10);
        assert_eq!(pagination.page_size(Some(-3)), 10);
        assert_eq!(pagination.page_size(Some(25)), 25);
        assert_eq!(pagination.page_size(Some(500)), 50);
    }

    #[test]
    fn test_middle_page_links() {
        let pagination = PageNumberPagination::new(2, 10);
        let base = url("http://testserver/api/tasks?page=2&ordering=title");

        let envelope = pagination
            .paginate((1..=5).collect(), &base, &page(2))
            .unwrap();

        assert_eq!(envelope.count, 5);
        assert_eq!(envelope.results, vec![3, 4]);
        assert_eq!(
            envelope.next.unwrap().as_str(),
            "http://testserver/api/tasks?ordering=title&page=3"
        );
        assert_eq!(
            envelope.previous.unwrap().as_str(),
            "http://testserver/api/tasks?ordering=title"
        );
    }

    #[test]
    fn test_last_page_has_no_next() {
        let pagination = PageNumberPagination::new(2, 10);
        let base = url("http://testserver/api/tasks?page=3");

        let envelope = pagination
            .paginate((1..=5).collect(), &base, &page(3))
            .unwrap();

        assert_eq!(envelope.results, vec![5]);
        assert!(envelope.next.is_none());
        assert_eq!(
            envelope.previous.unwrap().as_str(),
            "http://testserver/api/tasks?page=2"
        );
    }

    #[test]
    fn test_empty_first_page_is_valid() {
        let pagination = PageNumberPagination::new(10, 10);
        let envelope = pagination
            .paginate(Vec::<i64>::new(), &url("http://testserver/"), &PageParams::default())
            .unwrap();

        assert_eq!(envelope.count, 0);
        assert!(envelope.results.is_empty());
        assert!(envelope.next.is_none());
        assert!(envelope.previous.is_none());
    }

    #[test]
    fn test_invalid_pages() {
        let pagination = PageNumberPagination::new(2, 10);
        let base = url("http://testserver/");

        let err = pagination.paginate(vec![1, 2, 3], &base, &page(3)).unwrap_err();
        assert!(matches!(&err, ApiError::NotFound(msg) if msg == "Invalid page. 3 That page contains no results"));

        let err = pagination.paginate(vec![1, 2, 3], &base, &page(0)).unwrap_err();
        assert!(matches!(&err, ApiError::NotFound(msg) if msg.contains("less than 1")));
    }

    #[test]
    fn test_limit_offset() {
        let pagination = LimitOffsetPagination::new(2, 3);

        let envelope = pagination
            .paginate((1..=10).collect::<Vec<i64>>(), &LimitOffsetParams::default())
            .unwrap();
        assert_eq!(envelope.count, 10);
        assert_eq!(envelope.items, vec![1, 2]);

        let params = LimitOffsetParams {
            limit: Some(100),
            offset: Some(8),
        };
        let envelope = pagination.paginate((1..=10).collect::<Vec<i64>>(), &params).unwrap();
        assert_eq!(envelope.items, vec![9, 10]);

        let params = LimitOffsetParams {
            limit: Some(0),
            offset: None,
        };
        assert!(matches!(
            pagination.paginate(vec![1_i64], &params),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_query_param_helpers() {
        let base = url("http://testserver/items?page=4&page=5&q=a+b");
        assert_eq!(
            replace_query_param(&base, "page", 6).unwrap().as_str(),
            "http://testserver/items?q=a+b&page=6"
        );
        assert_eq!(
            remove_query_param(&base, "q").unwrap().as_str(),
            "http://testserver/items?page=4&page=5"
        );
        assert_eq!(
            remove_query_param(&url("http://testserver/items?page=2"), "page")
                .unwrap()
                .as_str(),
            "http://testserver/items"
        );
    }
}
