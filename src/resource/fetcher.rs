//! Resource Fetcher
//!
//! One generic list/get engine for every resource type: builds the request
//! URL from the type's endpoint metadata, unwraps the response envelope and
//! drives the page-cursor loop.

use super::model::{Resource, Scope};
use super::registry::{ColumnDef, Transform};
use crate::error::{Error, Result};
use crate::host::Row;
use crate::yc::client::YcClient;
use futures::stream::{self, Stream};
use serde_json::Value;
use std::future::Future;

/// Opaque continuation cursor; empty means no more pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_end(&self) -> bool {
        self.0.is_empty()
    }
}

/// One decoded page
#[derive(Debug, Clone)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub next_page_token: PageToken,
}

/// Parameters of a single list call
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub folder_id: Option<String>,
    pub filter: Option<String>,
    /// Extra query parameters, e.g. `zoneId`
    pub params: Vec<(String, String)>,
    pub page_token: PageToken,
    pub page_size: u32,
}

impl ListQuery {
    fn with_page_token(&self, page_token: PageToken) -> Self {
        Self {
            page_token,
            ..self.clone()
        }
    }
}

/// Fetch one page of a collection
pub async fn list_page<R: Resource>(client: &YcClient, query: &ListQuery) -> Result<Page<R>> {
    let mut url = R::API.url(R::COLLECTION, None)?;
    {
        let mut pairs = url.query_pairs_mut();
        if R::SCOPE == Scope::Folder {
            if let Some(ref folder_id) = query.folder_id {
                pairs.append_pair("folderId", folder_id);
            }
            if let Some(ref filter) = query.filter {
                pairs.append_pair("filter", filter);
            }
        }
        for (key, value) in &query.params {
            pairs.append_pair(key, value);
        }
        if !query.page_token.is_end() {
            pairs.append_pair("pageToken", query.page_token.as_str());
        }
        if query.page_size > 0 {
            pairs.append_pair("pageSize", &query.page_size.to_string());
        }
    }

    let url_str = url.to_string();
    let mut response = client.get_json(url).await?;

    let items = match response.get_mut(R::LIST_KEY).map(Value::take) {
        Some(Value::Null) | None => Vec::new(),
        Some(list) => serde_json::from_value(list).map_err(|source| Error::Decode {
            url: url_str.clone(),
            source,
        })?,
    };

    let next_page_token = response
        .get("nextPageToken")
        .and_then(|v| v.as_str())
        .map(PageToken::new)
        .unwrap_or_default();

    tracing::debug!(
        "{} {}: {} item(s), more={}",
        R::COLLECTION,
        url_str,
        items.len(),
        !next_page_token.is_end()
    );

    Ok(Page {
        items,
        next_page_token,
    })
}

/// Fetch one item by id
///
/// `None` without a request when no id is supplied. A missing item is an
/// error like any other 4xx (`Error::Status` with status 404).
pub async fn get_item<R: Resource>(client: &YcClient, id: Option<&str>) -> Result<Option<R>> {
    let Some(id) = id.filter(|id| !id.is_empty()) else {
        return Ok(None);
    };

    let mut url = R::API.url(R::COLLECTION, Some(id))?;
    if !R::GET_PARAMS.is_empty() {
        url.query_pairs_mut().extend_pairs(R::GET_PARAMS.iter().copied());
    }

    let url_str = url.to_string();
    let mut body = client.get_json(url).await?;

    // Accept both `{"<item>": {...}}` and the bare object
    let wrapped = body
        .get_mut(R::ITEM_KEY)
        .filter(|inner| inner.is_object())
        .map(Value::take);
    let item = wrapped.unwrap_or(body);

    serde_json::from_value(item)
        .map(Some)
        .map_err(|source| Error::Decode {
            url: url_str,
            source,
        })
}

/// Stream pages until the cursor runs out
///
/// `fetch` is called once per page with the previous page's cursor (empty
/// on the first call).
pub fn pages<T, F, Fut>(fetch: F) -> impl Stream<Item = Result<Page<T>>>
where
    F: FnMut(PageToken) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    stream::try_unfold(
        (fetch, Some(PageToken::default())),
        |(mut fetch, token)| async move {
            let Some(token) = token else {
                return Ok(None);
            };
            let page = fetch(token).await?;
            let next = if page.next_page_token.is_end() {
                None
            } else {
                Some(page.next_page_token.clone())
            };
            Ok::<_, Error>(Some((page, (fetch, next))))
        },
    )
}

/// Stream every page of a collection
pub fn list_pages<'a, R: Resource>(
    client: &'a YcClient,
    query: ListQuery,
) -> impl Stream<Item = Result<Page<R>>> + 'a {
    pages(move |token| {
        let query = query.with_page_token(token);
        async move { list_page::<R>(client, &query).await }
    })
}

/// Map an item onto a row using column definitions
pub fn to_row(columns: &[ColumnDef], item: &Value) -> Row {
    let mut row = Row::new();
    for column in columns {
        let value = extract_json_value(item, &column.field)
            .cloned()
            .unwrap_or(Value::Null);
        let value = match (column.transform, value) {
            (Some(Transform::Date), Value::String(s)) => {
                format_date(&s).map(Value::String).unwrap_or(Value::Null)
            },
            (_, value) => value,
        };
        row.insert(column.name.clone(), value);
    }
    row
}

/// Date part of an ISO-8601 timestamp
///
/// Empty input has no value; anything shorter than a date passes through.
pub fn format_date(timestamp: &str) -> Option<String> {
    if timestamp.is_empty() {
        return None;
    }
    // RFC3339 format: 2023-01-15T10:30:00.000Z
    match timestamp.get(..10) {
        Some(date) => Some(date.to_string()),
        None => Some(timestamp.to_string()),
    }
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value<'a>(item: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = item;

    for part in path.split('.') {
        // Handle array index
        current = match part.parse::<usize>() {
            Ok(idx) if current.is_array() => current.get(idx)?,
            _ => current.get(part)?,
        };
    }

    Some(current)
}
