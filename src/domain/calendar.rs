//! Usage: Calendar event types, list query parameters, and client-side narrowing.

use crate::api::client::QueryPairs;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};

pub(crate) const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub integration: i64,
    #[serde(default)]
    pub provider_event_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub attendees: Vec<String>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Query parameters forwarded to the backend list endpoint. Dates are
/// `YYYY-MM-DD`, matching the web client's filter inputs.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventQuery {
    pub(crate) provider: Option<String>,
    pub(crate) start_date: Option<String>,
    pub(crate) end_date: Option<String>,
    pub(crate) search: Option<String>,
    pub(crate) page: Option<u32>,
    pub(crate) page_size: Option<u32>,
}

fn push_text(query: &mut QueryPairs, key: &'static str, value: &Option<String>) {
    if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        query.push((key, value.to_string()));
    }
}

pub(crate) fn validate_page_size(page_size: Option<u32>) -> AppResult<()> {
    if let Some(size) = page_size {
        if size == 0 || size > MAX_PAGE_SIZE {
            return Err(
                format!("SEC_INVALID_INPUT: page_size must be within [1, {MAX_PAGE_SIZE}]").into(),
            );
        }
    }
    Ok(())
}

impl EventQuery {
    pub(crate) fn to_query(&self) -> AppResult<QueryPairs> {
        validate_page_size(self.page_size)?;

        let mut query = QueryPairs::new();
        push_text(&mut query, "provider", &self.provider);
        push_text(&mut query, "start_date", &self.start_date);
        push_text(&mut query, "end_date", &self.end_date);
        push_text(&mut query, "search", &self.search);
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size", page_size.to_string()));
        }
        Ok(query)
    }
}

/// Client-side narrowing of an already-fetched page.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventFilter {
    pub(crate) provider: Option<String>,
    pub(crate) start_date: Option<String>,
    pub(crate) end_date: Option<String>,
    pub(crate) search: Option<String>,
}

/// `2024-06-01T10:00:00Z` -> `2024-06-01`. RFC 3339 date prefixes compare
/// correctly as plain strings, which keeps the filters chrono-free.
fn date_prefix(timestamp: &str) -> &str {
    let trimmed = timestamp.trim();
    trimmed.split('T').next().unwrap_or(trimmed)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn event_matches(event: &CalendarEvent, provider_of: &str, filter: &EventFilter) -> bool {
    if let Some(provider) = filter.provider.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        if provider_of != provider {
            return false;
        }
    }
    if let Some(start) = filter.start_date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        if date_prefix(&event.start_time) < start {
            return false;
        }
    }
    if let Some(end) = filter.end_date.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        if date_prefix(&event.start_time) > end {
            return false;
        }
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        let hit = contains_ignore_case(&event.title, term)
            || contains_ignore_case(&event.description, term)
            || contains_ignore_case(&event.location, term);
        if !hit {
            return false;
        }
    }
    true
}
