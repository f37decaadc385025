//! Usage: Email message types, list query parameters, and client-side narrowing.

use crate::api::client::QueryPairs;
use crate::domain::calendar::validate_page_size;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailMessage {
    pub id: i64,
    pub integration: i64,
    #[serde(default)]
    pub provider_message_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub body_preview: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub received_at: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EmailQuery {
    pub(crate) provider: Option<String>,
    pub(crate) is_read: Option<bool>,
    pub(crate) is_important: Option<bool>,
    pub(crate) search: Option<String>,
    pub(crate) page: Option<u32>,
    pub(crate) page_size: Option<u32>,
}

impl EmailQuery {
    pub(crate) fn to_query(&self) -> AppResult<QueryPairs> {
        validate_page_size(self.page_size)?;

        let mut query = QueryPairs::new();
        if let Some(provider) = self.provider.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            query.push(("provider", provider.to_string()));
        }
        if let Some(is_read) = self.is_read {
            query.push(("is_read", is_read.to_string()));
        }
        if let Some(is_important) = self.is_important {
            query.push(("is_important", is_important.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            query.push(("search", search.to_string()));
        }
        if let Some(page) = self.page {
            query.push(("page", page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size", page_size.to_string()));
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct EmailFilter {
    pub(crate) is_read: Option<bool>,
    pub(crate) is_important: Option<bool>,
    pub(crate) search: Option<String>,
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub(crate) fn message_matches(message: &EmailMessage, filter: &EmailFilter) -> bool {
    if let Some(is_read) = filter.is_read {
        if message.is_read != is_read {
            return false;
        }
    }
    if let Some(is_important) = filter.is_important {
        if message.is_important != is_important {
            return false;
        }
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        let hit = contains_ignore_case(&message.subject, term)
            || contains_ignore_case(&message.sender, term)
            || contains_ignore_case(&message.body_preview, term);
        if !hit {
            return false;
        }
    }
    true
}
