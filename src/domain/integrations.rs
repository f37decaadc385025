//! Usage: Integration records, the provider catalog, and OAuth state parsing.

#![allow(dead_code)]

use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const STATUS_CONNECTED: &str = "connected";
const STATUS_DISCONNECTED: &str = "disconnected";
const STATUS_ERROR: &str = "error";

pub(crate) const PROVIDER_GOOGLE_CALENDAR: &str = "google_calendar";
pub(crate) const PROVIDER_GOOGLE_GMAIL: &str = "google_gmail";
pub(crate) const PROVIDER_MICROSOFT_CALENDAR: &str = "microsoft_calendar";
pub(crate) const PROVIDER_MICROSOFT_OUTLOOK: &str = "microsoft_outlook";
pub(crate) const PROVIDER_GITHUB: &str = "github";
pub(crate) const PROVIDER_SLACK: &str = "slack";
pub(crate) const PROVIDER_CALENDLY: &str = "calendly";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Connected,
    Disconnected,
    Error,
}

impl IntegrationStatus {
    pub(crate) fn parse_lossy(raw: &str) -> Self {
        match raw.trim() {
            STATUS_CONNECTED => Self::Connected,
            STATUS_DISCONNECTED => Self::Disconnected,
            STATUS_ERROR => Self::Error,
            _ => Self::Disconnected,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Connected => STATUS_CONNECTED,
            Self::Disconnected => STATUS_DISCONNECTED,
            Self::Error => STATUS_ERROR,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Integration {
    pub id: i64,
    pub provider: String,
    #[serde(default)]
    pub provider_user_id: String,
    #[serde(default)]
    pub provider_email: String,
    pub status: IntegrationStatus,
    #[serde(default)]
    pub sync_enabled: bool,
    pub last_sync: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCounts {
    pub count: u64,
    pub connected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub total_integrations: u64,
    pub connected_integrations: u64,
    pub total_events: u64,
    pub total_emails: u64,
    pub last_sync: Option<String>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderCounts>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Calendar,
    Email,
    Code,
    Messaging,
    Scheduling,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub kind: ProviderKind,
    pub available: bool,
}

fn provider(
    id: &str,
    name: &str,
    description: &str,
    icon: &str,
    kind: ProviderKind,
    available: bool,
) -> ProviderInfo {
    ProviderInfo {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        kind,
        available,
    }
}

/// Local provider catalog, used when the backend's provider listing is
/// unreachable and as the validation set for connect requests.
pub(crate) fn provider_catalog() -> Vec<ProviderInfo> {
    vec![
        provider(
            PROVIDER_GOOGLE_CALENDAR,
            "Google Calendar",
            "Sync your Google Calendar events",
            "google",
            ProviderKind::Calendar,
            true,
        ),
        provider(
            PROVIDER_GOOGLE_GMAIL,
            "Gmail",
            "Sync your Gmail messages",
            "gmail",
            ProviderKind::Email,
            true,
        ),
        provider(
            PROVIDER_MICROSOFT_CALENDAR,
            "Microsoft Calendar",
            "Sync your Outlook Calendar events",
            "microsoft",
            ProviderKind::Calendar,
            false,
        ),
        provider(
            PROVIDER_MICROSOFT_OUTLOOK,
            "Microsoft Outlook",
            "Sync your Outlook email messages",
            "outlook",
            ProviderKind::Email,
            false,
        ),
        provider(
            PROVIDER_GITHUB,
            "GitHub",
            "Browse and manage your repositories",
            "github",
            ProviderKind::Code,
            true,
        ),
        provider(
            PROVIDER_SLACK,
            "Slack",
            "Connect your Slack workspace",
            "slack",
            ProviderKind::Messaging,
            false,
        ),
        provider(
            PROVIDER_CALENDLY,
            "Calendly",
            "Sync your Calendly bookings",
            "calendly",
            ProviderKind::Scheduling,
            false,
        ),
    ]
}

pub(crate) fn is_known_provider(provider_id: &str) -> bool {
    provider_catalog().iter().any(|p| p.id == provider_id)
}

/// The backend issues `state` as `user_id:provider:timestamp`; the provider
/// identifier is always the second segment.
pub(crate) fn provider_from_state(state: &str) -> AppResult<String> {
    let trimmed = state.trim();
    if trimmed.is_empty() {
        return Err("SEC_INVALID_INPUT: oauth state is required".into());
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() < 2 {
        return Err("SEC_INVALID_INPUT: invalid oauth state parameter".into());
    }

    let provider = parts[1].trim();
    if provider.is_empty() {
        return Err("SEC_INVALID_INPUT: invalid oauth state parameter".into());
    }
    Ok(provider.to_string())
}

const SYNC_TYPE_CALENDAR: &str = "calendar";
const SYNC_TYPE_EMAIL: &str = "email";
const SYNC_TYPE_FULL: &str = "full";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Calendar,
    Email,
    Full,
}

impl SyncType {
    pub(crate) fn parse_strict(raw: &str) -> Option<Self> {
        match raw.trim() {
            SYNC_TYPE_CALENDAR => Some(Self::Calendar),
            SYNC_TYPE_EMAIL => Some(Self::Email),
            SYNC_TYPE_FULL => Some(Self::Full),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => SYNC_TYPE_CALENDAR,
            Self::Email => SYNC_TYPE_EMAIL,
            Self::Full => SYNC_TYPE_FULL,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: i64,
    pub integration: i64,
    pub sync_type: SyncType,
    pub status: String,
    #[serde(default)]
    pub items_synced: u64,
    pub error_message: Option<String>,
    #[serde(default)]
    pub started_at: String,
    pub completed_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_covers_every_supported_provider() {
        let catalog = provider_catalog();
        let ids: Vec<&str> = catalog.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                PROVIDER_GOOGLE_CALENDAR,
                PROVIDER_GOOGLE_GMAIL,
                PROVIDER_MICROSOFT_CALENDAR,
                PROVIDER_MICROSOFT_OUTLOOK,
                PROVIDER_GITHUB,
                PROVIDER_SLACK,
                PROVIDER_CALENDLY,
            ]
        );
    }

    #[test]
    fn google_providers_are_available_microsoft_not_yet() {
        let catalog = provider_catalog();
        let by_id = |id: &str| catalog.iter().find(|p| p.id == id).expect("provider");
        assert!(by_id(PROVIDER_GOOGLE_CALENDAR).available);
        assert!(by_id(PROVIDER_GOOGLE_GMAIL).available);
        assert!(!by_id(PROVIDER_MICROSOFT_CALENDAR).available);
        assert!(!by_id(PROVIDER_MICROSOFT_OUTLOOK).available);
    }

    #[test]
    fn provider_from_state_takes_second_segment() {
        assert_eq!(
            provider_from_state("42:google_calendar:1718900000.123").expect("provider"),
            "google_calendar"
        );
        assert_eq!(provider_from_state("42:github").expect("provider"), "github");
    }

    #[test]
    fn provider_from_state_rejects_malformed_values() {
        assert!(provider_from_state("").is_err());
        assert!(provider_from_state("justonechunk").is_err());
        assert!(provider_from_state("42::123").is_err());
    }

    #[test]
    fn integration_status_parses_known_values_lossily() {
        assert_eq!(
            IntegrationStatus::parse_lossy("connected"),
            IntegrationStatus::Connected
        );
        assert_eq!(
            IntegrationStatus::parse_lossy("mystery"),
            IntegrationStatus::Disconnected
        );
        assert_eq!(IntegrationStatus::Error.as_str(), "error");
    }

    #[test]
    fn sync_type_round_trips() {
        assert_eq!(SyncType::parse_strict("full"), Some(SyncType::Full));
        assert_eq!(SyncType::parse_strict("bogus"), None);
        assert_eq!(SyncType::Calendar.as_str(), "calendar");
    }

    #[test]
    fn integration_deserializes_backend_payload() {
        let raw = r#"{
            "id": 3,
            "provider": "google_calendar",
            "provider_user_id": "u-123",
            "provider_email": "ada@example.com",
            "status": "connected",
            "sync_enabled": true,
            "last_sync": "2024-06-01T10:00:00Z",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-06-01T10:00:00Z"
        }"#;
        let integration: Integration = serde_json::from_str(raw).expect("integration");
        assert_eq!(integration.status, IntegrationStatus::Connected);
        assert!(integration.sync_enabled);
    }
}
