//! Usage: Agent personas, chat session persistence, and reply interpretation.

use crate::domain::{financial, study};
use crate::shared::error::db_err;
use crate::shared::error::AppResult;
use crate::shared::time::now_unix_seconds;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

const AGENT_FINANCE: &str = "finance";
const AGENT_STUDY_BUDDY: &str = "study_buddy";
const AGENT_SUPPORT: &str = "support";
const AGENT_SALES: &str = "sales";

pub(crate) const ANONYMOUS_USER_ID: &str = "anonymous";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Finance,
    StudyBuddy,
    Support,
    Sales,
}

impl AgentKind {
    pub(crate) fn parse_strict(raw: &str) -> Option<Self> {
        match raw.trim() {
            AGENT_FINANCE => Some(Self::Finance),
            AGENT_STUDY_BUDDY => Some(Self::StudyBuddy),
            AGENT_SUPPORT => Some(Self::Support),
            AGENT_SALES => Some(Self::Sales),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Finance => AGENT_FINANCE,
            Self::StudyBuddy => AGENT_STUDY_BUDDY,
            Self::Support => AGENT_SUPPORT,
            Self::Sales => AGENT_SALES,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub(crate) fn agent_catalog() -> Vec<AgentInfo> {
    vec![
        AgentInfo {
            id: AGENT_FINANCE,
            name: "Finance Agent",
            description: "Stock prices, company facts, and analyst sentiment",
        },
        AgentInfo {
            id: AGENT_STUDY_BUDDY,
            name: "StudyBuddy",
            description: "Personalized study plans and learning resources",
        },
        AgentInfo {
            id: AGENT_SUPPORT,
            name: "Support Agent",
            description: "Help with your Integrato account and connections",
        },
        AgentInfo {
            id: AGENT_SALES,
            name: "Sales Agent",
            description: "Plans, pricing, and upgrade questions",
        },
    ]
}

/// Raw chat reply from the backend.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatReply {
    pub(crate) response: String,
    pub(crate) session_id: String,
    #[serde(default)]
    pub(crate) agent_type: String,
}

/// What the UI renders: the cleaned reply plus any structure we recognized.
#[derive(Debug, Clone, Serialize)]
pub struct AgentChatTurn {
    pub reply: String,
    pub session_id: String,
    pub agent_type: String,
    pub financial: Option<financial::FinancialSnapshot>,
    pub study_structured: bool,
    pub study_sections: Vec<String>,
}

/// The model sometimes leaks raw tool-call lines; never show those.
pub(crate) fn strip_tool_call_lines(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.contains("<function="))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn interpret_reply(kind: AgentKind, reply: ChatReply) -> AgentChatTurn {
    let cleaned = strip_tool_call_lines(&reply.response);

    let financial = if kind == AgentKind::Finance && financial::has_financial_markers(&cleaned) {
        Some(financial::extract(&cleaned)).filter(|snapshot| snapshot.is_meaningful())
    } else {
        None
    };

    let study_structured = kind == AgentKind::StudyBuddy && study::has_structured_content(&cleaned);
    let study_sections = if study_structured {
        study::section_titles(&cleaned)
    } else {
        Vec::new()
    };

    AgentChatTurn {
        reply: cleaned,
        session_id: reply.session_id,
        agent_type: if reply.agent_type.is_empty() {
            kind.as_str().to_string()
        } else {
            reply.agent_type
        },
        financial,
        study_structured,
        study_sections,
    }
}

// Per-agent session ids survive restarts so a conversation can continue.

pub(crate) fn stored_session_id(conn: &Connection, kind: AgentKind) -> AppResult<Option<String>> {
    conn.query_row(
        "SELECT session_id FROM agent_sessions WHERE agent_type = ?1",
        params![kind.as_str()],
        |row| row.get(0),
    )
    .optional()
    .map_err(|e| db_err!("failed to load agent session: {e}"))
}

pub(crate) fn remember_session_id(
    conn: &Connection,
    kind: AgentKind,
    session_id: &str,
) -> AppResult<()> {
    let session_id = session_id.trim();
    if session_id.is_empty() {
        return Err("SEC_INVALID_INPUT: session_id is required".into());
    }

    conn.execute(
        r#"
INSERT INTO agent_sessions (agent_type, session_id, updated_at)
VALUES (?1, ?2, ?3)
ON CONFLICT (agent_type) DO UPDATE SET
  session_id = excluded.session_id,
  updated_at = excluded.updated_at
"#,
        params![kind.as_str(), session_id, now_unix_seconds()],
    )
    .map_err(|e| db_err!("failed to remember agent session: {e}"))?;
    Ok(())
}

pub(crate) fn clear_session_id(conn: &Connection, kind: AgentKind) -> AppResult<bool> {
    let changed = conn
        .execute(
            "DELETE FROM agent_sessions WHERE agent_type = ?1",
            params![kind.as_str()],
        )
        .map_err(|e| db_err!("failed to clear agent session: {e}"))?;
    Ok(changed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::db;

    fn reply(response: &str) -> ChatReply {
        ChatReply {
            response: response.to_string(),
            session_id: "sess-1".to_string(),
            agent_type: String::new(),
        }
    }

    #[test]
    fn agent_kind_round_trips_catalog_ids() {
        for agent in agent_catalog() {
            let kind = AgentKind::parse_strict(agent.id).expect("known agent");
            assert_eq!(kind.as_str(), agent.id);
        }
        assert_eq!(AgentKind::parse_strict("poet"), None);
    }

    #[test]
    fn tool_call_lines_are_stripped() {
        let cleaned = strip_tool_call_lines(
            "Price lookup:\n<function=get_stock_price{\"symbol\": \"AAPL\"}></function>\nDone.",
        );
        assert_eq!(cleaned, "Price lookup:\nDone.");
    }

    #[test]
    fn finance_reply_with_metrics_gets_a_snapshot() {
        let turn = interpret_reply(
            AgentKind::Finance,
            reply("The stock price of Apple Inc. (AAPL) is **$195.32** right now."),
        );
        let snapshot = turn.financial.expect("snapshot");
        assert_eq!(snapshot.symbol.as_deref(), Some("AAPL"));
        assert_eq!(turn.agent_type, "finance");
    }

    #[test]
    fn finance_small_talk_stays_plain() {
        let turn = interpret_reply(
            AgentKind::Finance,
            reply("I can fetch quotes for any listed company. Which one interests you?"),
        );
        assert!(turn.financial.is_none());
    }

    #[test]
    fn non_finance_agents_never_get_snapshots() {
        let turn = interpret_reply(
            AgentKind::Support,
            reply("Your plan renews at $9.99, AAPL has nothing to do with it."),
        );
        assert!(turn.financial.is_none());
    }

    #[test]
    fn study_reply_structure_is_detected_with_sections() {
        let turn = interpret_reply(
            AgentKind::StudyBuddy,
            reply("## Week 1\n1. Ownership\n2. Borrowing\n\n## Week 2\n1. Lifetimes"),
        );
        assert!(turn.study_structured);
        assert_eq!(turn.study_sections, vec!["Week 1", "Week 2"]);
    }

    #[test]
    fn session_id_round_trips_per_agent() {
        let (_dir, db) = db::open_test_db();
        let conn = db.open_connection().expect("conn");

        assert!(stored_session_id(&conn, AgentKind::Finance)
            .expect("load")
            .is_none());
        remember_session_id(&conn, AgentKind::Finance, "sess-f").expect("save");
        remember_session_id(&conn, AgentKind::Support, "sess-s").expect("save");

        assert_eq!(
            stored_session_id(&conn, AgentKind::Finance).expect("load"),
            Some("sess-f".to_string())
        );
        assert_eq!(
            stored_session_id(&conn, AgentKind::Support).expect("load"),
            Some("sess-s".to_string())
        );
    }

    #[test]
    fn remember_overwrites_previous_session() {
        let (_dir, db) = db::open_test_db();
        let conn = db.open_connection().expect("conn");

        remember_session_id(&conn, AgentKind::Finance, "one").expect("save");
        remember_session_id(&conn, AgentKind::Finance, "two").expect("save");
        assert_eq!(
            stored_session_id(&conn, AgentKind::Finance).expect("load"),
            Some("two".to_string())
        );
    }

    #[test]
    fn clear_removes_only_that_agent() {
        let (_dir, db) = db::open_test_db();
        let conn = db.open_connection().expect("conn");

        remember_session_id(&conn, AgentKind::Finance, "sess-f").expect("save");
        remember_session_id(&conn, AgentKind::Sales, "sess-sl").expect("save");

        assert!(clear_session_id(&conn, AgentKind::Finance).expect("clear"));
        assert!(!clear_session_id(&conn, AgentKind::Finance).expect("again"));
        assert_eq!(
            stored_session_id(&conn, AgentKind::Sales).expect("load"),
            Some("sess-sl".to_string())
        );
    }
}
