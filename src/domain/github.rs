//! Usage: GitHub repository types and payload validation for the proxying backend.

use crate::api::client::QueryPairs;
use crate::shared::error::AppResult;
use serde::{Deserialize, Serialize};

const MAX_REPOSITORY_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubOwner {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepository {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub default_branch: String,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub pushed_at: String,
    #[serde(default)]
    pub owner: GitHubOwner,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubBranch {
    pub name: String,
    #[serde(default)]
    pub protected: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubCommitDetails {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub author: GitHubCommitAuthor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GitHubCommitAuthor {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCommit {
    pub sha: String,
    #[serde(default)]
    pub commit: GitHubCommitDetails,
    #[serde(default)]
    pub html_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubCollaborator {
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub role_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubContentEntry {
    pub name: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "type", default)]
    pub entry_type: String,
    #[serde(default)]
    pub size: u64,
}

// Wrappers the backend proxy puts around raw GitHub responses.

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RepositoriesBody {
    #[serde(default)]
    pub(crate) repositories: Vec<GitHubRepository>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct BranchesBody {
    #[serde(default)]
    pub(crate) branches: Vec<GitHubBranch>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommitsBody {
    #[serde(default)]
    pub(crate) commits: Vec<GitHubCommit>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CollaboratorsBody {
    #[serde(default)]
    pub(crate) collaborators: Vec<GitHubCollaborator>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContentsBody {
    #[serde(default)]
    pub(crate) contents: Vec<GitHubContentEntry>,
}

const REPO_SORT_VALUES: [&str; 4] = ["created", "updated", "pushed", "full_name"];
const REPO_TYPE_VALUES: [&str; 5] = ["all", "owner", "public", "private", "member"];

#[derive(Debug, Clone, Default)]
pub(crate) struct RepoListQuery {
    pub(crate) sort: Option<String>,
    pub(crate) type_filter: Option<String>,
    pub(crate) per_page: Option<u32>,
}

impl RepoListQuery {
    pub(crate) fn to_query(&self) -> AppResult<QueryPairs> {
        let mut query = QueryPairs::new();

        if let Some(sort) = self.sort.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            if !REPO_SORT_VALUES.contains(&sort) {
                return Err(
                    "SEC_INVALID_INPUT: sort must be created|updated|pushed|full_name".into(),
                );
            }
            query.push(("sort", sort.to_string()));
        }
        if let Some(type_filter) = self
            .type_filter
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            if !REPO_TYPE_VALUES.contains(&type_filter) {
                return Err(
                    "SEC_INVALID_INPUT: type must be all|owner|public|private|member".into(),
                );
            }
            query.push(("type", type_filter.to_string()));
        }
        if let Some(per_page) = self.per_page {
            if per_page == 0 || per_page > 100 {
                return Err("SEC_INVALID_INPUT: per_page must be within [1, 100]".into());
            }
            query.push(("per_page", per_page.to_string()));
        }
        Ok(query)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub auto_init: bool,
    #[serde(default)]
    pub gitignore_template: String,
    #[serde(default)]
    pub license_template: String,
}

pub(crate) fn validate_repository_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("SEC_INVALID_INPUT: repository name is required".into());
    }
    if name.len() > MAX_REPOSITORY_NAME_LEN {
        return Err(format!(
            "SEC_INVALID_INPUT: repository name must be <= {MAX_REPOSITORY_NAME_LEN} chars"
        )
        .into());
    }
    if !name
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' || ch == '.')
    {
        return Err(
            "SEC_INVALID_INPUT: repository name may only contain letters, digits, '-', '_' and '.'"
                .into(),
        );
    }
    if name.chars().all(|ch| ch == '.') {
        return Err("SEC_INVALID_INPUT: repository name may not be only dots".into());
    }
    Ok(name.to_string())
}

impl RepositoryCreate {
    pub(crate) fn to_body(&self) -> AppResult<serde_json::Value> {
        let name = validate_repository_name(&self.name)?;

        let mut object = serde_json::Map::new();
        object.insert("name".into(), name.into());
        object.insert("private".into(), self.private.into());
        object.insert("auto_init".into(), self.auto_init.into());
        let description = self.description.trim();
        if !description.is_empty() {
            object.insert("description".into(), description.into());
        }
        let gitignore = self.gitignore_template.trim();
        if !gitignore.is_empty() {
            object.insert("gitignore_template".into(), gitignore.into());
        }
        let license = self.license_template.trim();
        if !license.is_empty() {
            object.insert("license_template".into(), license.into());
        }
        Ok(serde_json::Value::Object(object))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryUpdate {
    pub description: Option<String>,
    pub private: Option<bool>,
    pub default_branch: Option<String>,
}

impl RepositoryUpdate {
    pub(crate) fn to_body(&self) -> AppResult<serde_json::Value> {
        let mut object = serde_json::Map::new();
        if let Some(description) = self.description.as_deref() {
            object.insert("description".into(), description.trim().into());
        }
        if let Some(private) = self.private {
            object.insert("private".into(), private.into());
        }
        if let Some(branch) = self
            .default_branch
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            object.insert("default_branch".into(), branch.into());
        }
        if object.is_empty() {
            return Err("SEC_INVALID_INPUT: repository update has no fields to change".into());
        }
        Ok(serde_json::Value::Object(object))
    }
}

pub(crate) fn validate_path_segment(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(format!("SEC_INVALID_INPUT: {field} is required").into());
    }
    if value.contains('/') || value.contains(char::is_whitespace) {
        return Err(format!("SEC_INVALID_INPUT: {field} contains invalid characters").into());
    }
    Ok(value.to_string())
}

/// The repositories page filters locally on name/description while typing.
pub(crate) fn search_repositories(
    repositories: Vec<GitHubRepository>,
    term: &str,
) -> Vec<GitHubRepository> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return repositories;
    }
    repositories
        .into_iter()
        .filter(|repo| {
            repo.name.to_lowercase().contains(&term)
                || repo
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&term))
                    .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, description: Option<&str>) -> GitHubRepository {
        GitHubRepository {
            id: 1,
            name: name.to_string(),
            full_name: format!("acme/{name}"),
            description: description.map(str::to_string),
            private: false,
            html_url: String::new(),
            default_branch: "main".to_string(),
            language: None,
            stargazers_count: 0,
            forks_count: 0,
            open_issues_count: 0,
            created_at: String::new(),
            updated_at: String::new(),
            pushed_at: String::new(),
            owner: GitHubOwner::default(),
        }
    }

    #[test]
    fn repository_name_accepts_common_shapes() {
        assert_eq!(validate_repository_name(" widgets ").unwrap(), "widgets");
        assert!(validate_repository_name("my-repo_v2.1").is_ok());
        assert!(validate_repository_name(".github").is_ok());
    }

    #[test]
    fn repository_name_rejects_bad_input() {
        assert!(validate_repository_name("").is_err());
        assert!(validate_repository_name("has space").is_err());
        assert!(validate_repository_name("slash/name").is_err());
        assert!(validate_repository_name("..").is_err());
        assert!(validate_repository_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn create_body_skips_empty_optional_fields() {
        let payload = RepositoryCreate {
            name: "widgets".to_string(),
            description: String::new(),
            private: true,
            auto_init: false,
            gitignore_template: "Rust".to_string(),
            license_template: String::new(),
        };
        let body = payload.to_body().expect("body");
        assert_eq!(body["name"], "widgets");
        assert_eq!(body["private"], true);
        assert_eq!(body["gitignore_template"], "Rust");
        assert!(body.get("description").is_none());
        assert!(body.get("license_template").is_none());
    }

    #[test]
    fn update_body_requires_at_least_one_field() {
        assert!(RepositoryUpdate::default().to_body().is_err());
        let body = RepositoryUpdate {
            private: Some(true),
            ..RepositoryUpdate::default()
        }
        .to_body()
        .expect("body");
        assert_eq!(body["private"], true);
    }

    #[test]
    fn list_query_validates_enum_values() {
        assert!(RepoListQuery {
            sort: Some("updated".to_string()),
            type_filter: Some("owner".to_string()),
            per_page: Some(50),
        }
        .to_query()
        .is_ok());
        assert!(RepoListQuery {
            sort: Some("stars".to_string()),
            ..RepoListQuery::default()
        }
        .to_query()
        .is_err());
        assert!(RepoListQuery {
            per_page: Some(0),
            ..RepoListQuery::default()
        }
        .to_query()
        .is_err());
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() {
        let repos = vec![
            repo("widgets", Some("A widget factory")),
            repo("gadgets", None),
            repo("tools", Some("Widget-adjacent utilities")),
        ];
        let hits = search_repositories(repos, "WIDGET");
        let names: Vec<&str> = hits.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["widgets", "tools"]);
    }

    #[test]
    fn blank_search_returns_everything() {
        let repos = vec![repo("widgets", None), repo("gadgets", None)];
        assert_eq!(search_repositories(repos, "  ").len(), 2);
    }

    #[test]
    fn path_segment_validation_blocks_traversal() {
        assert!(validate_path_segment("octocat", "owner").is_ok());
        assert!(validate_path_segment("a/b", "owner").is_err());
        assert!(validate_path_segment("", "owner").is_err());
    }
}
