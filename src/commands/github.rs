//! Usage: GitHub repository manager Tauri commands (proxied through the backend).

use crate::api::paths;
use crate::api::types::MessageBody;
use crate::app_state::{DbInitState, SessionState};
use crate::commands::api_context;
use crate::domain::github::{
    self, BranchesBody, CollaboratorsBody, CommitsBody, ContentsBody, GitHubBranch,
    GitHubCollaborator, GitHubCommit, GitHubContentEntry, GitHubRepository, RepoListQuery,
    RepositoriesBody, RepositoryCreate, RepositoryUpdate,
};
use crate::domain::integrations::{IntegrationStatus, PROVIDER_GITHUB};
use crate::shared::error::AppResult;

fn repo_segments(owner: &str, repo: &str) -> AppResult<(String, String)> {
    Ok((
        github::validate_path_segment(owner, "owner")?,
        github::validate_path_segment(repo, "repo")?,
    ))
}

/// The repositories view is gated on a connected GitHub integration.
#[tauri::command]
pub(crate) async fn github_connection_check(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
) -> Result<bool, String> {
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let integrations: Vec<crate::domain::integrations::Integration> = client
        .get(&handle, paths::INTEGRATIONS, Vec::new())
        .await
        .map_err(String::from)?;
    Ok(integrations.iter().any(|integration| {
        integration.provider == PROVIDER_GITHUB
            && integration.status == IntegrationStatus::Connected
    }))
}

#[tauri::command]
pub(crate) async fn github_repositories_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    sort: Option<String>,
    type_filter: Option<String>,
    per_page: Option<u32>,
    search: Option<String>,
) -> Result<Vec<GitHubRepository>, String> {
    let query = RepoListQuery {
        sort,
        type_filter,
        per_page,
    }
    .to_query()
    .map_err(String::from)?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: RepositoriesBody = client
        .get(&handle, paths::GITHUB_REPOSITORIES, query)
        .await
        .map_err(String::from)?;

    Ok(match search.as_deref() {
        Some(term) => github::search_repositories(body.repositories, term),
        None => body.repositories,
    })
}

#[tauri::command]
#[allow(clippy::too_many_arguments)]
pub(crate) async fn github_repository_create(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    name: String,
    description: Option<String>,
    private: Option<bool>,
    auto_init: Option<bool>,
    gitignore_template: Option<String>,
    license_template: Option<String>,
) -> Result<GitHubRepository, String> {
    let payload = RepositoryCreate {
        name,
        description: description.unwrap_or_default(),
        // New repositories default to private, like the web form.
        private: private.unwrap_or(true),
        auto_init: auto_init.unwrap_or(false),
        gitignore_template: gitignore_template.unwrap_or_default(),
        license_template: license_template.unwrap_or_default(),
    };
    let body = payload.to_body().map_err(String::from)?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .post(&handle, paths::GITHUB_REPOSITORY_CREATE, body)
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn github_repository_get(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    owner: String,
    repo: String,
) -> Result<GitHubRepository, String> {
    let (owner, repo) = repo_segments(&owner, &repo)?;
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .get(&handle, &paths::github_repository(&owner, &repo), Vec::new())
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn github_repository_update(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    owner: String,
    repo: String,
    description: Option<String>,
    private: Option<bool>,
    default_branch: Option<String>,
) -> Result<GitHubRepository, String> {
    let (owner, repo) = repo_segments(&owner, &repo)?;
    let body = RepositoryUpdate {
        description,
        private,
        default_branch,
    }
    .to_body()
    .map_err(String::from)?;

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    client
        .patch(&handle, &paths::github_repository_update(&owner, &repo), body)
        .await
        .map_err(Into::into)
}

#[tauri::command]
pub(crate) async fn github_repository_delete(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    owner: String,
    repo: String,
) -> Result<String, String> {
    let (owner, repo) = repo_segments(&owner, &repo)?;
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: MessageBody = client
        .delete(&handle, &paths::github_repository_delete(&owner, &repo))
        .await
        .map_err(String::from)?;
    Ok(body.message)
}

#[tauri::command]
pub(crate) async fn github_repository_branches_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    owner: String,
    repo: String,
) -> Result<Vec<GitHubBranch>, String> {
    let (owner, repo) = repo_segments(&owner, &repo)?;
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: BranchesBody = client
        .get(
            &handle,
            &paths::github_repository_branches(&owner, &repo),
            Vec::new(),
        )
        .await
        .map_err(String::from)?;
    Ok(body.branches)
}

#[tauri::command]
pub(crate) async fn github_repository_commits_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    owner: String,
    repo: String,
    per_page: Option<u32>,
) -> Result<Vec<GitHubCommit>, String> {
    let (owner, repo) = repo_segments(&owner, &repo)?;
    let mut query = Vec::new();
    if let Some(per_page) = per_page {
        if per_page == 0 || per_page > 100 {
            return Err("SEC_INVALID_INPUT: per_page must be within [1, 100]".to_string());
        }
        query.push(("per_page", per_page.to_string()));
    }

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: CommitsBody = client
        .get(&handle, &paths::github_repository_commits(&owner, &repo), query)
        .await
        .map_err(String::from)?;
    Ok(body.commits)
}

#[tauri::command]
pub(crate) async fn github_repository_collaborators_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    owner: String,
    repo: String,
) -> Result<Vec<GitHubCollaborator>, String> {
    let (owner, repo) = repo_segments(&owner, &repo)?;
    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: CollaboratorsBody = client
        .get(
            &handle,
            &paths::github_repository_collaborators(&owner, &repo),
            Vec::new(),
        )
        .await
        .map_err(String::from)?;
    Ok(body.collaborators)
}

#[tauri::command]
pub(crate) async fn github_collaborator_add(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    owner: String,
    repo: String,
    username: String,
    permission: Option<String>,
) -> Result<String, String> {
    let (owner, repo) = repo_segments(&owner, &repo)?;
    let username = github::validate_path_segment(&username, "username")?;

    let mut body = serde_json::Map::new();
    if let Some(permission) = permission.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        body.insert("permission".into(), permission.into());
    }

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let response: MessageBody = client
        .post(
            &handle,
            &paths::github_repository_collaborator(&owner, &repo, &username),
            serde_json::Value::Object(body),
        )
        .await
        .map_err(String::from)?;
    Ok(response.message)
}

#[tauri::command]
pub(crate) async fn github_repository_contents_list(
    app: tauri::AppHandle,
    db_state: tauri::State<'_, DbInitState>,
    session_state: tauri::State<'_, SessionState>,
    owner: String,
    repo: String,
    path: Option<String>,
) -> Result<Vec<GitHubContentEntry>, String> {
    let (owner, repo) = repo_segments(&owner, &repo)?;
    let mut query = Vec::new();
    if let Some(path) = path.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        query.push(("path", path.to_string()));
    }

    let (client, handle) = api_context(&app, db_state.inner(), session_state.inner()).await?;
    let body: ContentsBody = client
        .get(&handle, &paths::github_repository_contents(&owner, &repo), query)
        .await
        .map_err(String::from)?;
    Ok(body.contents)
}
