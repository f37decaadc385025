//! Usage: Backend endpoint paths, mirrored from the Integrato REST API.

pub(crate) const AUTH_REGISTER: &str = "/auth/register/";
pub(crate) const AUTH_LOGIN: &str = "/auth/login/";
pub(crate) const AUTH_LOGOUT: &str = "/auth/logout/";
pub(crate) const AUTH_USER: &str = "/auth/user/";
pub(crate) const AUTH_TOKEN_REFRESH: &str = "/auth/token/refresh/";
pub(crate) const AUTH_CHANGE_PASSWORD: &str = "/auth/change-password/";
pub(crate) const AUTH_PASSWORD_RESET: &str = "/auth/password-reset/";

pub(crate) fn auth_password_reset_confirm(uidb64: &str, token: &str) -> String {
    format!("/auth/password-reset-confirm/{uidb64}/{token}/")
}

pub(crate) const INTEGRATIONS: &str = "/integrations/";
pub(crate) const INTEGRATIONS_STATS: &str = "/integrations/stats/";
pub(crate) const INTEGRATIONS_PROVIDERS: &str = "/integrations/providers/";
pub(crate) const OAUTH_INITIATE: &str = "/integrations/oauth/initiate/";
pub(crate) const OAUTH_CALLBACK: &str = "/integrations/oauth/callback/";

pub(crate) fn integration_disconnect(integration_id: i64) -> String {
    format!("/integrations/{integration_id}/disconnect/")
}

pub(crate) fn integration_delete(integration_id: i64) -> String {
    format!("/integrations/{integration_id}/delete/")
}

pub(crate) fn integration_sync(integration_id: i64) -> String {
    format!("/integrations/{integration_id}/sync/")
}

pub(crate) const CALENDAR_EVENTS: &str = "/integrations/events/";

pub(crate) fn calendar_event(event_id: i64) -> String {
    format!("/integrations/events/{event_id}/")
}

pub(crate) const EMAIL_MESSAGES: &str = "/integrations/emails/";

pub(crate) fn email_message(message_id: i64) -> String {
    format!("/integrations/emails/{message_id}/")
}

pub(crate) const SYNC_LOGS: &str = "/integrations/sync-logs/";

pub(crate) const GITHUB_REPOSITORIES: &str = "/integrations/github/repositories/";
pub(crate) const GITHUB_REPOSITORY_CREATE: &str = "/integrations/github/repositories/create/";

pub(crate) fn github_repository(owner: &str, repo: &str) -> String {
    format!("/integrations/github/repositories/{owner}/{repo}/")
}

pub(crate) fn github_repository_update(owner: &str, repo: &str) -> String {
    format!("/integrations/github/repositories/{owner}/{repo}/update/")
}

pub(crate) fn github_repository_delete(owner: &str, repo: &str) -> String {
    format!("/integrations/github/repositories/{owner}/{repo}/delete/")
}

pub(crate) fn github_repository_branches(owner: &str, repo: &str) -> String {
    format!("/integrations/github/repositories/{owner}/{repo}/branches/")
}

pub(crate) fn github_repository_commits(owner: &str, repo: &str) -> String {
    format!("/integrations/github/repositories/{owner}/{repo}/commits/")
}

pub(crate) fn github_repository_collaborators(owner: &str, repo: &str) -> String {
    format!("/integrations/github/repositories/{owner}/{repo}/collaborators/")
}

pub(crate) fn github_repository_collaborator(owner: &str, repo: &str, username: &str) -> String {
    format!("/integrations/github/repositories/{owner}/{repo}/collaborators/{username}/")
}

pub(crate) fn github_repository_contents(owner: &str, repo: &str) -> String {
    format!("/integrations/github/repositories/{owner}/{repo}/contents/")
}

pub(crate) const AGENTS_CHAT: &str = "/agents/chat/";
pub(crate) const CHATBOT: &str = "/chatbot/";

pub(crate) const USERS_PROFILE: &str = "/users/profile/";
pub(crate) const USERS_VERIFY_EMAIL: &str = "/users/verify-email/";
pub(crate) const USERS_RESEND_VERIFICATION: &str = "/users/resend-verification/";
