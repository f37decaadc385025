pub(crate) mod client;
pub(crate) mod oauth_callback;
pub(crate) mod paths;
pub(crate) mod types;
