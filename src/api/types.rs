//! Usage: Response envelopes shared across backend endpoints.

use serde::{Deserialize, Serialize};

/// Django REST page envelope used by every list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Plain `{ "message": ... }` acknowledgements.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub message: String,
}
