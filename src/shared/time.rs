//! Usage: Clock helpers shared across storage and session code.

use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::now_unix_seconds;

    #[test]
    fn now_unix_seconds_is_past_2020() {
        assert!(now_unix_seconds() > 1_577_836_800);
    }
}
