const SESSION_PREFIX: &str = "session:";

/// Key holding one login session as JSON.
pub fn session_key(session_id: &str) -> String {
    format!("{SESSION_PREFIX}{session_id}")
}
