use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardRejection {
    #[error("non-select")]
    NonSelect,
}

/// Accepts a statement only when, trimmed and upper-cased, it starts with
/// `SELECT`. This is a prefix gate, not a parser; the store adds a read-only
/// transaction on top of it.
pub fn validate(candidate_sql: &str) -> Result<(), GuardRejection> {
    if candidate_sql.trim().to_uppercase().starts_with("SELECT") {
        Ok(())
    } else {
        Err(GuardRejection::NonSelect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_statements_pass() {
        assert_eq!(validate("SELECT * FROM users"), Ok(()));
        assert_eq!(validate("  select id from x"), Ok(()));
        assert_eq!(validate("\n\tSeLeCt 1"), Ok(()));
    }

    #[test]
    fn writes_are_rejected() {
        assert_eq!(validate("DELETE FROM users"), Err(GuardRejection::NonSelect));
        assert_eq!(validate("UPDATE x SET y=1"), Err(GuardRejection::NonSelect));
        assert_eq!(
            validate("INSERT INTO users VALUES (1)"),
            Err(GuardRejection::NonSelect)
        );
        assert_eq!(validate(""), Err(GuardRejection::NonSelect));
    }

    #[test]
    fn rejection_reason_is_non_select() {
        assert_eq!(GuardRejection::NonSelect.to_string(), "non-select");
    }
}
