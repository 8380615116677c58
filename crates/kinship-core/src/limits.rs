//! Input limits and sanitisation for edge labels and query paging

/// Maximum length for a relationship label (50 chars)
pub const MAX_RELATIONSHIP_LEN: usize = 50;

/// Maximum rows returned by a single relationship query (1000)
pub const MAX_QUERY_LIMIT: usize = 1000;

/// Rows returned when the caller does not ask for a limit (10)
pub const DEFAULT_QUERY_LIMIT: usize = 10;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyRelationship,
    QueryLimitTooLarge { limit: usize, max: usize },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyRelationship => write!(f, "Relationship label cannot be empty"),
            Self::QueryLimitTooLarge { limit, max } => {
                write!(f, "Query limit too large: {} (max {})", limit, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn is_unsafe(c: char) -> bool {
    c.is_control() || matches!(c, '\'' | '"' | '\\' | ';' | '`')
}

/// Strip characters that are unsafe for the persistence layer from a label.
///
/// Control characters, quotes, backslashes, backticks and semicolons are
/// removed, surrounding whitespace is trimmed and the result is cut to
/// [`MAX_RELATIONSHIP_LEN`] characters.
pub fn sanitize_relationship(label: &str) -> String {
    let cleaned: String = label.chars().filter(|c| !is_unsafe(*c)).collect();
    let sanitized: String = cleaned.trim().chars().take(MAX_RELATIONSHIP_LEN).collect();

    if sanitized != label {
        tracing::debug!("Sanitized relationship label {:?} -> {:?}", label, sanitized);
    }
    sanitized
}

/// Sanitize a label for writing; empty labels are rejected
pub fn validate_relationship(label: &str) -> Result<String, ValidationError> {
    let sanitized = sanitize_relationship(label);
    if sanitized.is_empty() {
        return Err(ValidationError::EmptyRelationship);
    }
    Ok(sanitized)
}

/// Validate a query page size
pub fn validate_query_limit(limit: usize) -> Result<(), ValidationError> {
    if limit > MAX_QUERY_LIMIT {
        return Err(ValidationError::QueryLimitTooLarge {
            limit,
            max: MAX_QUERY_LIMIT,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_unsafe_chars() {
        assert_eq!(sanitize_relationship("member_of"), "member_of");
        assert_eq!(sanitize_relationship("friend'; DROP TABLE x"), "friend DROP TABLE x");
        assert_eq!(sanitize_relationship("  owns\n"), "owns");
        assert_eq!(sanitize_relationship("a\"b\\c`d"), "abcd");
    }

    #[test]
    fn test_sanitize_preserves_case() {
        assert_eq!(sanitize_relationship("Friend"), "Friend");
    }

    #[test]
    fn test_sanitize_truncates() {
        let long = "x".repeat(80);
        assert_eq!(sanitize_relationship(&long).len(), MAX_RELATIONSHIP_LEN);
    }

    #[test]
    fn test_validate_relationship() {
        assert_eq!(validate_relationship(" friend ").unwrap(), "friend");
        assert_eq!(validate_relationship(""), Err(ValidationError::EmptyRelationship));
        assert_eq!(validate_relationship("';"), Err(ValidationError::EmptyRelationship));
    }

    #[test]
    fn test_validate_query_limit() {
        assert!(validate_query_limit(10).is_ok());
        assert!(validate_query_limit(MAX_QUERY_LIMIT).is_ok());
        assert!(validate_query_limit(MAX_QUERY_LIMIT + 1).is_err());
    }
}
