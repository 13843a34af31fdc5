//! Query input validation shared by both endpoints.

pub const MIN_QUERY_CHARS: usize = 4;
pub const MAX_QUERY_CHARS: usize = 100;

/// Length-bound violation. The message is user-facing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidQuery {
    pub len: usize,
}

impl std::fmt::Display for InvalidQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Query length must be {MIN_QUERY_CHARS}-{MAX_QUERY_CHARS} chars"
        )
    }
}

impl std::error::Error for InvalidQuery {}

/// Trim and bounds-check a raw query. Returns the trimmed form; the service
/// never touches the query again after this point.
pub fn validate_query(raw: &str) -> Result<String, InvalidQuery> {
    let trimmed = raw.trim();
    let len = trimmed.chars().count();
    if !(MIN_QUERY_CHARS..=MAX_QUERY_CHARS).contains(&len) {
        return Err(InvalidQuery { len });
    }
    Ok(trimmed.to_string())
}
