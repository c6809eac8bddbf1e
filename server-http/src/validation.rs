use crate::error::ApiError;

/// Minimum query length after trimming, in characters (not bytes —
/// queries are routinely Cyrillic).
const MIN_QUERY_CHARS: usize = 3;

/// Trim the raw query parameter and enforce the minimum length.
///
/// No further normalization is applied: queries differing only in case
/// are distinct cache keys.
pub fn validate_query(raw: Option<&str>) -> Result<String, ApiError> {
    let trimmed = raw.unwrap_or_default().trim();
    if trimmed.chars().count() < MIN_QUERY_CHARS {
        return Err(ApiError::QueryTooShort);
    }
    Ok(trimmed.to_string())
}
