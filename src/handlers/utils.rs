// handlers/utils.rs - Helpers shared by record handlers

use crate::error::ApiError;

/// Parse a numeric path id, answering 400 in the API envelope on failure.
pub fn parse_id(raw: &str, name: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(format!("{} must be a positive integer", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_ids_only() {
        assert_eq!(parse_id("42", "pet_id").unwrap(), 42);
        for raw in ["", "abc", "0", "-3", "1.5"] {
            assert!(parse_id(raw, "pet_id").is_err(), "accepted {:?}", raw);
        }
    }
}
