use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path identifier, rejecting anything that is not a UUID.
pub fn valid_uuid(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::BadRequest("Invalid UUID format".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_uuid_identifiers() {
        assert!(valid_uuid("not-a-uuid").is_err());
        assert!(valid_uuid("6f1c1a2e-8f4b-4c1e-9a57-3b2d1f0e9c11").is_ok());
    }
}
