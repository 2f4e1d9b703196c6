//! Validation helpers for DTOs.

use uuid::Uuid;
use validator::ValidationError;

/// Validates that an entity reference is not the nil UUID.
///
/// `00000000-0000-0000-0000-000000000000` is what a client sends when a
/// selector was never filled in; it can never reference a stored entity,
/// so it is rejected before hitting the store.
pub fn validate_entity_ref(id: &Uuid) -> Result<(), ValidationError> {
    if id.is_nil() {
        let mut err = ValidationError::new("entity_ref_nil");
        err.message = Some("reference must be a non-nil UUID".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_entity_ref_valid() {
        assert!(validate_entity_ref(&Uuid::new_v4()).is_ok());
        assert!(validate_entity_ref(&Uuid::from_u128(1)).is_ok());
    }

    #[test]
    fn test_validate_entity_ref_nil() {
        assert!(validate_entity_ref(&Uuid::nil()).is_err());
    }
}
