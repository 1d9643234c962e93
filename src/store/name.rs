use crate::error::{Error, Result};

/// Folder names are stored exactly as given; only the empty name is refused.
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::BadRequest("Folder name cannot be empty".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name_accepts_any_label() {
        assert!(validate_name("Outdoors").is_ok());
        assert!(validate_name("  Rock Climbing ").is_ok());
        assert!(validate_name("Line1\nLine2").is_ok());
        assert!(validate_name("Ausrüstung/2024").is_ok());
        assert!(validate_name(&"x".repeat(1024)).is_ok());
    }

    #[test]
    fn test_validate_name_empty_error() {
        assert!(matches!(validate_name(""), Err(Error::BadRequest(_))));
    }
}
