use validator::ValidationError;
use zxcvbn::zxcvbn;

const MIN_LENGTH: usize = 10;
const MIN_STRENGTH_SCORE: u8 = 3;

fn password_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Strength gate for the bootstrap admin password.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_LENGTH {
        return Err(password_error(
            "password_length",
            format!("Must be at least {} characters", MIN_LENGTH),
        ));
    }

    let has_upper = password.chars().any(char::is_uppercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password.chars().any(|c| !c.is_alphanumeric());

    if !(has_upper && has_digit && has_symbol) {
        return Err(password_error(
            "password_complexity",
            "Must include uppercase, number, and symbol".to_string(),
        ));
    }

    let estimate = zxcvbn(password, &["admin", "ecosystem", "directory"]);
    if (estimate.score() as u8) < MIN_STRENGTH_SCORE {
        let feedback = estimate
            .feedback()
            .and_then(|f| f.warning().map(|w| w.to_string()))
            .unwrap_or_else(|| "Password is too weak".to_string());
        return Err(password_error("password_weak", feedback));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_and_simple_passwords() {
        assert!(validate_password_strength("Ab1!").is_err());
        assert!(validate_password_strength("alllowercase1!").is_err());
        assert!(validate_password_strength("Admin12345!").is_err());
    }

    #[test]
    fn accepts_strong_password() {
        assert!(validate_password_strength("Tr0ub4dour&Horse-Battery").is_ok());
    }
}
