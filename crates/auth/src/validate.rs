//! Registration input validation
//!
//! Rejected before anything touches the store.

use crate::error::AuthError;

/// Validate a registration triple against a reserved (unregistrable)
/// username. Comparison with the reserved name is case-insensitive.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    reserved_username: &str,
) -> Result<(), AuthError> {
    validate_username(username, reserved_username)?;
    validate_email(email)?;
    validate_password(password)
}

fn validate_username(username: &str, reserved_username: &str) -> Result<(), AuthError> {
    if username.len() < 3 || username.len() > 20 {
        return Err(AuthError::InvalidUsername);
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AuthError::InvalidUsername);
    }
    if username.eq_ignore_ascii_case(reserved_username) {
        return Err(AuthError::ReservedUsername);
    }
    Ok(())
}

/// A plausible `local@domain.tld` shape; not a full RFC parser.
fn validate_email(email: &str) -> Result<(), AuthError> {
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::InvalidEmail);
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return Err(AuthError::InvalidEmail);
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(AuthError::InvalidEmail);
    };
    if host.is_empty() || tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(AuthError::InvalidEmail);
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < 8 {
        return Err(AuthError::WeakPassword);
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESERVED: &str = "MiniBank";

    #[test]
    fn accepts_a_normal_registration() {
        assert!(validate_registration("alice_92", "alice@example.com", "sup3rsecret", RESERVED).is_ok());
    }

    #[test]
    fn username_rules() {
        assert!(matches!(
            validate_registration("al", "a@b.co", "sup3rsecret", RESERVED),
            Err(AuthError::InvalidUsername)
        ));
        assert!(matches!(
            validate_registration("a".repeat(21).as_str(), "a@b.co", "sup3rsecret", RESERVED),
            Err(AuthError::InvalidUsername)
        ));
        assert!(matches!(
            validate_registration("bad name", "a@b.co", "sup3rsecret", RESERVED),
            Err(AuthError::InvalidUsername)
        ));
    }

    #[test]
    fn reserved_username_rejected_in_any_casing() {
        for name in ["MiniBank", "minibank", "MINIBANK"] {
            assert!(matches!(
                validate_registration(name, "a@b.co", "sup3rsecret", RESERVED),
                Err(AuthError::ReservedUsername)
            ));
        }
    }

    #[test]
    fn email_rules() {
        for bad in ["nope", "a@", "@b.co", "a@b", "a b@c.co", "a@b.c", "a@b.c0"] {
            assert!(
                matches!(
                    validate_registration("alice", bad, "sup3rsecret", RESERVED),
                    Err(AuthError::InvalidEmail)
                ),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn password_rules() {
        for bad in ["short1", "allletters", "12345678"] {
            assert!(matches!(
                validate_registration("alice", "a@b.co", bad, RESERVED),
                Err(AuthError::WeakPassword)
            ));
        }
    }
}
