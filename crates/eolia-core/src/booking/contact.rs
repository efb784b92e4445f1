//! Contact detail checks and French phone formatting.

fn digits(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// National form `0XXXXXXXXX` of a French number, if `phone` is one.
fn national_digits(phone: &str) -> Option<String> {
    let cleaned = digits(phone);
    match cleaned.len() {
        10 if cleaned.starts_with('0') => Some(cleaned),
        11 if cleaned.starts_with("33") => Some(format!("0{}", &cleaned[2..])),
        _ => None,
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Some dot must have at least one character on each side
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// `0XXXXXXXXX` or `33XXXXXXXXX` once every non-digit is removed.
pub fn is_valid_french_phone(phone: &str) -> bool {
    national_digits(phone).is_some()
}

/// Display form `06 12 34 56 78`. Numbers that are not French come back unchanged.
pub fn format_phone_number(phone: &str) -> String {
    match national_digits(phone) {
        Some(national) => national
            .as_bytes()
            .chunks(2)
            .map(|pair| String::from_utf8_lossy(pair).into_owned())
            .collect::<Vec<_>>()
            .join(" "),
        None => phone.to_string(),
    }
}

/// E.164 form `+33612345678` for SMS delivery. Numbers that are not French come back
/// unchanged.
pub fn to_e164(phone: &str) -> String {
    match national_digits(phone) {
        Some(national) => format!("+33{}", &national[1..]),
        None => phone.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email() {
        assert!(is_valid_email("marie@email.com"));
        assert!(is_valid_email("a.b+tag@sub.domain.fr"));
        assert!(!is_valid_email("marie@email"));
        assert!(!is_valid_email("marie@.com"));
        assert!(!is_valid_email("marie@email."));
        assert!(!is_valid_email("@email.com"));
        assert!(!is_valid_email("marie dupont@email.com"));
        assert!(!is_valid_email("marie@@email.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_french_phone() {
        assert!(is_valid_french_phone("0612345678"));
        assert!(is_valid_french_phone("06 12 34 56 78"));
        assert!(is_valid_french_phone("06.12.34.56.78"));
        assert!(is_valid_french_phone("+33 6 12 34 56 78"));
        assert!(!is_valid_french_phone("612345678"));
        assert!(!is_valid_french_phone("+44 20 7946 0958"));
        assert!(!is_valid_french_phone(""));
    }

    #[test]
    fn test_format_phone_number() {
        assert_eq!(format_phone_number("0612345678"), "06 12 34 56 78");
        assert_eq!(format_phone_number("+33612345678"), "06 12 34 56 78");
        assert_eq!(format_phone_number("12345"), "12345");
    }

    #[test]
    fn test_to_e164() {
        assert_eq!(to_e164("06 12 34 56 78"), "+33612345678");
        assert_eq!(to_e164("+33 6 12 34 56 78"), "+33612345678");
        assert_eq!(to_e164("12345"), "12345");
    }
}
