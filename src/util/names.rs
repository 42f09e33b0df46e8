//! Name sanitizing for prim and file names.

/// Turn a user-visible name into a valid prim name.
///
/// Every character other than an ASCII letter, digit or underscore becomes an
/// underscore, so distinct names can collide. A leading digit gets an
/// underscore prefix.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 1);
    for (i, c) in name.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            out.push('_');
        }
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push('_');
        }
    }
    out
}

/// Check that a name is a valid prim name identifier.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize_name("Metal 01"), "Metal_01");
        assert_eq!(sanitize_name("Metal_01"), "Metal_01");
        assert_eq!(sanitize_name("rust-red"), "rust_red");
        assert_eq!(sanitize_name("2sided"), "_2sided");
        assert_eq!(sanitize_name(""), "");
    }

    #[test]
    fn test_punctuation_collides_with_spaces() {
        let names = ["Rust Red", "Rust-Red", "Rust.Red", "Rust\u{e9}Red"];
        assert!(names.iter().all(|n| sanitize_name(n) == "Rust_Red"));
    }

    #[test]
    fn test_identifier() {
        assert!(is_valid_identifier("Root"));
        assert!(is_valid_identifier("_x1"));
        assert!(!is_valid_identifier("1x"));
        assert!(!is_valid_identifier("a b"));
        assert!(!is_valid_identifier(""));
    }
}
