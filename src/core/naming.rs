/// Convert a Rust-style field name to its column name.
///
/// `UpdatedAt` -> `updated_at`, `UserID` -> `user_id`, `HTTPServer` -> `http_server`.
/// Names that are already snake case pass through unchanged.
pub fn to_db_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                    out.push('_');
                }
            }
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_db_name() {
        assert_eq!(to_db_name("Name"), "name");
        assert_eq!(to_db_name("UpdatedAt"), "updated_at");
        assert_eq!(to_db_name("ID"), "id");
        assert_eq!(to_db_name("UserID"), "user_id");
        assert_eq!(to_db_name("HTTPServer"), "http_server");
        assert_eq!(to_db_name("created_at"), "created_at");
    }
}
