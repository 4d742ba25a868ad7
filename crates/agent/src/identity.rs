//! Module identity generation.

use uuid::Uuid;

/// Build a module identifier from `prefix` and a random 8-hex-digit suffix.
#[must_use]
pub fn generate_module_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &suffix[..8])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_append_eight_hex_digits_to_prefix() {
        let id = generate_module_id("temperature-module");
        let suffix = id.strip_prefix("temperature-module-").unwrap();
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn should_generate_distinct_ids() {
        assert_ne!(generate_module_id("m"), generate_module_id("m"));
    }
}
