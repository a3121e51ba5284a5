//! Place-name normalization shared by exact matching and name lookups

/// Trim whitespace, strip `*` markers at either end, and case-fold.
///
/// `"  Perumon* "` and `"*PERUMON"` both normalize to `"perumon"`.
pub fn normalize_name(raw: &str) -> String {
    raw.trim()
        .trim_matches('*')
        .trim()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name_strips_markers_and_case() {
        assert_eq!(normalize_name("Perumon*"), "perumon");
        assert_eq!(normalize_name("  *Kundara  "), "kundara");
        assert_eq!(normalize_name("EAST KALLADA"), "east kallada");
    }

    #[test]
    fn test_normalize_name_keeps_inner_text() {
        assert_eq!(normalize_name("Thrikkaruva * West"), "thrikkaruva * west");
        assert_eq!(normalize_name("***"), "");
    }
}
