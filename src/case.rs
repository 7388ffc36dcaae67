//! Naming helpers for route path segments: entity name -> uncapitalized plural.

/// Lowercase the first character, keep the rest.
/// e.g. "OrderItem" -> "orderItem", "Widget" -> "widget"
pub fn uncapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English plural of a single identifier using the regular suffix rules.
/// e.g. "widget" -> "widgets", "category" -> "categories", "box" -> "boxes", "day" -> "days"
pub fn pluralize(s: &str) -> String {
    if s.is_empty() {
        return String::new();
    }
    let lower = s.to_lowercase();
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| lower.ends_with(suffix)) {
        return format!("{}es", s);
    }
    if lower.ends_with('y') {
        let before_y = lower.chars().rev().nth(1);
        if before_y.map(|c| !"aeiou".contains(c)).unwrap_or(false) {
            return format!("{}ies", &s[..s.len() - 1]);
        }
    }
    format!("{}s", s)
}

/// Default path segment for an entity: uncapitalized plural of its name.
pub fn default_path_segment(entity_name: &str) -> String {
    pluralize(&uncapitalize(entity_name))
}
