use std::collections::HashSet;

/// Convert a name to a URL-friendly slug (lowercase ASCII, single hyphens, no edge hyphens).
pub fn slugify(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_separator = false;

    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_separator = false;
        } else if !last_was_separator && !result.is_empty() {
            result.push('-');
            last_was_separator = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }

    result
}

/// 產生全域唯一的 slug；純數字名稱加上 `-slug` 後綴
pub fn unique_slug(name: &str, existing: &HashSet<String>) -> String {
    let trimmed = name.trim();
    let base = if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        slugify(&format!("{}-slug", trimmed))
    } else {
        slugify(trimmed)
    };

    if !existing.contains(&base) {
        return base;
    }

    let mut counter = 1;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !existing.contains(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
