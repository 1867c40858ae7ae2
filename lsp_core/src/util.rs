pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

// Only find direct import match
pub fn naive_resolve_fqn(name: &str, imports: &[String]) -> Option<String> {
    if let Some(import) = imports.iter().find(|i| i.split('.').last() == Some(name)) {
        return Some(import.clone());
    }

    None
}

/// Strips groovydoc/javadoc comment signifiers (`/**`, `*/`, leading `*`) and
/// single-line `//` markers so hover text shows prose only.
pub fn strip_comment_signifiers(raw: &str) -> String {
    raw.lines()
        .map(|line| {
            let trimmed = line.trim();
            let trimmed = trimmed
                .strip_prefix("/**")
                .or_else(|| trimmed.strip_prefix("/*"))
                .unwrap_or(trimmed);
            let trimmed = trimmed.strip_suffix("*/").unwrap_or(trimmed);
            let trimmed = trimmed.trim().strip_prefix('*').unwrap_or(trimmed.trim());
            let trimmed = trimmed.strip_prefix("//").unwrap_or(trimmed);
            trimmed.trim().to_string()
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
