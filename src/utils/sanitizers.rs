//! String sanitization utilities for filenames and identifiers

/// Sanitize an identifier for use in directory names
///
/// Replaces filesystem-unsafe characters with underscores and limits length
/// to 50 characters. Preserves alphanumeric characters, hyphens,
/// underscores, and dots.
pub fn sanitize_for_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            ' ' => '_',
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' => c,
            _ => '_',
        })
        .collect::<String>()
        .chars()
        .take(50) // Limit length to avoid overly long directory names
        .collect()
}
