use std::path::Path;

/// Returns the matched source extension (including the dot) when the
/// filename ends with one of the accepted extensions for a conversion
/// kind. The match is a case-sensitive suffix check: clients are
/// expected to send the extension exactly as the allow-list spells it.
pub fn matched_extension<'a>(filename: &str, accepted: &[&'a str]) -> Option<&'a str> {
    accepted.iter().find(|ext| filename.ends_with(**ext)).copied()
}

/// Sanitizes a client-supplied filename for use in a Content-Disposition
/// header. Strips any path components and replaces control or reserved
/// characters. The result is never used to build filesystem paths.
pub fn sanitize_filename(filename: &str) -> String {
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path-like upload filename: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == '/'
                || c == '\\'
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
                || c == ';'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    }
}

/// Derives the suggested download name by substituting the matched
/// source extension with the target one, e.g. `report.docx` -> `report.pdf`.
pub fn download_name(original: &str, source_ext: &str, target_ext: &str) -> String {
    let sanitized = sanitize_filename(original);
    let stem = sanitized
        .strip_suffix(source_ext)
        .unwrap_or(sanitized.as_str());
    let stem = if stem.is_empty() { "converted" } else { stem };
    format!("{}.{}", stem, target_ext)
}
