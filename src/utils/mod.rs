/// Sanitize a file name component for safe filesystem usage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .trim()
        .chars()
        .map(|c| {
            match c {
                // Keep characters that can appear in video ids and language tags
                c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ',') => c,
                // Replace everything else, path separators included, with underscore
                _ => '_',
            }
        })
        .collect()
}
