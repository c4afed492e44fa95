/// Lowercase ASCII slug for file names. Falls back to `comic` when nothing
/// usable is left.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
        if slug.len() >= 60 {
            break;
        }
    }
    if slug.is_empty() {
        "comic".to_string()
    } else {
        slug
    }
}
