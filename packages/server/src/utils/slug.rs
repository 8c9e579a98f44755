/// Longest slug produced by [`slugify`], leaving room for a `-N` suffix.
pub const MAX_SLUG_BASE_LEN: usize = 100;

/// Turn a title into a URL slug: lowercase ASCII alphanumerics joined by `-`.
///
/// Characters outside ASCII are dropped, so a title without any ASCII
/// letters or digits yields an empty string.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_BASE_LEN {
            break;
        }
    }

    slug.truncate(MAX_SLUG_BASE_LEN);
    slug.trim_end_matches('-').to_string()
}

/// `base` for the first attempt, then `base-2`, `base-3`, ...
pub fn candidate(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}
