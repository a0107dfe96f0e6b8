use std::sync::OnceLock;

use regex::Regex;

/// Namespace segment that holds every headline record.
pub const FEED_PREFIX: &str = "/feed";

/// Directory for static image assets, kept apart from [`FEED_PREFIX`].
pub const IMAGES_PREFIX: &str = "/images";

fn separator_runs() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("static pattern"))
}

/// Lowercase, trim, then collapse every run of `[^a-z0-9]` into one `-`.
///
/// Titles made only of punctuation degrade to `-` (or an empty slug); such
/// headlines share a key with any other headline that has the same timestamp.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    separator_runs()
        .replace_all(lowered.trim(), "-")
        .into_owned()
}

/// Storage key for a headline, stable across polls and runs.
pub fn derive_key(prefix: &str, published: &str, title: &str) -> String {
    let slug = slugify(&format!("{} {}", published, title));
    format!("{}/{}", prefix, slug)
}

/// Well-known key of the logo published at startup.
pub fn logo_key(name: &str) -> String {
    format!("{}/{}.svg", IMAGES_PREFIX, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let a = derive_key(FEED_PREFIX, "1700000000000", "Breaking: Big News!");
        let b = derive_key(FEED_PREFIX, "1700000000000", "Breaking: Big News!");
        assert_eq!(a, b);
    }

    #[test]
    fn test_punctuation_collapses_to_single_hyphen() {
        let key = derive_key(FEED_PREFIX, "1700000000000", "Breaking: Big News!");
        assert_eq!(key, "/feed/1700000000000-breaking-big-news-");
    }

    #[test]
    fn test_outer_whitespace_is_trimmed_before_collapse() {
        assert_eq!(slugify("  Hello   World  "), "hello-world");
    }

    #[test]
    fn test_non_ascii_is_treated_as_separator() {
        assert_eq!(slugify("Café — Ünïcode"), "caf-n-code");
    }

    #[test]
    fn test_degenerate_title_is_kept() {
        assert_eq!(slugify("?!"), "-");
        assert_eq!(derive_key(FEED_PREFIX, "", "?!"), "/feed/-");
    }

    #[test]
    fn test_identical_pairs_collide() {
        assert_eq!(
            derive_key(FEED_PREFIX, "1000", "Hello World"),
            derive_key(FEED_PREFIX, "1000", "hello, world")
        );
    }

    #[test]
    fn test_logo_key() {
        assert_eq!(logo_key("news"), "/images/news.svg");
    }
}
