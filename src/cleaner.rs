//! Best-effort HTML cleanup for post bodies.

use std::sync::LazyLock;

use regex::Regex;

/// Quoted-reply blocks (non-greedy, may span lines) and any remaining tag.
static MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<blockquote.*?</blockquote>|<[^>]+>").expect("invalid markup pattern")
});

/// Strip quoted-reply blocks and HTML tags from a post body, then trim.
///
/// Best-effort regex removal, not an HTML parser: unbalanced markup degrades
/// gracefully instead of erroring. Idempotent.
#[must_use]
pub fn clean_html(raw: &str) -> String {
    MARKUP.replace_all(raw, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_tags() {
        let raw = "<blockquote>quoted</blockquote>Hello <b>world</b>";
        assert_eq!(clean_html(raw), "Hello world");
    }

    #[test]
    fn quote_blocks_may_span_lines() {
        let raw = "<blockquote class=\"quote\">\nline one\nline two\n</blockquote>\n<p>reply</p>";
        assert_eq!(clean_html(raw), "reply");
    }

    #[test]
    fn unbalanced_markup_degrades_to_tag_removal() {
        assert_eq!(clean_html("<blockquote>orphan quote"), "orphan quote");
        assert_eq!(clean_html("<b>bold"), "bold");
    }

    #[test]
    fn cleaning_is_idempotent() {
        let once = clean_html("<blockquote>q</blockquote><p>Hello &amp; goodbye</p>");
        assert_eq!(clean_html(&once), once);
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(clean_html("  already clean  "), "already clean");
    }
}
