//! Tokenizer for raw HTML fragments embedded in markdown.
//!
//! This is not a full HTML parser. It recognizes start tags, end tags,
//! comments and the text between them, which is all the composer dialect
//! needs to lift embeds like `<video>` into the element tree.

use std::sync::LazyLock;

use regex_lite::Regex;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)<!--.*?-->|<(/?)([A-Za-z][A-Za-z0-9\-]*)((?:\s+[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .expect("valid html tag pattern")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("valid html attribute pattern")
});

/// Elements that never have children
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// One lexical HTML token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HtmlToken {
    /// `<tag attr="v">`, `self_closing` for `<tag/>` and void elements
    Open {
        /// Lowercase tag name
        tag: String,
        /// Decoded attributes in source order
        attrs: Vec<(String, String)>,
        /// No matching close tag follows
        self_closing: bool,
    },
    /// `</tag>`
    Close {
        /// Lowercase tag name
        tag: String,
    },
    /// Entity-decoded text
    Text(String),
}

/// Split an HTML fragment into tokens. Comments are discarded.
pub fn tokenize(input: &str) -> Vec<HtmlToken> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in TAG.captures_iter(input) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        push_text(&mut tokens, &input[last..whole.start()]);
        last = whole.end();

        let Some(name) = caps.get(2) else {
            // comment
            continue;
        };
        let tag = name.as_str().to_ascii_lowercase();

        if caps.get(1).is_some_and(|m| !m.as_str().is_empty()) {
            tokens.push(HtmlToken::Close { tag });
            continue;
        }

        let attrs = caps.get(3).map(|m| parse_attrs(m.as_str())).unwrap_or_default();
        let self_closing = caps.get(4).is_some_and(|m| !m.as_str().is_empty())
            || VOID_ELEMENTS.contains(&tag.as_str());
        tokens.push(HtmlToken::Open {
            tag,
            attrs,
            self_closing,
        });
    }

    push_text(&mut tokens, &input[last..]);
    tokens
}

fn push_text(tokens: &mut Vec<HtmlToken>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let text = html_escape::decode_html_entities(raw).into_owned();
    tokens.push(HtmlToken::Text(text));
}

fn parse_attrs(raw: &str) -> Vec<(String, String)> {
    let mut attrs: Vec<(String, String)> = Vec::new();

    for caps in ATTR.captures_iter(raw) {
        let Some(name) = caps.get(1) else {
            continue;
        };
        let name = name.as_str().to_ascii_lowercase();
        let value = caps
            .get(2)
            .or_else(|| caps.get(3))
            .or_else(|| caps.get(4))
            .map(|m| html_escape::decode_html_entities(m.as_str()).into_owned())
            .unwrap_or_default();

        // First occurrence wins, as in browsers
        if !attrs.iter().any(|(n, _)| *n == name) {
            attrs.push((name, value));
        }
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(tag: &str, attrs: &[(&str, &str)], self_closing: bool) -> HtmlToken {
        HtmlToken::Open {
            tag: tag.to_string(),
            attrs: attrs
                .iter()
                .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                .collect(),
            self_closing,
        }
    }

    #[test]
    fn test_video_tag_with_boolean_attr() {
        let tokens = tokenize(r#"<video controls src="x"></video>"#);
        assert_eq!(
            tokens,
            vec![
                open("video", &[("controls", ""), ("src", "x")], false),
                HtmlToken::Close {
                    tag: "video".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_text_and_entities() {
        let tokens = tokenize(r#"<b title='a &amp; b'>1 &lt; 2</b>"#);
        assert_eq!(tokens[0], open("b", &[("title", "a & b")], false));
        assert_eq!(tokens[1], HtmlToken::Text("1 < 2".to_string()));
    }

    #[test]
    fn test_void_and_self_closing() {
        let tokens = tokenize(r#"<br><emoji shortcode="blob"/><SOURCE src=a.mp4>"#);
        assert_eq!(tokens[0], open("br", &[], true));
        assert_eq!(tokens[1], open("emoji", &[("shortcode", "blob")], true));
        assert_eq!(tokens[2], open("source", &[("src", "a.mp4")], true));
    }

    #[test]
    fn test_comments_are_dropped() {
        let tokens = tokenize("a<!-- <script> -->b");
        assert_eq!(
            tokens,
            vec![
                HtmlToken::Text("a".to_string()),
                HtmlToken::Text("b".to_string())
            ]
        );
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        let tokens = tokenize(r#"<a href="one" HREF="two">"#);
        assert_eq!(tokens[0], open("a", &[("href", "one")], false));
    }
}
