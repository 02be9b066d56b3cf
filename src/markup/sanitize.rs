//! Allowlist filtering of the element tree.
//!
//! Known-dangerous containers (`script`, `style`, ...) are removed together
//! with their content. Any other element outside the allowlist is unwrapped:
//! the element goes, its sanitized children stay. Attributes outside a
//! tag's list are dropped, and URL attributes must use a safe scheme.

use super::ast::{Element, Node, push_node};

/// Attributes allowed on every allowed element
const GLOBAL_ATTRS: &[&str] = &["title", "lang", "dir"];

/// Attributes holding URLs
const URL_ATTRS: &[&str] = &["href", "src", "poster", "icon", "cite"];

/// Schemes allowed in URL attributes; relative URLs are always fine
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Elements removed together with everything inside them
const DROP_SUBTREE: &[&str] = &[
    "script", "style", "iframe", "object", "embed", "template", "noscript", "textarea", "title",
    "head", "svg", "math", "select", "form", "button",
];

/// Allowed tags and their allowed attributes
const ALLOWED: &[(&str, &[&str])] = &[
    // default safe set
    ("a", &["href"]),
    ("abbr", &[]),
    ("b", &[]),
    ("blockquote", &["cite"]),
    ("br", &[]),
    ("code", &["class"]),
    ("dd", &[]),
    ("del", &[]),
    ("details", &["open"]),
    ("div", &[]),
    ("dl", &[]),
    ("dt", &[]),
    ("em", &[]),
    ("figcaption", &[]),
    ("figure", &[]),
    ("h1", &[]),
    ("h2", &[]),
    ("h3", &[]),
    ("h4", &[]),
    ("h5", &[]),
    ("h6", &[]),
    ("hr", &[]),
    ("i", &[]),
    ("img", &["src", "alt", "width", "height"]),
    ("ins", &[]),
    ("kbd", &[]),
    ("li", &[]),
    ("mark", &[]),
    ("ol", &["start"]),
    ("p", &[]),
    ("pre", &[]),
    ("q", &["cite"]),
    ("s", &[]),
    ("small", &[]),
    ("span", &[]),
    ("strike", &[]),
    ("strong", &[]),
    ("sub", &[]),
    ("summary", &[]),
    ("sup", &[]),
    ("table", &[]),
    ("tbody", &[]),
    ("td", &["align", "colspan", "rowspan"]),
    ("tfoot", &[]),
    ("th", &["align", "colspan", "rowspan"]),
    ("thead", &[]),
    ("tr", &[]),
    ("u", &[]),
    ("ul", &[]),
    // embeds
    (
        "video",
        &[
            "src",
            "controls",
            "poster",
            "loop",
            "muted",
            "autoplay",
            "playsinline",
            "width",
            "height",
        ],
    ),
    ("source", &["src", "type"]),
    ("marquee", &["behavior", "direction", "scrollamount"]),
    // composer dialect
    ("userlink", &["ccid"]),
    ("emoji", &["shortcode"]),
    ("social", &["href", "service", "icon"]),
    ("emojipack", &["src"]),
];

fn allowed_attrs(tag: &str) -> Option<&'static [&'static str]> {
    ALLOWED
        .iter()
        .find(|(name, _)| *name == tag)
        .map(|(_, attrs)| *attrs)
}

/// Whether a URL uses an allowed scheme or is relative
pub fn is_safe_url(url: &str) -> bool {
    // Browsers ignore control chars and whitespace inside the scheme
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect();

    let scheme_end = compact.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if compact[i..].starts_with(':') => {
            let scheme = compact[..i].to_ascii_lowercase();
            SAFE_SCHEMES.contains(&scheme.as_str())
        }
        _ => true,
    }
}

fn sanitize_element(mut element: Element, out: &mut Vec<Node>) {
    if DROP_SUBTREE.contains(&element.tag.as_str()) {
        tracing::debug!("Dropping <{}> subtree", element.tag);
        return;
    }

    let children = sanitize(std::mem::take(&mut element.children));

    let Some(allowed) = allowed_attrs(&element.tag) else {
        for child in children {
            push_node(out, child);
        }
        return;
    };

    element.attrs.retain(|(name, value)| {
        let listed = allowed.contains(&name.as_str()) || GLOBAL_ATTRS.contains(&name.as_str());
        listed && (!URL_ATTRS.contains(&name.as_str()) || is_safe_url(value))
    });
    element.children = children;
    out.push(Node::Element(element));
}

/// Filter a tree against the allowlist
pub fn sanitize(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => push_node(&mut out, Node::Text(text)),
            Node::Element(element) => sanitize_element(element, &mut out),
        }
    }
    out
}
