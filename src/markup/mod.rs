//! Markup pipeline: parse, sanitize, render.
//!
//! ```text
//! text ──parse──▶ element tree ──sanitize──▶ safe tree ──render──▶ [View]
//!                  (markdown + raw HTML        (allowlist)    (full or lite
//!                   + @mention / :emoji:)                       mapping)
//! ```
//!
//! Every step is pure given the text and the emoji dictionary. Mention
//! chips are hydrated afterwards with [`hydrate`].

pub mod ast;
pub mod html;
pub mod parse;
pub mod render;
pub mod sanitize;
pub mod social;

pub use ast::{Element, Node};
pub use render::{
    FullMapping, LiteMapping, Renderer, ThemeDescriptor, View, ViewMapping, hydrate, plain_text,
};
pub use social::{Service, SocialLink};

use crate::models::EmojiDictionary;

/// Parse and sanitize without rendering
pub fn sanitized_tree(text: &str) -> Vec<Node> {
    sanitize::sanitize(parse::parse(text))
}

/// Full rendering
pub fn render(text: &str, emojis: &EmojiDictionary) -> Vec<View> {
    Renderer::new(FullMapping, emojis).render(&sanitized_tree(text))
}

/// Lite rendering for single-line contexts
pub fn render_lite(text: &str, emojis: &EmojiDictionary) -> Vec<View> {
    Renderer::new(LiteMapping, emojis).render(&sanitized_tree(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contains_tag(nodes: &[Node], tag: &str) -> bool {
        nodes.iter().filter_map(Node::as_element).any(|e| e.tag == tag || contains_tag(&e.children, tag))
    }

    #[test]
    fn test_script_removed_video_kept() {
        let tree = sanitized_tree(r#"<script>alert(1)</script><video controls src="x"></video>"#);
        assert!(!contains_tag(&tree, "script"));
        assert!(contains_tag(&tree, "video"));

        let views = render(
            r#"<script>alert(1)</script><video controls src="x"></video>"#,
            &EmojiDictionary::new(),
        );
        let text = plain_text(&views);
        assert!(!text.contains("alert"));
        assert!(views.iter().any(|v| matches!(
            v,
            View::Video { src, controls: true, .. } if src == "x"
        )) || views.iter().any(|v| matches!(
            v,
            View::Paragraph(c) if c.iter().any(|v| matches!(v, View::Video { controls: true, .. }))
        )));
    }

    #[test]
    fn test_lite_and_full_share_inline_mapping() {
        let emojis = EmojiDictionary::new();
        let full = plain_text(&render("**bold** :x:", &emojis));
        let lite = plain_text(&render_lite("**bold** :x:", &emojis));
        assert_eq!(full, lite);
    }
}
