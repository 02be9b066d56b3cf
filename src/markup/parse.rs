//! Markdown parse with the composer's inline extensions.
//!
//! `pulldown-cmark` does the block and inline markdown work. Plain text runs
//! are then split by small lexical matchers into mentions (`@id`), emoji
//! (`:shortcode:`) and bare links. Raw HTML, block or inline, is tokenized
//! into the same element tree so the sanitizer sees one uniform structure.

use std::sync::LazyLock;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;

use super::ast::{Element, Node, push_node};
use super::html::{self, HtmlToken};

static INLINE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r":(\w+):|@([A-Za-z0-9_][A-Za-z0-9_\-]*)|(https?://[^\s<>]+)")
        .expect("valid inline token pattern")
});

/// A lexical token found in a text run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineToken<'a> {
    /// Plain text between tokens
    Text(&'a str),
    /// `@id`, raw identifier without the sigil
    Mention(&'a str),
    /// `:shortcode:`, raw shortcode without colons
    Emoji(&'a str),
    /// Bare `http(s)://` URL
    Url(&'a str),
}

/// Split a text run into inline tokens
pub fn inline_tokens(text: &str) -> Vec<InlineToken<'_>> {
    let mut tokens = Vec::new();
    let mut last = 0;

    for caps in INLINE_TOKEN.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };

        let token = if let Some(code) = caps.get(1) {
            InlineToken::Emoji(code.as_str())
        } else if let Some(id) = caps.get(2) {
            // `user@host` is not a mention
            let glued = text[..whole.start()]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_');
            if glued {
                continue;
            }
            InlineToken::Mention(id.as_str())
        } else if let Some(url) = caps.get(3) {
            let trimmed = url.as_str().trim_end_matches(['.', ',', ')', ';', '!', '?']);
            if whole.start() > last {
                tokens.push(InlineToken::Text(&text[last..whole.start()]));
            }
            tokens.push(InlineToken::Url(trimmed));
            last = whole.start() + trimmed.len();
            continue;
        } else {
            continue;
        };

        if whole.start() > last {
            tokens.push(InlineToken::Text(&text[last..whole.start()]));
        }
        tokens.push(token);
        last = whole.end();
    }

    if last < text.len() {
        tokens.push(InlineToken::Text(&text[last..]));
    }
    tokens
}

struct Frame {
    element: Element,
    from_html: bool,
}

/// Stack-based tree construction from markdown events and HTML tokens
#[derive(Default)]
struct TreeBuilder {
    root: Vec<Node>,
    stack: Vec<Frame>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element, from_html: bool) {
        self.stack.push(Frame { element, from_html });
    }

    fn push(&mut self, node: Node) {
        match self.stack.last_mut() {
            Some(frame) => push_node(&mut frame.element.children, node),
            None => push_node(&mut self.root, node),
        }
    }

    fn pop(&mut self) {
        let Some(mut frame) = self.stack.pop() else {
            return;
        };
        if frame.element.tag == "img" && !frame.from_html {
            let alt = frame.element.text_content();
            frame.element.children.clear();
            frame.element.set_attr("alt", alt);
        }
        self.push(Node::Element(frame.element));
    }

    /// Close the innermost markdown element, auto-closing any HTML left open
    /// inside it
    fn close_markdown(&mut self) {
        while let Some(frame) = self.stack.last() {
            let from_html = frame.from_html;
            self.pop();
            if !from_html {
                break;
            }
        }
    }

    /// Close an HTML element opened in the current markdown container
    fn close_html(&mut self, tag: &str) {
        let Some(depth) = self
            .stack
            .iter()
            .rev()
            .take_while(|f| f.from_html)
            .position(|f| f.element.tag == tag)
        else {
            // stray end tag
            return;
        };
        for _ in 0..=depth {
            self.pop();
        }
    }

    fn in_tag(&self, tag: &str) -> bool {
        self.stack.iter().any(|f| f.element.tag == tag)
    }

    /// Push text, splitting it into mention/emoji/link tokens unless it sits
    /// inside code or a link
    fn text(&mut self, text: &str) {
        if self.in_tag("code") || self.in_tag("a") {
            self.push(Node::text(text));
            return;
        }

        for token in inline_tokens(text) {
            let node = match token {
                InlineToken::Text(t) => Node::text(t),
                InlineToken::Mention(id) => {
                    Node::Element(Element::new("userlink").with_attr("ccid", id))
                }
                InlineToken::Emoji(code) => {
                    Node::Element(Element::new("emoji").with_attr("shortcode", code))
                }
                InlineToken::Url(url) => {
                    let mut link = Element::new("a").with_attr("href", url);
                    link.children.push(Node::text(url));
                    Node::Element(link)
                }
            };
            self.push(node);
        }
    }

    fn html(&mut self, raw: &str) {
        for token in html::tokenize(raw) {
            match token {
                HtmlToken::Open {
                    tag,
                    attrs,
                    self_closing,
                } => {
                    let mut element = Element::new(tag);
                    element.attrs = attrs;
                    if self_closing {
                        self.push(Node::Element(element));
                    } else {
                        self.open(element, true);
                    }
                }
                HtmlToken::Close { tag } => self.close_html(&tag),
                HtmlToken::Text(text) => self.text(&text),
            }
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while !self.stack.is_empty() {
            self.pop();
        }
        self.root
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

/// How many frames a markdown tag opens
fn frames_for(tag: &TagEnd) -> usize {
    match tag {
        TagEnd::CodeBlock | TagEnd::TableHead => 2,
        TagEnd::HtmlBlock => 0,
        _ => 1,
    }
}

/// Parse markdown into the generic element tree
pub fn parse(text: &str) -> Vec<Node> {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(text, options);
    let mut builder = TreeBuilder::default();
    let mut in_table_head = false;

    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::Paragraph => builder.open(Element::new("p"), false),
                Tag::Heading { level, .. } => builder.open(Element::new(heading_tag(level)), false),
                Tag::BlockQuote(_) => builder.open(Element::new("blockquote"), false),
                Tag::CodeBlock(kind) => {
                    builder.open(Element::new("pre"), false);
                    let mut code = Element::new("code");
                    if let CodeBlockKind::Fenced(lang) = kind {
                        let lang = lang.split_whitespace().next().unwrap_or_default();
                        if !lang.is_empty() {
                            code.set_attr("class", format!("language-{lang}"));
                        }
                    }
                    builder.open(code, false);
                }
                Tag::List(Some(start)) => {
                    let mut list = Element::new("ol");
                    if start != 1 {
                        list.set_attr("start", start.to_string());
                    }
                    builder.open(list, false);
                }
                Tag::List(None) => builder.open(Element::new("ul"), false),
                Tag::Item => builder.open(Element::new("li"), false),
                Tag::Table(_) => builder.open(Element::new("table"), false),
                Tag::TableHead => {
                    in_table_head = true;
                    builder.open(Element::new("thead"), false);
                    builder.open(Element::new("tr"), false);
                }
                Tag::TableRow => builder.open(Element::new("tr"), false),
                Tag::TableCell => {
                    let cell = if in_table_head { "th" } else { "td" };
                    builder.open(Element::new(cell), false);
                }
                Tag::Emphasis => builder.open(Element::new("em"), false),
                Tag::Strong => builder.open(Element::new("strong"), false),
                Tag::Strikethrough => builder.open(Element::new("del"), false),
                Tag::Link {
                    dest_url, title, ..
                } => {
                    let mut link = Element::new("a").with_attr("href", dest_url.to_string());
                    if !title.is_empty() {
                        link.set_attr("title", title.to_string());
                    }
                    builder.open(link, false);
                }
                Tag::Image {
                    dest_url, title, ..
                } => {
                    let mut image = Element::new("img").with_attr("src", dest_url.to_string());
                    if !title.is_empty() {
                        image.set_attr("title", title.to_string());
                    }
                    builder.open(image, false);
                }
                Tag::HtmlBlock => {}
                _ => builder.open(Element::new("div"), false),
            },
            Event::End(tag) => {
                if tag == TagEnd::TableHead {
                    in_table_head = false;
                }
                for _ in 0..frames_for(&tag) {
                    builder.close_markdown();
                }
            }
            Event::Text(text) => builder.text(&text),
            Event::Code(code) => {
                let mut element = Element::new("code");
                element.children.push(Node::text(code.to_string()));
                builder.push(Node::Element(element));
            }
            Event::Html(raw) | Event::InlineHtml(raw) => builder.html(&raw),
            Event::SoftBreak => builder.push(Node::text("\n")),
            Event::HardBreak => builder.push(Node::Element(Element::new("br"))),
            Event::Rule => builder.push(Node::Element(Element::new("hr"))),
            Event::FootnoteReference(label) => builder.push(Node::text(format!("[{label}]"))),
            // task lists and math are not enabled
            _ => {}
        }
    }

    builder.finish()
}
