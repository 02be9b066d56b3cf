//! Sanitized tree to view models.
//!
//! Inline nodes (text, emphasis, links, emoji, mentions) map the same way in
//! every variant. Block and embed nodes go through a [`ViewMapping`], which
//! is how the full renderer and the single-line lite renderer differ.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::api::IdentityResolver;
use crate::error::ParseWarning;
use crate::models::{EmojiDictionary, EmojiRef, Identity};

use super::ast::{Element, Node};
use super::social::{self, Service, SocialLink};

/// Reserved code fence language for theme previews
pub const THEME_FENCE: &str = "theme";

/// Theme shared in a `theme` code fence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Color variables, e.g. `"primary": "#0476d9"`
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

/// A rendered view node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    // blocks
    /// Paragraph
    Paragraph(Vec<View>),
    /// Heading
    Heading {
        /// 1 to 6
        level: u8,
        /// Inline content
        children: Vec<View>,
    },
    /// Block quote
    Quote(Vec<View>),
    /// Bullet or numbered list
    List {
        /// Numbered when true
        ordered: bool,
        /// First number of an ordered list
        start: u64,
        /// One view list per item
        items: Vec<Vec<View>>,
    },
    /// Preformatted code
    CodeBlock {
        /// Fence info string
        lang: Option<String>,
        /// Raw code
        code: String,
    },
    /// Parsed `theme` fence
    ThemePreview(ThemeDescriptor),
    /// Table
    Table {
        /// Header cells
        header: Vec<Vec<View>>,
        /// Body rows of cells
        rows: Vec<Vec<Vec<View>>>,
    },
    /// Horizontal rule
    Rule,

    // inline
    /// Plain text
    Text(String),
    /// Bold
    Strong(Vec<View>),
    /// Italic
    Emphasis(Vec<View>),
    /// Strikethrough
    Strike(Vec<View>),
    /// Inline code
    Code(String),
    /// Hard line break
    LineBreak,
    /// Plain hyperlink
    Link {
        /// Target URL
        href: String,
        /// Link text
        children: Vec<View>,
    },
    /// Branded chip for a known profile URL
    SocialChip {
        /// Service and handle
        link: SocialLink,
        /// Service icon URL
        icon: Option<String>,
    },
    /// Custom emoji found in the dictionary
    Emoji(EmojiRef),
    /// Contact chip; `identity` is filled in by [`hydrate`]
    Mention {
        /// Contact ID
        ccid: String,
        /// Resolved profile
        identity: Option<Identity>,
    },
    /// Scrolling text
    Marquee(Vec<View>),

    // embeds
    /// Inline image
    Image {
        /// Image URL
        src: String,
        /// Alt text
        alt: String,
    },
    /// Inline video player
    Video {
        /// Video URL
        src: String,
        /// Poster image URL
        poster: Option<String>,
        /// Show playback controls
        controls: bool,
    },
    /// Installable emoji package card
    EmojiPack {
        /// Package manifest URL
        src: String,
    },
}

impl View {
    /// Flatten to plain text
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain(&mut out);
        out.trim_end_matches('\n').to_string()
    }

    fn write_plain(&self, out: &mut String) {
        match self {
            Self::Text(t) | Self::Code(t) => out.push_str(t),
            Self::Strong(c) | Self::Emphasis(c) | Self::Strike(c) | Self::Marquee(c) => {
                write_plain_all(c, out);
            }
            Self::Link { children, .. } => write_plain_all(children, out),
            Self::LineBreak => out.push('\n'),
            Self::SocialChip { link, .. } => out.push_str(&link.handle),
            Self::Emoji(emoji) => out.push_str(&emoji.literal()),
            Self::Mention { ccid, identity } => {
                out.push('@');
                out.push_str(identity.as_ref().map_or(ccid.as_str(), |i| i.username.as_str()));
            }
            Self::Image { alt, .. } => out.push_str(alt),
            Self::Video { .. } => out.push_str("[Video]"),
            Self::EmojiPack { .. } => out.push_str("[Emoji pack]"),

            Self::Paragraph(c) | Self::Quote(c) | Self::Heading { children: c, .. } => {
                block_start(out);
                write_plain_all(c, out);
                out.push('\n');
            }
            Self::List {
                ordered,
                start,
                items,
            } => {
                block_start(out);
                for (n, item) in (*start..).zip(items) {
                    if *ordered {
                        out.push_str(&format!("{n}. "));
                    } else {
                        out.push_str("• ");
                    }
                    let mut line = String::new();
                    write_plain_all(item, &mut line);
                    out.push_str(line.trim_end_matches('\n'));
                    out.push('\n');
                }
            }
            Self::CodeBlock { code, .. } => {
                block_start(out);
                out.push_str(code.trim_end_matches('\n'));
                out.push('\n');
            }
            Self::ThemePreview(theme) => {
                block_start(out);
                out.push_str(&format!("[Theme: {}]\n", theme.name));
            }
            Self::Table { header, rows } => {
                block_start(out);
                for row in std::iter::once(header).chain(rows) {
                    if row.is_empty() {
                        continue;
                    }
                    let cells: Vec<String> = row.iter().map(|cell| plain_text(cell)).collect();
                    out.push_str(&cells.join(" | "));
                    out.push('\n');
                }
            }
            Self::Rule => {
                block_start(out);
                out.push_str("---\n");
            }
        }
    }
}

fn block_start(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn write_plain_all(views: &[View], out: &mut String) {
    for view in views {
        view.write_plain(out);
    }
}

/// Flatten a view list to plain text
pub fn plain_text(views: &[View]) -> String {
    let mut out = String::new();
    write_plain_all(views, &mut out);
    out.trim_end_matches('\n').to_string()
}

/// Append a view, merging adjacent text
fn push_view(views: &mut Vec<View>, view: View) {
    if let View::Text(text) = &view {
        if text.is_empty() {
            return;
        }
        if let Some(View::Text(last)) = views.last_mut() {
            last.push_str(text);
            return;
        }
    }
    views.push(view);
}

/// Block and embed mapping table of a renderer variant
///
/// Each method maps one node kind to zero or more views; inline formatting
/// is shared and not part of the table.
pub trait ViewMapping {
    /// `p`
    fn paragraph(&self, children: Vec<View>) -> Vec<View>;
    /// `h1` to `h6`
    fn heading(&self, level: u8, children: Vec<View>) -> Vec<View>;
    /// `blockquote`
    fn quote(&self, children: Vec<View>) -> Vec<View>;
    /// `ol` / `ul`
    fn list(&self, ordered: bool, start: u64, items: Vec<Vec<View>>) -> Vec<View>;
    /// `pre > code`
    fn code_block(&self, lang: Option<String>, code: String) -> Vec<View>;
    /// A valid `theme` fence
    fn theme(&self, theme: ThemeDescriptor) -> Vec<View>;
    /// `table`
    fn table(&self, header: Vec<Vec<View>>, rows: Vec<Vec<Vec<View>>>) -> Vec<View>;
    /// `hr`
    fn rule(&self) -> Vec<View>;
    /// `br`
    fn line_break(&self) -> Vec<View>;
    /// `marquee`
    fn marquee(&self, children: Vec<View>) -> Vec<View>;
    /// `img`
    fn image(&self, src: String, alt: String) -> Vec<View>;
    /// `video`
    fn video(&self, src: String, poster: Option<String>, controls: bool) -> Vec<View>;
    /// `emojipack`
    fn emoji_pack(&self, src: String) -> Vec<View>;

    /// Post-process the whole document
    fn finish(&self, views: Vec<View>) -> Vec<View> {
        views
    }
}

/// Full mapping: one view per node
#[derive(Debug, Clone, Copy, Default)]
pub struct FullMapping;

impl ViewMapping for FullMapping {
    fn paragraph(&self, children: Vec<View>) -> Vec<View> {
        vec![View::Paragraph(children)]
    }

    fn heading(&self, level: u8, children: Vec<View>) -> Vec<View> {
        vec![View::Heading { level, children }]
    }

    fn quote(&self, children: Vec<View>) -> Vec<View> {
        vec![View::Quote(children)]
    }

    fn list(&self, ordered: bool, start: u64, items: Vec<Vec<View>>) -> Vec<View> {
        vec![View::List {
            ordered,
            start,
            items,
        }]
    }

    fn code_block(&self, lang: Option<String>, code: String) -> Vec<View> {
        vec![View::CodeBlock { lang, code }]
    }

    fn theme(&self, theme: ThemeDescriptor) -> Vec<View> {
        vec![View::ThemePreview(theme)]
    }

    fn table(&self, header: Vec<Vec<View>>, rows: Vec<Vec<Vec<View>>>) -> Vec<View> {
        vec![View::Table { header, rows }]
    }

    fn rule(&self) -> Vec<View> {
        vec![View::Rule]
    }

    fn line_break(&self) -> Vec<View> {
        vec![View::LineBreak]
    }

    fn marquee(&self, children: Vec<View>) -> Vec<View> {
        vec![View::Marquee(children)]
    }

    fn image(&self, src: String, alt: String) -> Vec<View> {
        vec![View::Image { src, alt }]
    }

    fn video(&self, src: String, poster: Option<String>, controls: bool) -> Vec<View> {
        vec![View::Video {
            src,
            poster,
            controls,
        }]
    }

    fn emoji_pack(&self, src: String) -> Vec<View> {
        vec![View::EmojiPack { src }]
    }
}

/// Lite mapping for single-line contexts (notifications, list rows).
///
/// Blocks collapse to inline runs separated by spaces; embeds become short
/// bracketed placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteMapping;

impl LiteMapping {
    fn inline_block(children: Vec<View>) -> Vec<View> {
        let mut out = children;
        out.push(View::Text(" ".to_string()));
        out
    }

    fn placeholder(text: String) -> Vec<View> {
        vec![View::Text(text)]
    }
}

impl ViewMapping for LiteMapping {
    fn paragraph(&self, children: Vec<View>) -> Vec<View> {
        Self::inline_block(children)
    }

    fn heading(&self, _level: u8, children: Vec<View>) -> Vec<View> {
        Self::inline_block(vec![View::Strong(children)])
    }

    fn quote(&self, children: Vec<View>) -> Vec<View> {
        let mut out = vec![View::Text("> ".to_string())];
        out.extend(children);
        out
    }

    fn list(&self, ordered: bool, start: u64, items: Vec<Vec<View>>) -> Vec<View> {
        let mut out = Vec::new();
        for (n, item) in (start..).zip(items) {
            let prefix = if ordered {
                format!("{n}. ")
            } else {
                "• ".to_string()
            };
            push_view(&mut out, View::Text(prefix));
            for view in Self::inline_block(item) {
                push_view(&mut out, view);
            }
        }
        out
    }

    fn code_block(&self, _lang: Option<String>, code: String) -> Vec<View> {
        Self::inline_block(vec![View::Code(code.trim_end().to_string())])
    }

    fn theme(&self, theme: ThemeDescriptor) -> Vec<View> {
        Self::placeholder(format!("[Theme: {}] ", theme.name))
    }

    fn table(&self, _header: Vec<Vec<View>>, _rows: Vec<Vec<Vec<View>>>) -> Vec<View> {
        Self::placeholder("[Table] ".to_string())
    }

    fn rule(&self) -> Vec<View> {
        Self::placeholder(" ".to_string())
    }

    fn line_break(&self) -> Vec<View> {
        Self::placeholder(" ".to_string())
    }

    fn marquee(&self, children: Vec<View>) -> Vec<View> {
        children
    }

    fn image(&self, _src: String, alt: String) -> Vec<View> {
        if alt.is_empty() {
            Self::placeholder("[Image]".to_string())
        } else {
            Self::placeholder(format!("[Image: {alt}]"))
        }
    }

    fn video(&self, _src: String, _poster: Option<String>, _controls: bool) -> Vec<View> {
        Self::placeholder("[Video]".to_string())
    }

    fn emoji_pack(&self, _src: String) -> Vec<View> {
        Self::placeholder("[Emoji pack]".to_string())
    }

    fn finish(&self, mut views: Vec<View>) -> Vec<View> {
        // soft breaks become spaces too
        for view in &mut views {
            if let View::Text(text) = view {
                *text = text.replace('\n', " ");
            }
        }
        while let Some(View::Text(last)) = views.last_mut() {
            let trimmed = last.trim_end().len();
            if trimmed > 0 {
                last.truncate(trimmed);
                break;
            }
            views.pop();
        }
        views
    }
}

/// Walks a sanitized tree with a mapping table and an emoji dictionary
pub struct Renderer<'a, M> {
    mapping: M,
    emojis: &'a EmojiDictionary,
}

impl<'a, M: ViewMapping> Renderer<'a, M> {
    pub fn new(mapping: M, emojis: &'a EmojiDictionary) -> Self {
        Self { mapping, emojis }
    }

    /// Render a whole document
    pub fn render(&self, nodes: &[Node]) -> Vec<View> {
        self.mapping.finish(self.nodes(nodes))
    }

    fn nodes(&self, nodes: &[Node]) -> Vec<View> {
        let mut out = Vec::new();
        for node in nodes {
            match node {
                Node::Text(text) => push_view(&mut out, View::Text(text.clone())),
                Node::Element(element) => {
                    for view in self.element(element) {
                        push_view(&mut out, view);
                    }
                }
            }
        }
        out
    }

    fn children(&self, element: &Element) -> Vec<View> {
        self.nodes(&element.children)
    }

    fn element(&self, e: &Element) -> Vec<View> {
        let m = &self.mapping;
        match e.tag.as_str() {
            "p" => m.paragraph(self.children(e)),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = e.tag[1..].parse().unwrap_or(1);
                m.heading(level, self.children(e))
            }
            "blockquote" => m.quote(self.children(e)),
            "ul" | "ol" => {
                let items = e
                    .children
                    .iter()
                    .filter_map(Node::as_element)
                    .filter(|li| li.tag == "li")
                    .map(|li| self.children(li))
                    .collect();
                let start = e.attr("start").and_then(|s| s.parse().ok()).unwrap_or(1);
                m.list(e.tag == "ol", start, items)
            }
            "pre" => self.code_block(e),
            "code" => vec![View::Code(e.text_content())],
            "strong" | "b" => vec![View::Strong(self.children(e))],
            "em" | "i" => vec![View::Emphasis(self.children(e))],
            "del" | "s" | "strike" => vec![View::Strike(self.children(e))],
            "a" => self.link(e),
            "social" => self.social(e),
            "table" => self.table(e),
            "br" => m.line_break(),
            "hr" => m.rule(),
            "marquee" => m.marquee(self.children(e)),
            "img" => match e.attr("src") {
                Some(src) => m.image(src.to_string(), e.attr("alt").unwrap_or_default().to_string()),
                None => Vec::new(),
            },
            "video" => self.video(e),
            "emojipack" => match e.attr("src") {
                Some(src) => m.emoji_pack(src.to_string()),
                None => Vec::new(),
            },
            "emoji" => self.emoji(e),
            "userlink" => match e.attr("ccid") {
                Some(ccid) => vec![View::Mention {
                    ccid: ccid.to_string(),
                    identity: None,
                }],
                None => self.children(e),
            },
            // containers without their own view
            _ => self.children(e),
        }
    }

    fn emoji(&self, e: &Element) -> Vec<View> {
        let Some(shortcode) = e.attr("shortcode") else {
            return Vec::new();
        };
        match self.emojis.get(shortcode) {
            Some(emoji) => vec![View::Emoji(emoji.clone())],
            // unresolved emoji stay literal so re-rendering is a no-op
            None => vec![View::Text(format!(":{shortcode}:"))],
        }
    }

    fn link(&self, e: &Element) -> Vec<View> {
        let Some(href) = e.attr("href") else {
            return self.children(e);
        };
        match social::match_profile(href) {
            Some(link) => vec![View::SocialChip { link, icon: None }],
            None => vec![View::Link {
                href: href.to_string(),
                children: self.children(e),
            }],
        }
    }

    fn social(&self, e: &Element) -> Vec<View> {
        let Some(href) = e.attr("href") else {
            return self.children(e);
        };
        let icon = e.attr("icon").map(String::from);
        let matched = social::match_profile(href);

        let link = match e.attr("service").and_then(Service::from_name) {
            Some(service) => {
                let handle = matched.map(|l| l.handle).unwrap_or_else(|| {
                    let text = e.text_content();
                    if text.trim().is_empty() {
                        href.to_string()
                    } else {
                        text.trim().to_string()
                    }
                });
                Some(SocialLink {
                    service,
                    handle,
                    href: href.to_string(),
                })
            }
            None => matched,
        };

        match link {
            Some(link) => vec![View::SocialChip { link, icon }],
            None => vec![View::Link {
                href: href.to_string(),
                children: self.children(e),
            }],
        }
    }

    fn code_block(&self, pre: &Element) -> Vec<View> {
        let lang = pre
            .children
            .iter()
            .filter_map(Node::as_element)
            .find(|c| c.tag == "code")
            .and_then(|c| c.attr("class"))
            .and_then(|class| class.strip_prefix("language-"))
            .map(String::from);
        let code = pre.text_content();

        if lang.as_deref() == Some(THEME_FENCE) {
            match serde_json::from_str::<ThemeDescriptor>(&code) {
                Ok(theme) => return self.mapping.theme(theme),
                Err(e) => {
                    let warning = ParseWarning {
                        fence: THEME_FENCE.to_string(),
                        reason: e.to_string(),
                    };
                    tracing::warn!("{warning}");
                }
            }
        }

        self.mapping.code_block(lang, code)
    }

    fn video(&self, e: &Element) -> Vec<View> {
        let src = e.attr("src").map(String::from).or_else(|| {
            e.children
                .iter()
                .filter_map(Node::as_element)
                .filter(|c| c.tag == "source")
                .find_map(|c| c.attr("src").map(String::from))
        });
        match src {
            Some(src) => self.mapping.video(
                src,
                e.attr("poster").map(String::from),
                e.has_attr("controls"),
            ),
            None => Vec::new(),
        }
    }

    fn table(&self, table: &Element) -> Vec<View> {
        let mut header = Vec::new();
        let mut rows = Vec::new();

        for child in table.children.iter().filter_map(Node::as_element) {
            match child.tag.as_str() {
                "thead" => {
                    for tr in child.children.iter().filter_map(Node::as_element) {
                        if header.is_empty() {
                            header = self.cells(tr);
                        } else {
                            rows.push(self.cells(tr));
                        }
                    }
                }
                "tbody" | "tfoot" => {
                    for tr in child.children.iter().filter_map(Node::as_element) {
                        rows.push(self.cells(tr));
                    }
                }
                "tr" => rows.push(self.cells(child)),
                _ => {}
            }
        }

        self.mapping.table(header, rows)
    }

    fn cells(&self, tr: &Element) -> Vec<Vec<View>> {
        tr.children
            .iter()
            .filter_map(Node::as_element)
            .filter(|c| c.tag == "td" || c.tag == "th")
            .map(|c| self.children(c))
            .collect()
    }
}

fn visit_mut(views: &mut [View], f: &mut dyn FnMut(&mut View)) {
    for view in views.iter_mut() {
        f(view);
        match view {
            View::Paragraph(c)
            | View::Quote(c)
            | View::Strong(c)
            | View::Emphasis(c)
            | View::Strike(c)
            | View::Marquee(c)
            | View::Heading { children: c, .. }
            | View::Link { children: c, .. } => visit_mut(c, f),
            View::List { items, .. } => {
                for item in items {
                    visit_mut(item, f);
                }
            }
            View::Table { header, rows } => {
                for cell in header.iter_mut().chain(rows.iter_mut().flatten()) {
                    visit_mut(cell, f);
                }
            }
            _ => {}
        }
    }
}

/// Resolve every mention chip through `resolver`.
///
/// Each distinct ID is looked up once. Chips whose lookup fails keep
/// `identity: None` and show the raw ID. Returns how many IDs resolved.
pub async fn hydrate(views: &mut [View], resolver: &impl IdentityResolver) -> usize {
    let mut ids = BTreeSet::new();
    visit_mut(views, &mut |view| {
        if let View::Mention {
            ccid,
            identity: None,
        } = view
        {
            ids.insert(ccid.clone());
        }
    });

    let mut resolved: HashMap<String, Identity> = HashMap::new();
    for id in ids {
        match resolver.resolve(&id).await {
            Ok(identity) => {
                resolved.insert(id, identity);
            }
            Err(e) => tracing::debug!("Could not resolve {id}: {e:#}"),
        }
    }

    visit_mut(views, &mut |view| {
        if let View::Mention { ccid, identity } = view
            && identity.is_none()
        {
            *identity = resolved.get(ccid.as_str()).cloned();
        }
    });

    resolved.len()
}
