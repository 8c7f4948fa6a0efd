//! Visible-text extraction from raw page markup.
//!
//! Chrome elements (navigation, headers, scripts, embedded media) never
//! contribute text. The main content region is found by trying a fixed list
//! of container selectors; the whole body is the fallback.

use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};

use crate::models::{ExtractedPage, PageMetadata};

/// Elements whose text is dropped, wherever they appear.
const EXCLUDED_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "svg", "header", "footer", "nav", "aside",
];

/// Tried in order; the first one yielding text wins.
const CONTENT_SELECTORS: &[&str] = &[
    "main", "article", "#content", ".content", ".main", ".post", ".article",
];

pub struct ContentExtractor {
    containers: Vec<(&'static str, Selector)>,
    title: Selector,
    description: Selector,
    keywords: Selector,
    body: Selector,
    spaces: Regex,
    newlines: Regex,
}

impl ContentExtractor {
    pub fn new() -> Self {
        let selector = |s: &str| Selector::parse(s).expect("static selector");
        Self {
            containers: CONTENT_SELECTORS
                .iter()
                .map(|s| (*s, selector(*s)))
                .collect(),
            title: selector("title"),
            description: selector(r#"meta[name="description"]"#),
            keywords: selector(r#"meta[name="keywords"]"#),
            body: selector("body"),
            spaces: Regex::new(r"[^\S\n]+").expect("static regex"),
            newlines: Regex::new(r" ?\n[\s]*").expect("static regex"),
        }
    }

    /// Parses markup best-effort; malformed input yields whatever text survives.
    pub fn extract(&self, html: &str) -> ExtractedPage {
        let doc = Html::parse_document(html);

        let metadata = PageMetadata {
            title: doc
                .select(&self.title)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default(),
            description: meta_content(&doc, &self.description),
            keywords: meta_content(&doc, &self.keywords),
        };

        ExtractedPage {
            content: self.clean_text(&self.find_main_content(&doc)),
            metadata,
        }
    }

    fn find_main_content(&self, doc: &Html) -> String {
        for (source, selector) in &self.containers {
            let mut text = String::new();
            for el in doc.select(selector).filter(|el| !inside_excluded(el)) {
                visible_text(el, &mut text);
            }
            if !text.trim().is_empty() {
                tracing::debug!("Main content found via {}", source);
                return text;
            }
        }

        let root = doc
            .select(&self.body)
            .next()
            .unwrap_or_else(|| doc.root_element());
        let mut text = String::new();
        visible_text(root, &mut text);
        text
    }

    /// Collapses runs of blanks to one space and runs of line breaks to one newline.
    pub fn clean_text(&self, text: &str) -> String {
        let text = self.spaces.replace_all(text, " ");
        let text = self.newlines.replace_all(&text, "\n");
        text.trim().to_string()
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn meta_content(doc: &Html, selector: &Selector) -> String {
    doc.select(selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn is_excluded(name: &str) -> bool {
    EXCLUDED_TAGS.contains(&name)
}

fn inside_excluded(el: &ElementRef) -> bool {
    el.ancestors()
        .filter_map(|node| node.value().as_element())
        .any(|parent| is_excluded(parent.name()))
}

/// Appends text under `el` in document order. Walks with an explicit stack so
/// nesting depth is bounded by the heap, not the thread stack.
fn visible_text(el: ElementRef, out: &mut String) {
    let mut pending: Vec<_> = el.children().rev().collect();
    while let Some(node) = pending.pop() {
        match node.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) if !is_excluded(element.name()) => {
                pending.extend(node.children().rev());
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_wins_over_navigation() {
        let html = r#"<html><head><title> Greeting </title></head><body>
            <nav>Home About</nav>
            <main>Hello   World</main>
        </body></html>"#;

        let page = ContentExtractor::new().extract(html);
        assert_eq!(page.content, "Hello World");
        assert!(!page.content.contains("Home"));
        assert_eq!(page.metadata.title, "Greeting");
    }

    #[test]
    fn reads_meta_description_and_keywords() {
        let html = r#"<html><head>
            <meta name="description" content="A page about crabs">
            <meta name="keywords" content="rust, crabs">
        </head><body><p>Body</p></body></html>"#;

        let page = ContentExtractor::new().extract(html);
        assert_eq!(page.metadata.description, "A page about crabs");
        assert_eq!(page.metadata.keywords, "rust, crabs");
        assert_eq!(page.metadata.title, "");
    }

    #[test]
    fn selectors_are_tried_in_order() {
        let html = r#"<body>
            <div class="post">Post text</div>
            <article>Article text</article>
        </body>"#;

        let page = ContentExtractor::new().extract(html);
        assert_eq!(page.content, "Article text");
    }

    #[test]
    fn empty_container_falls_through() {
        let html = r#"<body><main>   </main><div id="content">Real content</div></body>"#;

        let page = ContentExtractor::new().extract(html);
        assert_eq!(page.content, "Real content");
    }

    #[test]
    fn container_inside_excluded_element_is_ignored() {
        let html = r#"<body><header><div class="content">Banner</div></header><p>Plain body</p></body>"#;

        let page = ContentExtractor::new().extract(html);
        assert_eq!(page.content, "Plain body");
    }

    #[test]
    fn body_fallback_drops_scripts_and_footer() {
        let html = r#"<html><body>
            <script>var x = 1;</script>
            <style>p { color: red; }</style>
            <p>Visible   text</p>
            <footer>Copyright</footer>
        </body></html>"#;

        let page = ContentExtractor::new().extract(html);
        assert_eq!(page.content, "Visible text");
    }

    #[test]
    fn newline_runs_collapse() {
        let extractor = ContentExtractor::new();
        assert_eq!(extractor.clean_text("  a \n\n\n  b\t\tc  "), "a\nb c");
    }

    #[test]
    fn deeply_nested_markup_is_walked() {
        let depth = 50_000;
        let html = format!(
            "<body>{}deep{}<p>tail</p></body>",
            "<span>".repeat(depth),
            "</span>".repeat(depth)
        );

        let page = ContentExtractor::new().extract(&html);
        assert_eq!(page.content, "deeptail");
    }

    #[test]
    fn nested_text_keeps_document_order() {
        let html = r#"<body><div>one <b>two <i>three</i></b> four<nav>skip</nav> five</div></body>"#;

        let page = ContentExtractor::new().extract(html);
        assert_eq!(page.content, "one two three four five");
    }

    #[test]
    fn block_boundaries_survive_as_single_newlines() {
        let page = ContentExtractor::new().extract("<body><p>a</p>\n\n<p>b</p></body>");
        assert_eq!(page.content, "a\nb");
    }

    #[test]
    fn containers_keep_their_selector_source() {
        let extractor = ContentExtractor::new();
        let sources: Vec<&str> = extractor.containers.iter().map(|(source, _)| *source).collect();
        assert_eq!(sources, CONTENT_SELECTORS);
    }

    #[test]
    fn malformed_markup_is_tolerated() {
        let page = ContentExtractor::new().extract("<div><p>Unclosed <b>tags");
        assert_eq!(page.content, "Unclosed tags");
    }
}
