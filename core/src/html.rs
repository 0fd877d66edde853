use anyhow::Result;
use lazy_static::lazy_static;
use reqwest::blocking::Client;
use reqwest::header;
use scraper::{ElementRef, Html, Node, Selector};
use std::time::Duration;
use url::Url;

lazy_static! {
    static ref ANCHORS: Selector = Selector::parse("a[href]").expect("valid selector");
}

/// Elements whose subtree carries no indexable page text.
const SKIPPED: &[&str] = &["head", "script", "style", "noscript", "svg", "template"];

/// Block-level elements. Their boundaries become newlines in the extracted
/// text so compact markup cannot fuse words across paragraphs, list items,
/// or cells.
const BLOCKS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hr", "li", "main", "nav", "ol", "p", "pre",
    "section", "table", "td", "th", "tr", "ul",
];

/// Narrow contract the crawler consumes: give back the HTML body of a page,
/// or nothing on any kind of failure.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &Url) -> Option<String>;
}

/// Blocking HTTP fetcher: follows up to three redirects and only accepts
/// responses declared as `text/html`.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("quarry/", env!("CARGO_PKG_VERSION")))
            .redirect(reqwest::redirect::Policy::limited(3))
            .timeout(Duration::from_secs(12))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Option<String> {
        let response = self.client.get(url.clone()).send().ok()?;
        if !response.status().is_success() {
            return None;
        }
        let content_type = response.headers().get(header::CONTENT_TYPE)?;
        if !content_type.to_str().ok()?.starts_with("text/html") {
            return None;
        }
        response.text().ok()
    }
}

/// All HTTP(S) URLs in anchor hrefs, in document order, absolute-resolved
/// against `base` with fragments stripped. Unparseable hrefs and other
/// schemes are dropped; duplicates are kept (admission deduplicates).
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    for anchor in document.select(&ANCHORS) {
        if let Some(href) = anchor.value().attr("href") {
            let resolved = Url::parse(href).or_else(|_| base.join(href));
            if let Ok(mut link) = resolved {
                link.set_fragment(None);
                if matches!(link.scheme(), "http" | "https") {
                    links.push(link);
                }
            }
        }
    }

    links
}

/// The page's plain text: every text node outside of non-content subtrees,
/// with block-element boundaries rendered as newlines. Inline markup keeps
/// the document's own spacing; entities are already decoded by the parser.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut text = String::new();
    collect_text(document.root_element(), &mut text);
    text
}

fn collect_text(element: ElementRef, out: &mut String) {
    let name = element.value().name();
    if SKIPPED.contains(&name) {
        return;
    }
    let block = BLOCKS.contains(&name);
    if block {
        out.push('\n');
    }
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, out);
        } else if let Node::Text(chunk) = child.value() {
            out.push_str(chunk);
        }
    }
    if block {
        out.push('\n');
    }
}
