//! Article text extraction from raw HTML.
//!
//! Two-stage extraction: a readability pass first, and a DOM walk as the
//! fallback when the readability output is too short to be a real article.
//! The fallback strips ad containers and boilerplate paragraphs (subscribe
//! prompts, promo blurbs) before joining what remains.
//!
//! Extraction is synchronous and infallible in the error sense: a page with
//! no usable text yields `None`, which the pipeline reports as a per-item
//! extraction failure.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Minimum body length for the readability pass to be accepted.
const MIN_PRIMARY_LEN: usize = 200;

/// Minimum length for a fallback paragraph to survive filtering.
const MIN_PARAGRAPH_LEN: usize = 50;

/// Title used when a page provides none.
const NO_TITLE: &str = "No title found";

/// Marketing phrases that disqualify a paragraph as boilerplate.
const BOILERPLATE_PHRASES: [&str; 4] = ["subscribe", "click here", "advertisement", "promo"];

/// An article reduced to its readable parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    /// Page or article title; never empty (falls back to a sentinel).
    pub title: String,
    /// Readable body text, paragraphs separated by blank lines; never empty.
    pub body: String,
}

/// Parses a static CSS selector.
///
/// # Panics
///
/// Panics if the selector string is invalid. All call sites use literal
/// selectors, so this never happens in practice.
#[allow(clippy::expect_used)]
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

/// Extracts the readable title and body from raw HTML.
///
/// Runs the readability pass first and accepts it when the body exceeds
/// [`MIN_PRIMARY_LEN`] characters; otherwise falls back to the DOM walk.
/// Returns `None` when both paths yield no usable text.
#[must_use]
pub fn extract_article(html: &str, url: &str) -> Option<ExtractedArticle> {
    if let Some(article) = extract_primary(html, url) {
        debug!(url, bytes = article.body.len(), "readability extraction accepted");
        return Some(article);
    }

    let article = extract_fallback(html);
    match &article {
        Some(a) => debug!(url, bytes = a.body.len(), "fallback extraction accepted"),
        None => debug!(url, "no usable text found"),
    }
    article
}

/// Readability pass over the raw markup.
///
/// Rejected when the extracted text is too short — short output usually
/// means the scorer latched onto navigation or a teaser block.
fn extract_primary(html: &str, url: &str) -> Option<ExtractedArticle> {
    let base = Url::parse(url).ok()?;
    let product = readability::extractor::extract(&mut html.as_bytes(), &base).ok()?;

    let body = product.text.trim().to_string();
    if body.len() <= MIN_PRIMARY_LEN {
        return None;
    }

    let title = product.title.trim().to_string();
    let title = if title.is_empty() {
        NO_TITLE.to_string()
    } else {
        title
    };

    Some(ExtractedArticle { title, body })
}

/// DOM-walk fallback: locate the content container, collect paragraph text,
/// and drop boilerplate.
fn extract_fallback(html: &str) -> Option<ExtractedArticle> {
    let document = Html::parse_document(html);

    let article_sel = selector("article");
    let blocks: Vec<ElementRef> = document.select(&article_sel).collect();

    let paragraphs: Vec<String> = if blocks.is_empty() {
        let container = document
            .select(&selector(".post-content"))
            .next()
            .or_else(|| document.select(&selector("body")).next())
            .unwrap_or_else(|| document.root_element());
        collect_paragraphs(container)
    } else {
        blocks.into_iter().flat_map(collect_paragraphs).collect()
    };

    let kept: Vec<String> = paragraphs
        .into_iter()
        .filter(|p| p.len() > MIN_PARAGRAPH_LEN && !is_boilerplate(p))
        .collect();

    let body = kept.join("\n\n");
    if body.trim().is_empty() {
        return None;
    }

    let title = document
        .select(&selector("title"))
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    Some(ExtractedArticle { title, body })
}

/// Collects normalized paragraph text under a container, skipping paragraphs
/// that live inside ad/promo elements.
fn collect_paragraphs(container: ElementRef<'_>) -> Vec<String> {
    let p_sel = selector("p");
    container
        .select(&p_sel)
        .filter(|p| !inside_ad_container(*p))
        .map(|p| normalize_whitespace(&p.text().collect::<Vec<_>>().join(" ")))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Whether any ancestor of the element is an ad/promo container.
fn inside_ad_container(element: ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| is_ad_container(ancestor))
}

/// Structural ad heuristic: class `ad`/`advertisement`, any class containing
/// `promo`, or an id containing `ad`.
fn is_ad_container(element: ElementRef<'_>) -> bool {
    let value = element.value();

    let ad_class = value
        .classes()
        .any(|c| c == "ad" || c == "advertisement" || c.to_lowercase().contains("promo"));
    let ad_id = value
        .id()
        .is_some_and(|id| id.to_lowercase().contains("ad"));

    ad_class || ad_id
}

/// Whether the paragraph contains a known marketing phrase.
fn is_boilerplate(paragraph: &str) -> bool {
    let lower = paragraph.to_lowercase();
    BOILERPLATE_PHRASES.iter().any(|phrase| lower.contains(phrase))
}

/// Collapses runs of whitespace into single spaces and trims the ends.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
