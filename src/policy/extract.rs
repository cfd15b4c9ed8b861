//! Article extraction from HTML
//!
//! Noise elements are removed first, then the title and body are read with
//! the site's selectors. Text nodes inside an element are concatenated as they
//! are, so inline markup never splits a word; whitespace runs then collapse to
//! single spaces.

use crate::config::ExtractionConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Title and body pulled out of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedArticle {
    pub title: String,
    pub content: String,

    /// True when the title or the content is missing or the content is too short
    pub is_empty: bool,
}

/// Compiled extraction selectors for one site
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    title: Selector,
    content: Vec<Selector>,
    noise: Vec<Selector>,
    min_content_chars: usize,
}

impl ExtractionRules {
    /// Compiles the selectors of an extraction config
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSelector` naming the first selector that
    /// does not parse.
    pub fn from_config(site_id: &str, config: &ExtractionConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile_selector(site_id, &config.title_selector)?,
            content: compile_selectors(site_id, &config.content_selectors)?,
            noise: compile_selectors(site_id, &config.noise_selectors)?,
            min_content_chars: config.min_content_chars,
        })
    }
}

/// Parses one CSS selector, tagging failures with the site id
pub fn compile_selector(site_id: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|_| ConfigError::InvalidSelector {
        site: site_id.to_string(),
        selector: selector.to_string(),
    })
}

/// Parses a list of CSS selectors in order
pub fn compile_selectors(site_id: &str, selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors
        .iter()
        .map(|s| compile_selector(site_id, s))
        .collect()
}

/// Extracts an article from raw HTML
///
/// Content selectors are tried in order; the first whose collapsed text
/// reaches the minimum length wins. Parsing never fails: malformed markup just
/// yields an empty article.
pub fn extract_article(html: &str, rules: &ExtractionRules) -> ExtractedArticle {
    let mut document = Html::parse_document(html);
    remove_noise(&mut document, &rules.noise);

    let title = document
        .select(&rules.title)
        .next()
        .map(|element| collapse_whitespace(&element_text(element)))
        .unwrap_or_default();

    let content = rules
        .content
        .iter()
        .map(|selector| {
            let matches: Vec<String> = document.select(selector).map(element_text).collect();
            collapse_whitespace(&matches.join(" "))
        })
        .find(|text| text.chars().count() >= rules.min_content_chars)
        .unwrap_or_default();

    let is_empty = title.is_empty()
        || content.is_empty()
        || content.chars().count() < rules.min_content_chars;

    ExtractedArticle {
        title,
        content,
        is_empty,
    }
}

/// Detaches every subtree matching one of the selectors
fn remove_noise(document: &mut Html, noise: &[Selector]) {
    for selector in noise {
        let ids: Vec<_> = document.select(selector).map(|element| element.id()).collect();
        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// Text of an element with its text nodes concatenated unchanged
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

/// Trims and collapses whitespace runs into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
