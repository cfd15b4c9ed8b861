use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Canonical string key for a URL
///
/// Two URLs that differ only in case, query parameter order, trailing slash,
/// or fragment produce the same `NormalizedUrl`. Produced by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedUrl(String);

impl NormalizedUrl {
    /// Returns the canonical URL string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the underlying string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes a URL into its canonical frontier key
///
/// # Normalization Steps
///
/// 1. Parse the URL
/// 2. Remove the fragment
/// 3. Normalize the path: collapse empty segments, remove trailing slashes
///    (except for root `/`)
/// 4. Sort query parameters by name (stable for repeated names)
/// 5. Remove an empty query string
/// 6. Lowercase the whole serialized URL
///
/// Input that cannot be parsed is not rejected: the lowercased input is used
/// as the key instead, so the frontier can still deduplicate it.
///
/// The function is idempotent: `normalize(normalize(u)) == normalize(u)`.
///
/// # Examples
///
/// ```
/// use article_sieve::url::normalize;
///
/// let key = normalize("https://Example.com/News/?b=2&a=1#top");
/// assert_eq!(key.as_str(), "https://example.com/news?a=1&b=2");
/// ```
pub fn normalize(input: &str) -> NormalizedUrl {
    match Url::parse(input) {
        Ok(url) => NormalizedUrl(canonicalize(url).to_lowercase()),
        Err(e) => {
            tracing::trace!("Keeping unparsable URL {:?} as lowercase key: {}", input, e);
            NormalizedUrl(input.to_lowercase())
        }
    }
}

fn canonicalize(mut url: Url) -> String {
    url.set_fragment(None);

    if !url.cannot_be_a_base() {
        let path = normalize_path(url.path());
        url.set_path(&path);
    }

    if url.query().is_some() {
        let params = sorted_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    url.to_string()
}

/// Collapses empty segments and strips trailing slashes
fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Sorts query parameters by their case-folded name
///
/// Sorting on the folded name keeps the order identical once the whole URL is
/// lowercased, which is what makes normalization idempotent.
fn sorted_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by_key(|(key, _)| key.to_lowercase());
    params
}
