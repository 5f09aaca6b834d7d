use crate::{UrlError, UrlResult};
use url::Url;

/// Normalizes a URL into the form used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme
/// 3. Require a host
/// 4. Remove the fragment (everything after #)
///
/// Parsing already lower-cases the host, drops default ports, resolves dot
/// segments and turns an empty path into `/`. Query strings are kept verbatim:
/// two URLs differing only in query order are distinct pages.
///
/// # Arguments
///
/// * `url_str` - The URL string to normalize
///
/// # Returns
///
/// * `Ok(Url)` - Normalized URL
/// * `Err(UrlError)` - Failed to parse or normalize the URL
///
/// # Examples
///
/// ```
/// use shoreline::url::normalize_url;
///
/// let url = normalize_url("https://EXAMPLE.test/a/../b#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.test/b");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already parsed URL (see [`normalize_url`])
pub fn normalize_parsed(mut url: Url) -> UrlResult<Url> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}
