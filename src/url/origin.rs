use crate::{UrlError, UrlResult};
use url::Url;

/// Returns the origin prefix of a URL: `scheme://host[:port]/`
///
/// Default ports are omitted, matching how normalized URLs serialize, so
/// every normalized URL on the same origin starts with this prefix.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use shoreline::url::origin_prefix;
///
/// let url = Url::parse("https://example.test/docs/intro").unwrap();
/// assert_eq!(origin_prefix(&url).unwrap(), "https://example.test/");
///
/// let url = Url::parse("http://127.0.0.1:8080/a").unwrap();
/// assert_eq!(origin_prefix(&url).unwrap(), "http://127.0.0.1:8080/");
/// ```
pub fn origin_prefix(url: &Url) -> UrlResult<String> {
    let origin = url.origin();
    if !origin.is_tuple() {
        return Err(UrlError::MissingDomain);
    }
    Ok(format!("{}/", origin.ascii_serialization()))
}

/// Returns the robots.txt location for the origin of `url`
pub fn robots_url(url: &Url) -> UrlResult<Url> {
    url.join("/robots.txt")
        .map_err(|e| UrlError::Parse(e.to_string()))
}
