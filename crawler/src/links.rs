use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref HREF: Regex =
        Regex::new(r#"(?is)<a\s[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#).expect("valid regex");
}

/// `href` targets of every anchor tag, in document order, untrimmed of
/// relative parts.
pub fn extract_links(html: &str) -> Vec<String> {
    HREF.captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
        .map(|m| m.as_str().trim().to_owned())
        .filter(|href| !href.is_empty())
        .collect()
}

/// Resolves `href` against `base` and strips query and fragment. Only http(s)
/// targets are kept.
pub fn canonicalize(base: &Url, href: &str) -> Option<Url> {
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_query(None);
    url.set_fragment(None);
    Some(url)
}
