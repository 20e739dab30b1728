/// Label- and filename-safe identifier for a URL.
///
/// The scheme (`https://`, `//`) is dropped, the rest is lowercased and every
/// run of characters outside `[a-z0-9]` collapses into a single `-`.
pub fn slugify_url(url: &str) -> String {
    let mut slug = String::with_capacity(url.len());
    let mut pending_dash = false;
    for c in strip_scheme(url.trim()).chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

fn strip_scheme(url: &str) -> &str {
    if let Some(idx) = url.find("//") {
        let scheme = &url[..idx];
        let is_scheme = scheme.is_empty()
            || (scheme.ends_with(':')
                && scheme[..scheme.len() - 1]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_'));
        if is_scheme {
            return &url[idx + 2..];
        }
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_and_normalizes() {
        assert_eq!(slugify_url("https://example.com"), "example-com");
        assert_eq!(slugify_url("http://Example.COM/"), "example-com");
        assert_eq!(slugify_url("//cdn.koj.co/assets"), "cdn-koj-co-assets");
        assert_eq!(
            slugify_url("https://api.example.com:8443/v1/health?full=1"),
            "api-example-com-8443-v1-health-full-1"
        );
    }

    #[test]
    fn keeps_urls_without_scheme() {
        assert_eq!(slugify_url("example.com/a//b"), "example-com-a-b");
    }

    #[test]
    fn same_lowercased_url_yields_same_slug() {
        let a = slugify_url("https://Status.Koj.co/Page");
        let b = slugify_url("http://status.koj.co/page");
        assert_eq!(a, b);
        assert_eq!(a, slugify_url("https://Status.Koj.co/Page"));
    }
}
