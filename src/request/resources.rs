//! Resource (URI segment) parsing
//!
//! Slices the request URI after `base_uri + separator`, decodes it and
//! splits it into path segments.

use std::borrow::Cow;

/// Extract the resources that follow `base_uri + separator` in `uri`
///
/// A URI that does not start with the prefix, or is not longer than it,
/// yields no resources. The query string is ignored. The remainder is
/// URL-decoded before splitting on `/`, and a trailing empty segment
/// (from a final `/`) is dropped.
///
/// # Examples
/// ```
/// use restbase::request::resources::parse_resources;
/// assert_eq!(parse_resources("/api/users/42?full=1", "/api", "/"), vec!["users", "42"]);
/// assert!(parse_resources("/other/users", "/api", "/").is_empty());
/// ```
pub fn parse_resources(uri: &str, base_uri: &str, separator: &str) -> Vec<String> {
    let prefix = format!("{base_uri}{separator}");
    if uri.len() <= prefix.len() {
        return Vec::new();
    }
    let Some(rest) = uri.strip_prefix(prefix.as_str()) else {
        return Vec::new();
    };

    let raw = rest.split_once('?').map_or(rest, |(path, _)| path);
    let decoded = url_decode(raw);

    let mut resources: Vec<String> = decoded.split('/').map(ToString::to_string).collect();
    if resources.last().is_some_and(String::is_empty) {
        resources.pop();
    }
    resources
}

/// Decode `%XX` escapes and `+` as space
///
/// Invalid UTF-8 after decoding is replaced lossily rather than rejected.
pub fn url_decode(input: &str) -> String {
    let plus_decoded: Cow<'_, str> = if input.contains('+') {
        Cow::Owned(input.replace('+', " "))
    } else {
        Cow::Borrowed(input)
    };
    match urlencoding::decode(&plus_decoded) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => String::from_utf8_lossy(&urlencoding::decode_binary(plus_decoded.as_bytes()))
            .into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_segments() {
        assert_eq!(parse_resources("/api/a/b/c", "/api", "/"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_custom_separator() {
        assert_eq!(
            parse_resources("/service:cel:a/b/c", "/service:cel", ":"),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn test_any_base_and_separator() {
        for (base, sep) in [("/api", "/"), ("", "/"), ("/v2/rest", "|"), ("/x", "::")] {
            let uri = format!("{base}{sep}a/b/c");
            assert_eq!(parse_resources(&uri, base, sep), vec!["a", "b", "c"], "{uri}");
            let uri = format!("{base}{sep}a/b/");
            assert_eq!(parse_resources(&uri, base, sep), vec!["a", "b"], "{uri}");
        }
    }

    #[test]
    fn test_trailing_separator_dropped() {
        assert_eq!(parse_resources("/api/a/b/", "/api", "/"), vec!["a", "b"]);
    }

    #[test]
    fn test_inner_empty_segment_kept() {
        assert_eq!(parse_resources("/api/a//b", "/api", "/"), vec!["a", "", "b"]);
    }

    #[test]
    fn test_no_prefix_match() {
        assert!(parse_resources("/elsewhere/a/b", "/api", "/").is_empty());
        // prefix present but not at the start
        assert!(parse_resources("/v1/api/a", "/api", "/").is_empty());
    }

    #[test]
    fn test_uri_not_longer_than_prefix() {
        assert!(parse_resources("/api/", "/api", "/").is_empty());
        assert!(parse_resources("/api", "/api", "/").is_empty());
    }

    #[test]
    fn test_query_string_ignored() {
        assert_eq!(parse_resources("/api/a/b?x=1&y=/z", "/api", "/"), vec!["a", "b"]);
        assert!(parse_resources("/api/?x=1", "/api", "/").is_empty());
    }

    #[test]
    fn test_url_decoding() {
        assert_eq!(parse_resources("/api/a%20b", "/api", "/"), vec!["a b"]);
        assert_eq!(parse_resources("/api/a+b/%C3%A9", "/api", "/"), vec!["a b", "é"]);
        // decoding happens before splitting
        assert_eq!(parse_resources("/api/a%2Fb", "/api", "/"), vec!["a", "b"]);
    }

    #[test]
    fn test_url_decode_invalid_utf8() {
        assert_eq!(url_decode("%FFok"), "\u{FFFD}ok");
        assert_eq!(url_decode("%2B"), "+");
    }
}
