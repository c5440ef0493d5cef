//! Request parameter parsing
//!
//! Merges query-string and form-encoded body pairs into a single map.

use std::collections::HashMap;

/// Parameter name to value mapping
pub type Params = HashMap<String, String>;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Collect the parameters of a request
///
/// Query-string pairs are read first, then the body pairs when the body is
/// form-encoded; a later pair overwrites an earlier one with the same name.
pub fn parse_params(uri: &str, content_type: Option<&str>, body: &[u8]) -> Params {
    let mut params = Params::new();

    if let Some((_, query)) = uri.split_once('?') {
        extend_from_pairs(&mut params, query.as_bytes());
    }
    if content_type.is_some_and(is_form_content_type) {
        extend_from_pairs(&mut params, body);
    }

    params
}

fn extend_from_pairs(params: &mut Params, input: &[u8]) {
    for (key, value) in form_urlencoded::parse(input) {
        params.insert(key.into_owned(), value.into_owned());
    }
}

/// `application/x-www-form-urlencoded`, ignoring parameters such as charset
fn is_form_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}
