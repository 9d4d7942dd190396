//! Query-string helpers for KVP-encoded OGC requests.
//!
//! OGC parameter names are case-insensitive, so every lookup and merge here
//! compares keys with `eq_ignore_ascii_case`.

use url::Url;

use crate::error::{OgcError, OgcResult};

/// Parse a service URL, reporting the offending string on failure.
pub fn parse_url(s: &str) -> OgcResult<Url> {
    Url::parse(s.trim()).map_err(|e| OgcError::InvalidUrl {
        url: s.to_string(),
        message: e.to_string(),
    })
}

/// Strip a trailing `?` left over from a capabilities-advertised endpoint.
pub fn strip_trailing_question_mark(s: &str) -> &str {
    s.trim().trim_end_matches('?')
}

/// Look up a query parameter by case-insensitive name.
pub fn query_param(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.into_owned())
}

/// Append parameters that are not already present (case-insensitively).
pub fn append_missing_params(url: &mut Url, params: &[(&str, &str)]) {
    let mut pairs = collect_pairs(url);
    for (key, value) in params {
        if !pairs.iter().any(|(k, _)| k.eq_ignore_ascii_case(key)) {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    write_pairs(url, &pairs);
}

/// Set parameters, replacing any existing value under the same name.
///
/// Parameters keep the order in which they are given; untouched existing
/// parameters (vendor keys baked into the endpoint) stay in front.
pub fn set_params<K, V>(url: &mut Url, params: &[(K, V)])
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(String, String)> = collect_pairs(url)
        .into_iter()
        .filter(|(k, _)| !params.iter().any(|(key, _)| k.eq_ignore_ascii_case(key.as_ref())))
        .collect();
    pairs.extend(
        params
            .iter()
            .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
    );
    write_pairs(url, &pairs);
}

fn collect_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn write_pairs(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
        return;
    }
    url.query_pairs_mut().clear().extend_pairs(pairs.iter());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_missing_params_is_case_insensitive() {
        let mut url = parse_url("http://example.com/wms?service=WMS&map=world").unwrap();
        append_missing_params(
            &mut url,
            &[("SERVICE", "WMS"), ("REQUEST", "GetCapabilities")],
        );

        let pairs: Vec<_> = url.query_pairs().collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(query_param(&url, "Request").as_deref(), Some("GetCapabilities"));
        assert_eq!(query_param(&url, "SERVICE").as_deref(), Some("WMS"));
    }

    #[test]
    fn test_set_params_replaces_existing() {
        let mut url = parse_url("http://example.com/wms?map=world&version=1.1.1").unwrap();
        set_params(&mut url, &[("VERSION", "1.3.0"), ("REQUEST", "GetMap")]);

        assert_eq!(query_param(&url, "map").as_deref(), Some("world"));
        assert_eq!(query_param(&url, "version").as_deref(), Some("1.3.0"));
        assert_eq!(url.query_pairs().count(), 3);
    }

    #[test]
    fn test_empty_query_is_dropped() {
        let mut url = parse_url("http://example.com/wfs?").unwrap();
        append_missing_params(&mut url, &[]);
        assert_eq!(url.as_str(), "http://example.com/wfs");
    }

    #[test]
    fn test_strip_trailing_question_mark() {
        assert_eq!(
            strip_trailing_question_mark("http://example.com/wfs?"),
            "http://example.com/wfs"
        );
        assert_eq!(
            strip_trailing_question_mark("http://example.com/wfs"),
            "http://example.com/wfs"
        );
    }

    #[test]
    fn test_parse_url_error() {
        let err = parse_url("not a url").unwrap_err();
        assert!(matches!(err, OgcError::InvalidUrl { url, .. } if url == "not a url"));
    }
}
