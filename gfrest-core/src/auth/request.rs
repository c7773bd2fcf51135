//! Request context handed to the authenticator.

/// The parts of an inbound HTTP request the authenticator reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestRequest {
    method: String,
    path: String,
    query: Vec<(String, String)>,
}

impl RestRequest {
    /// `path` is the raw request path; `query` the raw query string without `?`.
    ///
    /// Query values are form-decoded (`+` is a space).
    pub fn new(method: &str, path: &str, query: Option<&str>) -> Self {
        let query = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query,
        }
    }

    /// Split a request target (`/path?query`) into path and query.
    pub fn from_target(method: &str, target: &str) -> Self {
        match target.split_once('?') {
            Some((path, query)) => Self::new(method, path, Some(query)),
            None => Self::new(method, target, None),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Value of the query parameter `name`. The last occurrence wins.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Like [`query_param`](Self::query_param) but treats `""` and `"0"` as
    /// absent, the way PHP's `empty()` reads a string.
    pub fn non_empty_param(&self, name: &str) -> Option<&str> {
        self.query_param(name)
            .filter(|value| !value.is_empty() && *value != "0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_decoding() {
        let req = RestRequest::from_target(
            "GET",
            "/wp-json/gf/v2/entries?api_key=pk1&signature=a%2Bb+c&api_key=pk2&expires=",
        );
        assert_eq!(req.path(), "/wp-json/gf/v2/entries");
        assert_eq!(req.query_param("api_key"), Some("pk2"));
        assert_eq!(req.query_param("signature"), Some("a+b c"));
        assert_eq!(req.query_param("expires"), Some(""));
        assert_eq!(req.non_empty_param("expires"), None);
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn test_zero_reads_as_empty() {
        let req = RestRequest::from_target("GET", "/x?a=0&b=00&c=0.0&d=%200");
        assert_eq!(req.non_empty_param("a"), None);
        assert_eq!(req.non_empty_param("b"), Some("00"));
        assert_eq!(req.non_empty_param("c"), Some("0.0"));
        assert_eq!(req.non_empty_param("d"), Some(" 0"));
    }

    #[test]
    fn test_without_query() {
        let req = RestRequest::from_target("post", "/health");
        assert_eq!(req.method(), "post");
        assert_eq!(req.path(), "/health");
        assert_eq!(req.query_param("api_key"), None);
    }
}
