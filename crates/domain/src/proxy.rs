//! Proxy value types: forwarded requests, relayed responses, and the rules
//! applied to them on the way through the gateway.

use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Transport-framing headers never relayed in either direction.
///
/// The gateway re-frames bodies with an explicit `Content-Length`; letting a
/// chunked `Transfer-Encoding` through would double-encode the stream.
pub const HOP_BY_HOP_HEADERS: [&str; 3] = ["transfer-encoding", "connection", "keep-alive"];

/// HTTP methods accepted on the proxy route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl ProxyMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Whether the inbound body is forwarded for this method.
    ///
    /// `GET` and `DELETE` are always forwarded without a body.
    #[must_use]
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for ProxyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for methods the proxy does not route.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("method {0} is not supported by the proxy")]
pub struct UnsupportedMethod(pub String);

impl FromStr for ProxyMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(UnsupportedMethod(other.to_string())),
        }
    }
}

/// Ordered header list with case-insensitive lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyHeaders(Vec<(String, String)>);

impl ProxyHeaders {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header, keeping any existing values with the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Set a header, replacing every existing value with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.0.push((name, value.into()));
    }

    /// Remove every value of `name`.
    pub fn remove(&mut self, name: &str) {
        self.0.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// First value of `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop the [`HOP_BY_HOP_HEADERS`].
    ///
    /// Applied to outbound requests and to relayed responses alike.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.0.retain(|(name, _)| {
            !HOP_BY_HOP_HEADERS
                .iter()
                .any(|hop| name.eq_ignore_ascii_case(hop))
        });
        self
    }
}

impl FromIterator<(String, String)> for ProxyHeaders {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for ProxyHeaders {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// An inbound request addressed to a module through the proxy route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub module_id: String,
    pub method: ProxyMethod,
    /// Path after `/{moduleId}/proxy`, always starting with `/`.
    pub sub_path: String,
    pub query: Option<String>,
    pub body: Vec<u8>,
}

/// A request ready to be sent to a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub method: ProxyMethod,
    pub url: String,
    pub headers: ProxyHeaders,
    pub body: Option<Vec<u8>>,
}

/// A response received from, or relayed back for, a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status: u16,
    pub headers: ProxyHeaders,
    pub body: Vec<u8>,
}

impl ProxyResponse {
    /// Prepare an upstream response for relaying.
    ///
    /// Hop-by-hop headers are stripped and, when a body is present,
    /// `Content-Length` is set to its byte length.
    #[must_use]
    pub fn into_relayable(self) -> Self {
        let mut headers = self.headers.sanitized();
        if !self.body.is_empty() {
            headers.insert("content-length", self.body.len().to_string());
        }
        Self {
            status: self.status,
            headers,
            body: self.body,
        }
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    #[must_use]
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

/// Coarse allow/deny gate applied to proxy sub-paths before any lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGuard {
    denied_prefixes: Vec<String>,
}

impl Default for PathGuard {
    fn default() -> Self {
        Self::new(vec!["/secret".to_string()])
    }
}

impl PathGuard {
    #[must_use]
    pub fn new(denied_prefixes: Vec<String>) -> Self {
        Self { denied_prefixes }
    }

    #[must_use]
    pub fn denied_prefixes(&self) -> &[String] {
        &self.denied_prefixes
    }

    /// Reject denylisted prefixes and dot segments.
    ///
    /// The denylist is matched against the path as the upstream will see it:
    /// percent-encoded unreserved characters are decoded, `\\` counts as a
    /// separator and empty segments are collapsed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ForbiddenPath`] or
    /// [`ValidationError::PathTraversal`].
    pub fn check(&self, sub_path: &str) -> Result<(), ValidationError> {
        let segments: Vec<String> = sub_path
            .split(['/', '\\'])
            .filter(|segment| !segment.is_empty())
            .map(decode_unreserved)
            .collect();
        let normalized = format!("/{}", segments.join("/"));
        if self
            .denied_prefixes
            .iter()
            .any(|prefix| {
                normalized.starts_with(prefix.as_str()) || sub_path.starts_with(prefix.as_str())
            })
        {
            return Err(ValidationError::ForbiddenPath(sub_path.to_string()));
        }
        if segments.iter().any(|segment| segment == "." || segment == "..") {
            return Err(ValidationError::PathTraversal(sub_path.to_string()));
        }
        Ok(())
    }
}

// Upstream URL parsing turns `%2e` into `.` and servers read `%73` as `s`.
fn decode_unreserved(segment: &str) -> String {
    let bytes = segment.as_bytes();
    let mut decoded = String::with_capacity(segment.len());
    let mut index = 0;
    while index < bytes.len() {
        if bytes[index] == b'%'
            && let Some(byte) = segment
                .get(index + 1..index + 3)
                .and_then(|hex| u8::from_str_radix(hex, 16).ok())
                .filter(|byte| byte.is_ascii_alphanumeric() || b"-._~".contains(byte))
        {
            decoded.push(char::from(byte));
            index += 3;
            continue;
        }
        let rest = &segment[index..];
        let Some(ch) = rest.chars().next() else {
            break;
        };
        decoded.push(ch);
        index += ch.len_utf8();
    }
    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_supported_methods() {
        assert_eq!("PATCH".parse::<ProxyMethod>(), Ok(ProxyMethod::Patch));
        assert!("HEAD".parse::<ProxyMethod>().is_err());
    }

    #[test]
    fn should_only_carry_body_for_post_put_patch() {
        assert!(ProxyMethod::Post.carries_body());
        assert!(ProxyMethod::Put.carries_body());
        assert!(ProxyMethod::Patch.carries_body());
        assert!(!ProxyMethod::Get.carries_body());
        assert!(!ProxyMethod::Delete.carries_body());
    }

    #[test]
    fn should_strip_hop_by_hop_headers_case_insensitively() {
        let headers: ProxyHeaders = [
            ("Transfer-Encoding", "chunked"),
            ("CONNECTION", "keep-alive"),
            ("keep-alive", "timeout=5"),
            ("Content-Type", "application/json"),
        ]
        .into_iter()
        .map(|(n, v)| (n.to_string(), v.to_string()))
        .collect();

        let clean = headers.sanitized();

        assert_eq!(clean.len(), 1);
        assert_eq!(clean.get("content-type"), Some("application/json"));
        assert!(!clean.contains("transfer-encoding"));
    }

    #[test]
    fn should_replace_all_values_on_insert() {
        let mut headers = ProxyHeaders::new();
        headers.append("X-Trace", "a");
        headers.append("x-trace", "b");
        headers.insert("X-TRACE", "c");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-trace"), Some("c"));
    }

    #[test]
    fn should_set_content_length_to_body_bytes_when_relaying() {
        let mut headers = ProxyHeaders::new();
        headers.append("Transfer-Encoding", "chunked");
        headers.append("Content-Length", "999");
        let response = ProxyResponse {
            status: 200,
            headers,
            body: "héllo".as_bytes().to_vec(),
        }
        .into_relayable();

        assert!(!response.headers.contains("transfer-encoding"));
        assert_eq!(response.headers.get("content-length"), Some("6"));
    }

    #[test]
    fn should_not_add_content_length_for_empty_body() {
        let response = ProxyResponse {
            status: 204,
            headers: ProxyHeaders::new(),
            body: Vec::new(),
        }
        .into_relayable();
        assert!(!response.headers.contains("content-length"));
    }

    #[test]
    fn should_classify_upstream_status() {
        let response = |status| ProxyResponse {
            status,
            headers: ProxyHeaders::new(),
            body: Vec::new(),
        };
        assert!(response(404).is_client_error());
        assert!(response(502).is_server_error());
        assert!(!response(302).is_client_error());
        assert!(!response(200).is_server_error());
    }

    #[test]
    fn should_reject_denylisted_prefix() {
        let guard = PathGuard::default();
        assert_eq!(
            guard.check("/secret/keys"),
            Err(ValidationError::ForbiddenPath("/secret/keys".to_string()))
        );
    }

    #[test]
    fn should_accept_regular_path() {
        assert!(PathGuard::default().check("/temperature").is_ok());
        assert!(PathGuard::default().check("/").is_ok());
    }

    #[test]
    fn should_reject_parent_segments_including_encoded_ones() {
        let guard = PathGuard::default();
        assert!(matches!(
            guard.check("/a/../secret"),
            Err(ValidationError::PathTraversal(_))
        ));
        assert!(matches!(
            guard.check("/a/%2E%2e/secret"),
            Err(ValidationError::PathTraversal(_))
        ));
        assert!(guard.check("/a/..b/c").is_ok());
    }

    #[test]
    fn should_reject_single_dot_segments_when_plain_or_encoded() {
        let guard = PathGuard::default();
        for path in ["/./secret/keys", "/%2e/secret/keys", "/%2E/temperature", "/a/."] {
            assert!(
                matches!(guard.check(path), Err(ValidationError::PathTraversal(_))),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn should_match_denylist_when_prefix_is_percent_encoded() {
        let guard = PathGuard::default();
        assert_eq!(
            guard.check("/%73ecret/keys"),
            Err(ValidationError::ForbiddenPath("/%73ecret/keys".to_string()))
        );
        assert!(matches!(
            guard.check("/%73%65%63%72%65%74"),
            Err(ValidationError::ForbiddenPath(_))
        ));
    }

    #[test]
    fn should_match_denylist_when_separators_are_doubled_or_backslashed() {
        let guard = PathGuard::default();
        assert!(matches!(
            guard.check("//secret/keys"),
            Err(ValidationError::ForbiddenPath(_))
        ));
        assert!(matches!(
            guard.check("\\secret\\keys"),
            Err(ValidationError::ForbiddenPath(_))
        ));
    }

    #[test]
    fn should_keep_reserved_escapes_when_decoding_segment() {
        assert_eq!(decode_unreserved("a%2Fb%20c"), "a%2Fb%20c");
        assert_eq!(decode_unreserved("%41%7e%zz%"), "A~%zz%");
        assert_eq!(decode_unreserved("h\u{e9}llo"), "h\u{e9}llo");
        assert!(PathGuard::default().check("/a/b%20c").is_ok());
    }

    #[test]
    fn should_use_configured_prefixes() {
        let guard = PathGuard::new(vec!["/admin".to_string()]);
        assert!(guard.check("/secret").is_ok());
        assert!(guard.check("/admin/users").is_err());
    }
}
