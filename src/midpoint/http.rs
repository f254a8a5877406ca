//! HTTP utilities for Midpoint REST calls

use crate::error::{MidpointError, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Status codes Midpoint uses for a successful call
const ACCEPTED_STATUSES: &[u16] = &[200, 201, 202, 204];

pub const XML_CONTENT_TYPE: &str = "application/xml";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = body
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|i| *i <= MAX_LOG_BODY_LENGTH)
            .last()
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control() && c != ' ', "")
}

/// Whether a call with this method addresses a single object by oid
fn addresses_object(method: &Method) -> bool {
    *method == Method::GET || *method == Method::PATCH || *method == Method::PUT
}

/// HTTP client wrapper for Midpoint REST calls
#[derive(Clone)]
pub struct MidpointHttpClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl MidpointHttpClient {
    /// Create a new HTTP client for the REST root at `base_url`
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mpconf/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the URL for a call; GET, PATCH and PUT get the oid appended
    pub fn url_for(&self, method: &Method, endpoint: &str, oid: Option<&str>) -> String {
        let mut url = format!("{}/{}", self.base_url, endpoint);
        if addresses_object(method) {
            if let Some(oid) = oid {
                url.push('/');
                url.push_str(oid);
            }
        }
        url
    }

    /// Issue one authenticated call and return the raw response body.
    ///
    /// Any status outside 200/201/202/204 is returned as
    /// [`MidpointError::Status`]. Nothing is retried here.
    pub async fn call(
        &self,
        method: Method,
        endpoint: &str,
        oid: Option<&str>,
        payload: Option<Vec<u8>>,
        content_type: &str,
    ) -> Result<Vec<u8>> {
        let url = self.url_for(&method, endpoint, oid);
        tracing::debug!("{} {} ({})", method, url, content_type);

        let mut request = self
            .client
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.password))
            .header(CONTENT_TYPE, content_type);

        if let Some(payload) = payload {
            tracing::trace!("payload: {}", String::from_utf8_lossy(&payload));
            request = request.body(payload);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        tracing::trace!("response_code: {}", status.as_u16());

        if !ACCEPTED_STATUSES.contains(&status.as_u16()) {
            tracing::error!(
                "API error: {} - {}",
                status,
                sanitize_for_log(&String::from_utf8_lossy(&body))
            );
            return Err(MidpointError::Status {
                status: status.as_u16(),
                url,
            });
        }

        tracing::trace!("response: {}", String::from_utf8_lossy(&body));
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_suffix_only_for_object_methods() {
        let http =
            MidpointHttpClient::new("http://mp:8080/midpoint/ws/rest/", "admin", "pw").unwrap();
        assert_eq!(
            http.url_for(&Method::GET, "roles", Some("r1")),
            "http://mp:8080/midpoint/ws/rest/roles/r1"
        );
        assert_eq!(
            http.url_for(&Method::PUT, "users", Some("u1")),
            "http://mp:8080/midpoint/ws/rest/users/u1"
        );
        assert_eq!(
            http.url_for(&Method::POST, "roles/search", Some("ignored")),
            "http://mp:8080/midpoint/ws/rest/roles/search"
        );
    }

    #[test]
    fn test_sanitize_truncates_long_bodies() {
        let body = "x".repeat(500);
        let sanitized = sanitize_for_log(&body);
        assert!(sanitized.contains("[truncated, 500 bytes total]"));
        assert_eq!(sanitize_for_log("a\nb"), "ab");
    }
}
