use axum::http::HeaderMap;

/// Rate-limit key for an incoming request: the nearest proxy-reported
/// client address, falling back to a shared bucket for direct callers.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "direct".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn first_forwarded_hop_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(client_key(&headers), "203.0.113.9");
    }

    #[test]
    fn missing_header_uses_shared_bucket() {
        assert_eq!(client_key(&HeaderMap::new()), "direct");
    }
}
