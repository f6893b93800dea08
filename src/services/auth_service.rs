use axum::http;

/// Get the bearer token from a request: the `Authorization` header first,
/// then the `auth_token` cookie.
pub fn get_auth_token<B>(req: &http::Request<B>) -> Result<String, String> {
    if let Some(auth_header) = req.headers().get(http::header::AUTHORIZATION) {
        let auth_str = auth_header.to_str().map_err(|_| "Invalid Authorization header".to_string())?;
        let token = auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).trim();
        if token.is_empty() {
            return Err("Empty bearer token".to_string());
        }
        Ok(token.to_string())
    } else {
        let cookie_header = req
            .headers()
            .get(http::header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        for c in cookie::Cookie::split_parse(cookie_header).flatten() {
            if c.name() == "auth_token" {
                return Ok(c.value().to_string());
            }
        }
        Err("auth_token cookie not found".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(header: http::HeaderName, value: &str) -> http::Request<()> {
        http::Request::builder().header(header, value).body(()).unwrap()
    }

    #[test]
    fn bearer_header_is_preferred() {
        let req = http::Request::builder()
            .header(http::header::AUTHORIZATION, "Bearer abc")
            .header(http::header::COOKIE, "auth_token=xyz")
            .body(())
            .unwrap();
        assert_eq!(get_auth_token(&req).unwrap(), "abc");
    }

    #[test]
    fn cookie_is_used_as_fallback() {
        let req = request(http::header::COOKIE, "theme=dark; auth_token=xyz");
        assert_eq!(get_auth_token(&req).unwrap(), "xyz");
    }

    #[test]
    fn missing_token_is_an_error() {
        let req = http::Request::builder().body(()).unwrap();
        assert!(get_auth_token(&req).is_err());
        assert!(get_auth_token(&request(http::header::AUTHORIZATION, "Bearer ")).is_err());
        assert!(get_auth_token(&request(http::header::COOKIE, "theme=dark")).is_err());
    }
}
