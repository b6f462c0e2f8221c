//! Image reference checks with a static placeholder fallback.

use super::Resolved;

use regex::Regex;
use std::net::{IpAddr, SocketAddr};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Served when an image cannot be loaded.
pub const PLACEHOLDER_SRC: &str = "/static/placeholder.svg";

/// Image check error types.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("not a base64 image data URL")]
    InvalidDataUrl,
    #[error("image request timed out after {0:?}")]
    Timeout(Duration),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response: {0}")]
    BadResponse(String),
    #[error("unsupported image reference: {0}")]
    Unsupported(String),
    #[error("refusing non-public host {0}")]
    Forbidden(String),
}

fn data_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^data:image/(png|jpeg|jpg|gif|webp|bmp|svg\+xml);base64,[A-Za-z0-9+/]+={0,2}$")
            .expect("data URL pattern compiles")
    })
}

/// Check that `s` is an inline base64 image.
pub fn validate_data_url(s: &str) -> Result<(), ImageError> {
    if data_url_pattern().is_match(s) {
        Ok(())
    } else {
        Err(ImageError::InvalidDataUrl)
    }
}

/// Checks image references and substitutes the placeholder for broken ones.
///
/// Remote checks only reach public addresses and never follow redirects.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    timeout: Duration,
}

impl ImageResolver {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Verify that `src` points at a loadable image.
    pub async fn check(&self, src: &str) -> Result<(), ImageError> {
        if src.starts_with("data:") {
            return validate_data_url(src);
        }

        let url = reqwest::Url::parse(src)
            .map_err(|e| ImageError::Unsupported(format!("{} ({})", truncate(src, 64), e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ImageError::Unsupported(src.to_string()));
        }

        let host = url
            .host_str()
            .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
            .ok_or_else(|| ImageError::Unsupported(src.to_string()))?;
        let port = url.port_or_known_default().unwrap_or(80);

        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::none());

        // Pin the vetted address so the request cannot be re-resolved elsewhere
        match host.parse::<IpAddr>() {
            Ok(ip) if !is_public_ip(ip) => return Err(ImageError::Forbidden(host.to_string())),
            Ok(_) => {}
            Err(_) => {
                let addr = self.lookup_public(host, port).await?;
                builder = builder.resolve(host, addr);
            }
        }

        let client = builder.build().map_err(|e| ImageError::Network(e.to_string()))?;

        let response = client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                ImageError::Timeout(self.timeout)
            } else {
                ImageError::Network(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(ImageError::BadResponse(format!("status {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !content_type.starts_with("image/") {
            return Err(ImageError::BadResponse(format!("content type {:?}", content_type)));
        }

        Ok(())
    }

    /// Resolve `host` and require every address it maps to be public.
    async fn lookup_public(&self, host: &str, port: u16) -> Result<SocketAddr, ImageError> {
        let addrs: Vec<SocketAddr> = tokio::time::timeout(self.timeout, tokio::net::lookup_host((host, port)))
            .await
            .map_err(|_| ImageError::Timeout(self.timeout))?
            .map_err(|e| ImageError::Network(e.to_string()))?
            .collect();

        if let Some(blocked) = addrs.iter().find(|a| !is_public_ip(a.ip())) {
            return Err(ImageError::Forbidden(format!("{} resolves to {}", host, blocked.ip())));
        }

        addrs
            .first()
            .copied()
            .ok_or_else(|| ImageError::Network(format!("{} has no addresses", host)))
    }

    /// Resolve `src` to itself, or to the placeholder if it cannot load.
    pub async fn resolve(&self, src: &str) -> Resolved<String> {
        match self.check(src).await {
            Ok(()) => Resolved::Ok(src.to_string()),
            Err(e) => {
                tracing::debug!("Image {} unavailable: {}", truncate(src, 64), e);
                Resolved::Fallback(PLACEHOLDER_SRC.to_string())
            }
        }
    }
}

/// Render an image element, or the "Image unavailable" placeholder.
pub fn render_image(image: &Resolved<String>, alt: &str) -> String {
    match image {
        Resolved::Ok(src) => format!(
            r#"<img src="{}" alt="{}" loading="lazy">"#,
            escape_html(src),
            escape_html(alt)
        ),
        Resolved::Fallback(_) => format!(
            r#"<div class="image-fallback" role="img" aria-label="{}"><span>Image unavailable</span></div>"#,
            escape_html(alt)
        ),
    }
}

/// Whether `ip` is globally routable: not loopback, private, link-local,
/// shared, documentation or multicast space.
fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, _, _] = v4.octets();
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_multicast()
                || a == 0
                || (a == 100 && (64..128).contains(&b)))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

    #[test]
    fn test_validate_data_url() {
        assert!(validate_data_url(TINY_PNG).is_ok());
        assert!(validate_data_url("data:text/plain;base64,aGVsbG8=").is_err());
        assert!(validate_data_url("data:image/png;base64,").is_err());
        assert!(validate_data_url("not an image").is_err());
    }

    #[tokio::test]
    async fn test_inline_image_resolves() {
        let resolver = ImageResolver::new(Duration::from_millis(100));
        let resolved = resolver.resolve(TINY_PNG).await;
        assert_eq!(resolved, Resolved::Ok(TINY_PNG.to_string()));
    }

    #[tokio::test]
    async fn test_broken_image_falls_back() {
        let resolver = ImageResolver::new(Duration::from_millis(100));
        let resolved = resolver.resolve("http://256.256.256.256/wave.jpg").await;
        assert_eq!(resolved, Resolved::Fallback(PLACEHOLDER_SRC.to_string()));

        let html = render_image(&resolved, "Marina Beach");
        assert!(html.contains("Image unavailable"));
        assert!(!html.contains("<img"));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_falls_back() {
        let resolver = ImageResolver::new(Duration::from_millis(100));
        assert!(matches!(
            resolver.check("ftp://example.com/a.png").await,
            Err(ImageError::Unsupported(_))
        ));
        assert!(resolver.resolve("ftp://example.com/a.png").await.is_fallback());
    }

    #[test]
    fn test_render_escapes_attributes() {
        let html = render_image(&Resolved::Ok("/a.png".to_string()), r#"say "hi" <now>"#);
        assert!(html.starts_with("<img"));
        assert!(html.contains("say &quot;hi&quot; &lt;now&gt;"));
    }

    #[tokio::test]
    async fn test_loopback_source_is_never_fetched() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.set_nonblocking(true).unwrap();
        let port = listener.local_addr().unwrap().port();
        let resolver = ImageResolver::new(Duration::from_millis(500));

        let src = format!("http://127.0.0.1:{}/admin/secret.png", port);
        assert!(matches!(resolver.check(&src).await, Err(ImageError::Forbidden(_))));
        assert_eq!(resolver.resolve(&src).await, Resolved::Fallback(PLACEHOLDER_SRC.to_string()));

        let by_name = format!("http://localhost:{}/admin/secret.png", port);
        assert!(resolver.resolve(&by_name).await.is_fallback());

        let err = listener.accept().unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
    }

    #[test]
    fn test_non_public_ranges() {
        for blocked in [
            "127.0.0.1",
            "10.1.2.3",
            "172.16.5.4",
            "192.168.1.1",
            "169.254.169.254",
            "100.64.0.1",
            "0.0.0.0",
            "::1",
            "fe80::1",
            "fd00::1",
            "::ffff:127.0.0.1",
        ] {
            assert!(!is_public_ip(blocked.parse().unwrap()), "{} should be blocked", blocked);
        }

        for public in ["93.184.216.34", "2606:4700::1111"] {
            assert!(is_public_ip(public.parse().unwrap()), "{} should be public", public);
        }
    }
}
