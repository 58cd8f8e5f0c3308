//! Utility functions and helpers.

use url::Url;

/// Absolutize an embedded frame URL against the site origin.
pub fn resolve_frame_url(origin: &str, src: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        src.to_string()
    } else {
        format!("{origin}{src}")
    }
}

/// Normalize an image `src` to an absolute URL.
///
/// Rules, in priority order:
/// 1. already absolute → unchanged
/// 2. protocol-relative (`//host/...`) → prefixed with `https:`
/// 3. root-relative (`/...`) → prefixed with the site origin
/// 4. otherwise → resolved against the current document's directory
pub fn normalize_image_url(origin: &str, page_url: &str, src: &str) -> String {
    if src.starts_with("http://") || src.starts_with("https://") {
        return src.to_string();
    }
    if src.starts_with("//") {
        return format!("https:{src}");
    }
    if src.starts_with('/') {
        return format!("{origin}{src}");
    }

    match Url::parse(page_url).and_then(|base| base.join(src)) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => format!("{origin}/{src}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://www.saramin.co.kr";

    #[test]
    fn test_resolve_frame_url() {
        assert_eq!(
            resolve_frame_url(ORIGIN, "/zf_user/jobs/iframe?rec_idx=1"),
            "https://www.saramin.co.kr/zf_user/jobs/iframe?rec_idx=1"
        );
        assert_eq!(
            resolve_frame_url(ORIGIN, "https://img.example.com/frame"),
            "https://img.example.com/frame"
        );
    }

    #[test]
    fn test_normalize_absolute_url() {
        assert_eq!(
            normalize_image_url(ORIGIN, "https://www.saramin.co.kr/p/", "https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }

    #[test]
    fn test_normalize_protocol_relative() {
        assert_eq!(
            normalize_image_url(ORIGIN, "https://www.saramin.co.kr/p/", "//cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn test_normalize_root_relative() {
        assert_eq!(
            normalize_image_url(ORIGIN, "https://www.saramin.co.kr/p/x", "/img/a.jpg"),
            "https://www.saramin.co.kr/img/a.jpg"
        );
    }

    #[test]
    fn test_normalize_directory_relative() {
        assert_eq!(
            normalize_image_url(ORIGIN, "https://www.saramin.co.kr/posting/view.html", "a.jpg"),
            "https://www.saramin.co.kr/posting/a.jpg"
        );
        assert_eq!(
            normalize_image_url(ORIGIN, "https://www.saramin.co.kr/posting/", "img/a.jpg"),
            "https://www.saramin.co.kr/posting/img/a.jpg"
        );
    }
}
