//! Detail content resolution.
//!
//! Resolves a posting's free-text description through a fallback chain:
//! direct section text, embedded frame text, image OCR, and finally a
//! full-page screenshot fed to OCR. Failures along the chain degrade to
//! the next step (or to no content) instead of aborting the posting.

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use scraper::Html;
use uuid::Uuid;

use crate::browser::{BrowserSession, PageHandle};
use crate::error::Result;
use crate::models::{Config, DescriptionSource};
use crate::services::extractor::{element_text, parse_selector};
use crate::services::ocr::OcrProvider;
use crate::utils::{normalize_image_url, resolve_frame_url};

/// Detail content container on the posting page.
const DETAIL_CONTAINER: &str = ".jv_cont.jv_detail";

/// Raster images eligible for OCR inside a detail frame.
const IMAGE_SELECTOR: &str = r#"img[src*=".jpg"], img[src*=".jpeg"], img[src*=".png"]"#;

/// Where resolved content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// Plain text read directly from the container or a plain frame
    Text,
    /// Body text of an image-bearing frame
    IframeText,
    /// Concatenated OCR output
    Ocr,
}

/// Resolved detail content with its provenance.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub content: String,
    pub source: ContentSource,
}

impl ExtractionResult {
    /// Map the provenance onto the persisted description source.
    pub fn description_source(&self) -> DescriptionSource {
        match self.source {
            ContentSource::Ocr => DescriptionSource::Ocr,
            ContentSource::Text | ContentSource::IframeText => DescriptionSource::Text,
        }
    }
}

/// What the detail page's container holds.
struct DetailScan {
    has_container: bool,
    frame_src: Option<String>,
    text: String,
}

fn scan_detail(document: &Html) -> Result<DetailScan> {
    let container_sel = parse_selector(DETAIL_CONTAINER)?;
    let iframe_sel = parse_selector("iframe")?;

    let Some(container) = document.select(&container_sel).next() else {
        return Ok(DetailScan {
            has_container: false,
            frame_src: None,
            text: String::new(),
        });
    };

    let frame_src = container
        .select(&iframe_sel)
        .next()
        .and_then(|f| f.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string);

    Ok(DetailScan {
        has_container: true,
        frame_src,
        text: element_text(&container),
    })
}

/// What an embedded frame document holds.
struct FrameScan {
    image_srcs: Vec<String>,
    body_text: String,
}

fn scan_frame(document: &Html) -> Result<FrameScan> {
    let image_sel = parse_selector(IMAGE_SELECTOR)?;
    let body_sel = parse_selector("body")?;

    let image_srcs = document
        .select(&image_sel)
        .filter_map(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect();

    let body_text = document
        .select(&body_sel)
        .next()
        .map(|b| element_text(&b))
        .unwrap_or_default();

    Ok(FrameScan {
        image_srcs,
        body_text,
    })
}

/// Deletes the screenshot scratch file when it goes out of scope, whether
/// or not OCR succeeded.
struct TempScreenshot {
    path: PathBuf,
}

impl TempScreenshot {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempScreenshot {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Resolves detail content for one posting at a time.
pub struct DescriptionResolver<'a, S: BrowserSession> {
    session: &'a S,
    ocr: &'a dyn OcrProvider,
    config: &'a Config,
}

impl<'a, S: BrowserSession> DescriptionResolver<'a, S> {
    pub fn new(session: &'a S, ocr: &'a dyn OcrProvider, config: &'a Config) -> Self {
        Self {
            session,
            ocr,
            config,
        }
    }

    /// Resolve the description for a detail page already rendered into
    /// `detail_html`. Returns `None` when the page has no detail container
    /// or when frame processing fails.
    pub async fn resolve(&self, detail_html: &str) -> Option<ExtractionResult> {
        let scan = match scan_detail(&Html::parse_document(detail_html)) {
            Ok(scan) => scan,
            Err(e) => {
                log::error!("Detail scan failed: {}", e);
                return None;
            }
        };

        if !scan.has_container {
            return None;
        }

        let Some(frame_src) = scan.frame_src else {
            return Some(ExtractionResult {
                content: scan.text,
                source: ContentSource::Text,
            });
        };

        match self.resolve_frame(&frame_src).await {
            Ok(result) => Some(result),
            Err(e) => {
                log::warn!("Detail frame processing failed ({}): {}", frame_src, e);
                None
            }
        }
    }

    /// Open the embedded frame in an isolated page and read its content.
    /// The page is closed on both the success and failure paths.
    async fn resolve_frame(&self, frame_src: &str) -> Result<ExtractionResult> {
        let frame_url = resolve_frame_url(&self.config.site.origin, frame_src);
        let page = self.session.new_page()?;
        let result = self.frame_content(&page, &frame_url).await;
        if let Err(e) = page.close() {
            log::debug!("Failed to close frame page: {}", e);
        }
        result
    }

    async fn frame_content(&self, page: &S::Page, frame_url: &str) -> Result<ExtractionResult> {
        page.goto(frame_url)?;
        tokio::time::sleep(std::time::Duration::from_millis(
            self.config.crawler.iframe_settle_ms,
        ))
        .await;

        let html = page.content()?;
        let scan = scan_frame(&Html::parse_document(&html))?;

        if scan.image_srcs.is_empty() {
            return Ok(ExtractionResult {
                content: scan.body_text,
                source: ContentSource::Text,
            });
        }

        log::info!(
            "Image-bearing detail frame: {} image(s), running OCR",
            scan.image_srcs.len()
        );
        let ocr_result = self.ocr_page(page, frame_url).await?;

        if self.config.ocr.ocr_preferred && !ocr_result.content.is_empty() {
            Ok(ocr_result)
        } else {
            Ok(ExtractionResult {
                content: scan.body_text,
                source: ContentSource::IframeText,
            })
        }
    }

    /// OCR every matching image on the page, in DOM order. A page without
    /// matching images falls back to a full-page screenshot.
    pub async fn ocr_page(&self, page: &S::Page, page_url: &str) -> Result<ExtractionResult> {
        let html = page.content()?;
        let srcs = scan_frame(&Html::parse_document(&html))?.image_srcs;

        if srcs.is_empty() {
            log::info!("No OCR-eligible images found; falling back to full-page screenshot");
            let content = self.screenshot_ocr(page).await?;
            return Ok(ExtractionResult {
                content,
                source: ContentSource::Ocr,
            });
        }

        let origin = &self.config.site.origin;
        let mut parts = Vec::new();
        for (index, src) in srcs.iter().enumerate() {
            let image_url = normalize_image_url(origin, page_url, src);
            match self.ocr.recognize(&image_url).await {
                Ok(text) if !text.is_empty() => parts.push(text),
                Ok(_) => {}
                // A single failed image never aborts the batch.
                Err(e) => log::warn!(
                    "OCR failed for image {}/{} ({}): {}",
                    index + 1,
                    srcs.len(),
                    image_url,
                    e
                ),
            }
        }

        Ok(ExtractionResult {
            content: parts.join("\n\n").trim().to_string(),
            source: ContentSource::Ocr,
        })
    }

    /// Screenshot the page into a uniquely named scratch file, submit it
    /// as a data URL, and delete the file regardless of the OCR outcome.
    async fn screenshot_ocr(&self, page: &S::Page) -> Result<String> {
        let work_dir = Path::new(&self.config.storage.work_dir);
        tokio::fs::create_dir_all(work_dir).await?;

        let shot = TempScreenshot::new(work_dir.join(format!("{}.png", Uuid::new_v4())));
        page.screenshot(shot.path())?;

        let bytes = tokio::fs::read(shot.path()).await?;
        let data_url = format!("data:image/png;base64,{}", BASE64.encode(&bytes));
        self.ocr.recognize(&data_url).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::error::AppError;

    /// Page content sentinel that makes `content()` fail.
    const BROKEN: &str = "<<broken>>";

    struct FakePage {
        pages: Arc<HashMap<String, String>>,
        current: Mutex<Option<String>>,
    }

    impl PageHandle for FakePage {
        fn goto(&self, url: &str) -> crate::error::Result<()> {
            if self.pages.contains_key(url) {
                *self.current.lock().unwrap() = Some(url.to_string());
                Ok(())
            } else {
                Err(AppError::browser(format!("navigation failed: {url}")))
            }
        }

        fn content(&self) -> crate::error::Result<String> {
            let current = self.current.lock().unwrap();
            let url = current.as_ref().ok_or_else(|| AppError::browser("no page"))?;
            let html = &self.pages[url];
            if html == BROKEN {
                return Err(AppError::browser("content serialization failed"));
            }
            Ok(html.clone())
        }

        fn screenshot(&self, path: &Path) -> crate::error::Result<()> {
            std::fs::write(path, b"fake-png-bytes")?;
            Ok(())
        }

        fn close(&self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct FakeSession {
        pages: Arc<HashMap<String, String>>,
    }

    impl FakeSession {
        fn new(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: Arc::new(
                    pages
                        .iter()
                        .map(|(u, h)| (u.to_string(), h.to_string()))
                        .collect(),
                ),
            }
        }

        fn open(&self, url: &str) -> FakePage {
            let page = FakePage {
                pages: Arc::clone(&self.pages),
                current: Mutex::new(None),
            };
            page.goto(url).unwrap();
            page
        }
    }

    impl BrowserSession for FakeSession {
        type Page = FakePage;

        fn new_page(&self) -> crate::error::Result<FakePage> {
            Ok(FakePage {
                pages: Arc::clone(&self.pages),
                current: Mutex::new(None),
            })
        }

        fn close(self) -> crate::error::Result<()> {
            Ok(())
        }
    }

    /// Records submitted images; fails for URLs containing `fail`.
    struct FakeOcr {
        calls: Mutex<Vec<String>>,
    }

    impl FakeOcr {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OcrProvider for FakeOcr {
        async fn recognize(&self, image: &str) -> crate::error::Result<String> {
            self.calls.lock().unwrap().push(image.to_string());
            if image.contains("fail") {
                return Err(AppError::ocr(image, "provider rejected image"));
            }
            if image.starts_with("data:") {
                return Ok("스크린샷 텍스트".to_string());
            }
            Ok(format!("텍스트[{image}]"))
        }
    }

    fn test_config(work_dir: &Path) -> Config {
        let mut config = Config::default();
        config.crawler.iframe_settle_ms = 0;
        config.storage.work_dir = work_dir.to_string_lossy().to_string();
        config
    }

    const FRAME_URL: &str = "https://www.saramin.co.kr/frame/1";

    #[tokio::test]
    async fn test_direct_text_without_frame() {
        let session = FakeSession::new(&[]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let html = r#"<div class="jv_cont jv_detail">주요 업무: 백엔드 개발</div>"#;
        let result = resolver.resolve(html).await.unwrap();
        assert_eq!(result.source, ContentSource::Text);
        assert_eq!(result.content, "주요 업무: 백엔드 개발");
    }

    #[tokio::test]
    async fn test_missing_container_yields_none() {
        let session = FakeSession::new(&[]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        assert!(resolver.resolve("<div>no detail here</div>").await.is_none());
    }

    #[tokio::test]
    async fn test_frame_without_images_returns_body_text() {
        let session = FakeSession::new(&[(
            FRAME_URL,
            "<html><body>프레임 본문 내용</body></html>",
        )]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let html = r#"<div class="jv_cont jv_detail"><iframe src="/frame/1"></iframe></div>"#;
        let result = resolver.resolve(html).await.unwrap();
        assert_eq!(result.source, ContentSource::Text);
        assert_eq!(result.content, "프레임 본문 내용");
        assert!(ocr.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_broken_frame_degrades_to_none() {
        let session = FakeSession::new(&[(FRAME_URL, BROKEN)]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let html = r#"<div class="jv_cont jv_detail"><iframe src="/frame/1"></iframe></div>"#;
        assert!(resolver.resolve(html).await.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_frame_degrades_to_none() {
        let session = FakeSession::new(&[]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let html = r#"<div class="jv_cont jv_detail"><iframe src="/frame/404"></iframe></div>"#;
        assert!(resolver.resolve(html).await.is_none());
    }

    #[tokio::test]
    async fn test_image_frame_returns_body_text_by_default() {
        let session = FakeSession::new(&[(
            FRAME_URL,
            r#"<html><body><img src="/img/a.jpg">공고 본문</body></html>"#,
        )]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let html = r#"<div class="jv_cont jv_detail"><iframe src="/frame/1"></iframe></div>"#;
        let result = resolver.resolve(html).await.unwrap();
        // OCR ran, but the frame body text is what comes back.
        assert_eq!(result.source, ContentSource::IframeText);
        assert_eq!(result.content, "공고 본문");
        assert_eq!(ocr.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_image_frame_returns_ocr_when_preferred() {
        let session = FakeSession::new(&[(
            FRAME_URL,
            r#"<html><body><img src="/img/a.jpg">공고 본문</body></html>"#,
        )]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.ocr.ocr_preferred = true;
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let html = r#"<div class="jv_cont jv_detail"><iframe src="/frame/1"></iframe></div>"#;
        let result = resolver.resolve(html).await.unwrap();
        assert_eq!(result.source, ContentSource::Ocr);
        assert_eq!(
            result.content,
            "텍스트[https://www.saramin.co.kr/img/a.jpg]"
        );
    }

    #[tokio::test]
    async fn test_single_image_failure_never_aborts_batch() {
        let session = FakeSession::new(&[(
            FRAME_URL,
            r#"<html><body><img src="/img/fail.jpg"><img src="/img/ok.png"></body></html>"#,
        )]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let page = session.open(FRAME_URL);
        let result = resolver.ocr_page(&page, FRAME_URL).await.unwrap();
        assert_eq!(result.source, ContentSource::Ocr);
        assert_eq!(
            result.content,
            "텍스트[https://www.saramin.co.kr/img/ok.png]"
        );
        assert_eq!(ocr.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_screenshot_fallback_cleans_up_temp_file() {
        let session = FakeSession::new(&[(FRAME_URL, "<html><body>이미지 없음</body></html>")]);
        let ocr = FakeOcr::new();
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let page = session.open(FRAME_URL);
        let result = resolver.ocr_page(&page, FRAME_URL).await.unwrap();
        assert_eq!(result.content, "스크린샷 텍스트");
        assert_eq!(result.source, ContentSource::Ocr);

        // The data URL reached the provider and the scratch file is gone.
        let calls = ocr.calls.lock().unwrap();
        assert!(calls[0].starts_with("data:image/png;base64,"));
        let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn test_screenshot_temp_file_deleted_on_ocr_failure() {
        struct AlwaysFailOcr;

        #[async_trait]
        impl OcrProvider for AlwaysFailOcr {
            async fn recognize(&self, image: &str) -> crate::error::Result<String> {
                Err(AppError::ocr(image, "boom"))
            }
        }

        let session = FakeSession::new(&[(FRAME_URL, "<html><body>이미지 없음</body></html>")]);
        let ocr = AlwaysFailOcr;
        let tmp = tempfile::TempDir::new().unwrap();
        let config = test_config(tmp.path());
        let resolver = DescriptionResolver::new(&session, &ocr, &config);

        let page = session.open(FRAME_URL);
        assert!(resolver.ocr_page(&page, FRAME_URL).await.is_err());

        let leftovers: Vec<_> = std::fs::read_dir(tmp.path()).unwrap().collect();
        assert!(leftovers.is_empty());
    }
}
