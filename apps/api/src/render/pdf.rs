use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use futures::StreamExt;
use tracing::{debug, warn};

use super::{PdfEngine, RenderError};

const MM_PER_INCH: f64 = 25.4;
const A4_WIDTH_IN: f64 = 210.0 / MM_PER_INCH;
const A4_HEIGHT_IN: f64 = 297.0 / MM_PER_INCH;
/// 40pt expressed in inches.
const MARGIN_IN: f64 = 40.0 / 72.0;
/// How long a closed or killed browser gets to exit before it is abandoned.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Prints HTML through a headless Chromium started for each call.
///
/// Each render gets a fresh browser with a throwaway profile directory, and
/// that browser is closed (or killed) before `print` returns on every path.
pub struct ChromiumPdfEngine {
    executable: Option<PathBuf>,
    settle_timeout: Duration,
}

impl ChromiumPdfEngine {
    pub fn new(executable: Option<PathBuf>, settle_timeout: Duration) -> Self {
        Self {
            executable,
            settle_timeout,
        }
    }

    fn browser_config(&self, profile_dir: &std::path::Path) -> Result<BrowserConfig, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(profile_dir)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .launch_timeout(self.settle_timeout)
            .request_timeout(self.settle_timeout);

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        builder.build().map_err(RenderError::Engine)
    }
}

fn print_params() -> PrintToPdfParams {
    PrintToPdfParams {
        print_background: Some(true),
        paper_width: Some(A4_WIDTH_IN),
        paper_height: Some(A4_HEIGHT_IN),
        margin_top: Some(MARGIN_IN),
        margin_bottom: Some(MARGIN_IN),
        margin_left: Some(MARGIN_IN),
        margin_right: Some(MARGIN_IN),
        ..Default::default()
    }
}

async fn print_html(browser: &Browser, html: &str) -> Result<Vec<u8>, RenderError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| RenderError::Engine(e.to_string()))?;

    page.set_content(html)
        .await
        .map_err(|e| RenderError::Print(e.to_string()))?;

    page.pdf(print_params())
        .await
        .map_err(|e| RenderError::Print(e.to_string()))
}

#[async_trait]
impl PdfEngine for ChromiumPdfEngine {
    async fn print(&self, html: &str) -> Result<Vec<u8>, RenderError> {
        let profile_dir = tempfile::Builder::new()
            .prefix("tailor-chromium-")
            .tempdir()
            .map_err(|e| RenderError::Engine(format!("profile dir: {e}")))?;

        let config = self.browser_config(profile_dir.path())?;
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Engine(e.to_string()))?;

        // Keep draining after errors: the CDP channel must stay open for close().
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {e}");
                }
            }
        });

        let printed = tokio::time::timeout(self.settle_timeout, print_html(&browser, html))
            .await
            .unwrap_or(Err(RenderError::Timeout(self.settle_timeout)));

        shutdown(&mut browser, SHUTDOWN_GRACE).await;
        handler_task.abort();

        let pdf = printed?;
        debug!("Printed {} PDF bytes", pdf.len());
        Ok(pdf)
    }
}

/// The parts of a running browser process that shutdown needs.
#[async_trait]
trait BrowserProcess: Send {
    async fn close(&mut self) -> Result<(), String>;
    async fn wait(&mut self) -> Result<(), String>;
    async fn kill(&mut self);
}

#[async_trait]
impl BrowserProcess for Browser {
    async fn close(&mut self) -> Result<(), String> {
        Browser::close(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn wait(&mut self) -> Result<(), String> {
        Browser::wait(self).await.map(|_| ()).map_err(|e| e.to_string())
    }

    async fn kill(&mut self) {
        if let Some(Err(e)) = Browser::kill(self).await {
            warn!("Failed to kill headless browser: {e}");
        }
    }
}

/// Closes the browser, killing it when close fails or it does not exit
/// within `grace`. Returns after at most two `grace` periods.
async fn shutdown<B: BrowserProcess + ?Sized>(browser: &mut B, grace: Duration) {
    if let Err(e) = browser.close().await {
        warn!("Failed to close headless browser ({e}); killing it");
        browser.kill().await;
    }

    match tokio::time::timeout(grace, browser.wait()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Headless browser did not exit cleanly: {e}"),
        Err(_) => {
            warn!("Headless browser still running after {grace:?}; killing it");
            browser.kill().await;
            if tokio::time::timeout(grace, browser.wait()).await.is_err() {
                warn!("Headless browser did not exit after kill; abandoning it");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Scripted process: `wait` only returns once killed, unless `exits_on_close`.
    #[derive(Default)]
    struct FakeBrowser {
        close_fails: bool,
        exits_on_close: bool,
        closed: bool,
        kills: usize,
    }

    #[async_trait]
    impl BrowserProcess for FakeBrowser {
        async fn close(&mut self) -> Result<(), String> {
            if self.close_fails {
                return Err("channel closed".to_string());
            }
            self.closed = true;
            Ok(())
        }

        async fn wait(&mut self) -> Result<(), String> {
            if self.kills > 0 || (self.closed && self.exits_on_close) {
                return Ok(());
            }
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn kill(&mut self) {
            self.kills += 1;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_close_does_not_kill() {
        let mut browser = FakeBrowser {
            exits_on_close: true,
            ..Default::default()
        };
        shutdown(&mut browser, SHUTDOWN_GRACE).await;
        assert!(browser.closed);
        assert_eq!(browser.kills, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_close_kills_instead_of_hanging() {
        let mut browser = FakeBrowser {
            close_fails: true,
            ..Default::default()
        };
        shutdown(&mut browser, SHUTDOWN_GRACE).await;
        assert_eq!(browser.kills, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_browser_ignoring_close_is_killed_after_grace() {
        let mut browser = FakeBrowser::default();
        let started = tokio::time::Instant::now();

        shutdown(&mut browser, SHUTDOWN_GRACE).await;

        assert!(browser.closed);
        assert_eq!(browser.kills, 1);
        assert!(started.elapsed() >= SHUTDOWN_GRACE);
        assert!(started.elapsed() < SHUTDOWN_GRACE * 2);
    }

    #[test]
    fn test_print_params_are_a4_with_40pt_margins() {
        let params = print_params();
        assert_eq!(params.print_background, Some(true));
        assert!((params.paper_width.unwrap() - 8.2677).abs() < 1e-3);
        assert!((params.paper_height.unwrap() - 11.6929).abs() < 1e-3);
        for margin in [
            params.margin_top,
            params.margin_bottom,
            params.margin_left,
            params.margin_right,
        ] {
            assert!((margin.unwrap() - 0.5556).abs() < 1e-3);
        }
    }

    #[test]
    fn test_browser_config_accepts_explicit_executable() {
        let engine = ChromiumPdfEngine::new(
            Some(PathBuf::from("/usr/bin/chromium")),
            Duration::from_secs(30),
        );
        let dir = tempfile::tempdir().unwrap();
        assert!(engine.browser_config(dir.path()).is_ok());
    }
}
