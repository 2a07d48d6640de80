pub mod encode;

use std::time::Duration;

use image::DynamicImage;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_secs(1);

/// Fetches a resource body. Every error is treated as transient.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait HttpGet: Send + Sync {
    async fn get(&self, url: &str) -> Result<Vec<u8>, anyhow::Error>;
}

pub struct ReqwestHttp {
    client: reqwest::Client,
}

impl ReqwestHttp {
    pub fn new(timeout: Duration) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl HttpGet for ReqwestHttp {
    async fn get(&self, url: &str) -> Result<Vec<u8>, anyhow::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Delay before the retry that follows a failed `attempt` (0-indexed).
pub fn backoff_delay(unit: Duration, attempt: u32) -> Duration {
    unit.saturating_mul(2u32.saturating_pow(attempt))
}

pub struct ArtworkFetcher {
    http: Box<dyn HttpGet>,
    max_retries: u32,
    backoff_unit: Duration,
}

impl ArtworkFetcher {
    pub fn new(http: Box<dyn HttpGet>, max_retries: u32, backoff_unit: Duration) -> Self {
        Self {
            http,
            max_retries,
            backoff_unit,
        }
    }

    /// Downloads and decodes the image at `url`.
    ///
    /// Transport failures are retried up to `max_retries` attempts in total
    /// with exponential backoff between them. A body that is not a decodable
    /// image is not retried.
    pub async fn fetch(&self, url: &str) -> Option<DynamicImage> {
        for attempt in 0..self.max_retries {
            match self.http.get(url).await {
                Ok(bytes) => {
                    return match image::load_from_memory(&bytes) {
                        Ok(image) => Some(image),
                        Err(e) => {
                            log::error!("Failed to process artwork from {}: {}", url, e);
                            None
                        }
                    };
                }
                Err(e) => {
                    log::warn!(
                        "Attempt {}/{} failed for {}: {:#}",
                        attempt + 1,
                        self.max_retries,
                        url,
                        e
                    );
                    if attempt + 1 < self.max_retries {
                        tokio::time::sleep(backoff_delay(self.backoff_unit, attempt)).await;
                    }
                }
            }
        }
        None
    }
}


#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use tokio::time::Instant;

    use test_support::{http_response, png_bytes, serve};

    const URL: &str = "https://art.example/cover.png";

    fn fetcher(http: MockHttpGet, max_retries: u32) -> ArtworkFetcher {
        ArtworkFetcher::new(Box::new(http), max_retries, Duration::from_secs(1))
    }

    #[test]
    fn backoff_doubles_each_attempt() {
        let unit = Duration::from_secs(1);
        let delays: Vec<Duration> = (0..5).map(|a| backoff_delay(unit, a)).collect();

        assert_eq!(
            delays,
            vec![1, 2, 4, 8, 16]
                .into_iter()
                .map(Duration::from_secs)
                .collect::<Vec<_>>()
        );
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn backoff_saturates() {
        assert_eq!(backoff_delay(Duration::from_secs(1), 200), Duration::from_secs(u32::MAX as u64));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_image_on_first_success() {
        let mut http = MockHttpGet::new();
        http.expect_get()
            .times(1)
            .returning(|_| Ok(png_bytes(8, 8)));

        let start = Instant::now();
        let image = fetcher(http, 3).fetch(URL).await.unwrap();

        assert_eq!((image.width(), image.height()), (8, 8));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let mut http = MockHttpGet::new();
        http.expect_get()
            .times(3)
            .returning(|_| Err(anyhow::anyhow!("connection reset")));

        let start = Instant::now();
        let image = fetcher(http, 3).fetch(URL).await;

        assert!(image.is_none());
        // 1s after the first attempt, 2s after the second, none after the last
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failure() {
        let mut http = MockHttpGet::new();
        let mut seq = mockall::Sequence::new();
        http.expect_get()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(anyhow::anyhow!("503 Service Unavailable")));
        http.expect_get()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(png_bytes(4, 4)));

        let start = Instant::now();
        let image = fetcher(http, 3).fetch(URL).await;

        assert!(image.is_some());
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn undecodable_body_is_not_retried() {
        let mut http = MockHttpGet::new();
        http.expect_get()
            .times(1)
            .returning(|_| Ok(b"<html>not an image</html>".to_vec()));

        let start = Instant::now();
        let image = fetcher(http, 3).fetch(URL).await;

        assert!(image.is_none());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn single_attempt_never_sleeps() {
        let mut http = MockHttpGet::new();
        http.expect_get()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("timed out")));

        let start = Instant::now();
        assert!(fetcher(http, 1).fetch(URL).await.is_none());
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn server_errors_are_retried_until_attempts_run_out() {
        let (base, hits) = serve(|_, _| {
            Some(http_response("503 Service Unavailable", "text/plain", b""))
        })
        .await;
        let fetcher = ArtworkFetcher::new(
            Box::new(ReqwestHttp::new(Duration::from_secs(10)).unwrap()),
            3,
            Duration::from_millis(10),
        );

        let image = fetcher.fetch(&format!("{}/cover.png", base)).await;

        assert!(image.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn recovers_when_server_comes_back() {
        let (base, hits) = serve(|hit, _| {
            Some(if hit == 0 {
                http_response("500 Internal Server Error", "text/plain", b"")
            } else {
                http_response("200 OK", "image/png", &png_bytes(6, 6))
            })
        })
        .await;
        let fetcher = ArtworkFetcher::new(
            Box::new(ReqwestHttp::new(Duration::from_secs(10)).unwrap()),
            3,
            Duration::from_millis(10),
        );

        let image = fetcher.fetch(&format!("{}/cover.png", base)).await.unwrap();

        assert_eq!((image.width(), image.height()), (6, 6));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn request_timeout_bounds_a_silent_server() {
        let (base, hits) = serve(|_, _| None).await;
        let fetcher = ArtworkFetcher::new(
            Box::new(ReqwestHttp::new(Duration::from_millis(200)).unwrap()),
            2,
            Duration::from_millis(10),
        );

        let started = std::time::Instant::now();
        let image = tokio::time::timeout(
            Duration::from_secs(5),
            fetcher.fetch(&format!("{}/cover.png", base)),
        )
        .await
        .expect("fetch should give up on its own");

        assert!(image.is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_millis(400));
    }
}
