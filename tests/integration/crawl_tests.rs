//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test the full
//! crawl cycle end-to-end, plus a scripted in-memory transport for the
//! frontier, termination and cancellation properties.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use sumi_sweep::config::{
    CompletionSpec, Config, CrawlerConfig, JobConfig, OutputConfig, UserAgentConfig,
};
use sumi_sweep::crawler::{
    run_crawl, CrawlJob, Crawler, MaxPagesCrawledCondition, RetryPolicy,
    RollingWindowRateLimiter, FRONTIER_CAPACITY,
};
use sumi_sweep::transport::{Cookie, HttpResponse, HttpTransport, Transport};
use sumi_sweep::SumiError;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a user agent configuration for tests
fn create_test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
        proxy: None,
    }
}

/// Creates a crawler over real HTTP with a fast starvation policy
fn create_http_crawler() -> Crawler {
    let transport = HttpTransport::new(&create_test_user_agent(), Duration::from_secs(5))
        .expect("Failed to build transport");
    let limiter = RollingWindowRateLimiter::new(100, Duration::from_millis(100));
    Crawler::new(Arc::new(transport), Arc::new(limiter))
        .with_starvation_policy(RetryPolicy::new(3, Duration::from_millis(10)))
        .with_holding_poll(Duration::from_millis(10))
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html_page(body))
        .mount(server)
        .await;
}

async fn mount_robots(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_robots(&mock_server, 200, "User-agent: *\nDisallow: /private").await;
    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<a href="{}/page1">Page 1</a>
               <a href="/page2">Page 2</a>
               <a href="/private/secret">Secret</a>
               <a href="https://other.example.org/">Elsewhere</a>
               <img src="logo.png" />"#,
            base_url
        ),
    )
    .await;
    mount_page(&mock_server, "/page1", r#"<a href="/">Home</a><img src="one.png" />"#).await;
    mount_page(&mock_server, "/page2", r#"<a href="/page1">Page 1</a>"#).await;

    let crawler = create_http_crawler();
    let job = CrawlJob::builder(base_url.as_str())
        .pattern(r#"<img.+?(?<source>src)="(?<sourcename>.+?)""#)
        .workers(2)
        .build()
        .expect("Failed to build job");

    let report = crawler.crawl(job).await.expect("Crawl failed");

    assert_eq!(report.crawl_count(), 3, "/, /page1 and /page2 should be crawled");
    assert!(report.errors().is_empty(), "unexpected errors: {:?}", report.errors());

    let mut data = report.data.clone();
    data.sort();
    assert_eq!(
        data,
        vec![
            ("sourcename".to_string(), "logo.png".to_string()),
            ("sourcename".to_string(), "one.png".to_string()),
        ]
    );

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert!(
        !requests.iter().any(|r| r.url.path().starts_with("/private")),
        "robots.txt disallowed path was fetched"
    );
}

#[tokio::test]
async fn test_robots_disallowing_root_crawls_nothing() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, 200, "User-agent: *\nDisallow: /").await;
    mount_page(&mock_server, "/", r#"<a href="/page1">Page 1</a>"#).await;

    let crawler = create_http_crawler();
    let job = CrawlJob::builder(mock_server.uri().as_str())
        .workers(3)
        .build()
        .unwrap();

    let report = crawler.crawl(job).await.expect("Crawl failed");

    assert_eq!(report.crawl_count(), 0);
    assert_eq!(report.results_count(), 0);

    let requests = mock_server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1, "only robots.txt should be requested");
    assert_eq!(requests[0].url.path(), "/robots.txt");
}

#[tokio::test]
async fn test_robots_server_error_fails_open() {
    let mock_server = MockServer::start().await;

    mount_robots(&mock_server, 503, "User-agent: *\nDisallow: /").await;
    mount_page(&mock_server, "/", r#"<a href="/page1">Page 1</a>"#).await;
    mount_page(&mock_server, "/page1", "done").await;

    let crawler = create_http_crawler();
    let job = CrawlJob::builder(mock_server.uri().as_str()).build().unwrap();

    let report = crawler.crawl(job).await.expect("Crawl failed");

    assert_eq!(report.crawl_count(), 2);
    assert!(report.errors().is_empty());
}

#[tokio::test]
async fn test_dead_links_are_recorded_as_errors() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/gone">Gone</a><a href="/ok">Ok</a>"#).await;
    mount_page(&mock_server, "/ok", "fine").await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let crawler = create_http_crawler();
    let job = CrawlJob::builder(mock_server.uri().as_str()).build().unwrap();

    let report = crawler.crawl(job).await.expect("Crawl failed");

    assert_eq!(report.crawl_count(), 3);
    assert_eq!(report.errors().len(), 1);
    assert!(report.errors()[0].url.ends_with("/gone"));
}

#[tokio::test]
async fn test_cookies_sent_with_every_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("cookie", "over18=1; lang=en"))
        .respond_with(html_page(r#"<a href="/adult">In</a>"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/adult"))
        .and(header("cookie", "over18=1; lang=en"))
        .respond_with(html_page("welcome"))
        .mount(&mock_server)
        .await;

    let crawler = create_http_crawler();
    let job = CrawlJob::builder(mock_server.uri().as_str())
        .cookie(Cookie::new("over18", "1"))
        .cookie(Cookie::new("lang", "en"))
        .build()
        .unwrap();

    let report = crawler.crawl(job).await.expect("Crawl failed");

    assert_eq!(report.crawl_count(), 2);
    assert!(report.errors().is_empty(), "cookie-gated pages failed: {:?}", report.errors());
}

#[tokio::test]
async fn test_run_crawl_from_config() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/c">C</a>"#,
    )
    .await;
    for page in ["/a", "/b", "/c"] {
        mount_page(&mock_server, page, r#"<a href="/">Home</a>"#).await;
    }

    let config = Config {
        crawler: CrawlerConfig {
            workers: 2,
            max_accesses_per_window: 100,
            window_ms: 100,
            request_timeout_ms: 5000,
            progress_interval_ms: 0,
        },
        user_agent: create_test_user_agent(),
        output: OutputConfig {
            summary_path: "./unused.md".to_string(),
        },
        job: JobConfig {
            domain: mock_server.uri(),
            seeds: vec![],
            pattern: String::new(),
            follow_links: true,
            completion: vec![CompletionSpec::MaxPages { limit: 2 }],
            enqueue: vec![],
            cookies: vec![],
        },
    };

    let report = run_crawl(&config).await.expect("Crawl failed");

    // Two workers may each pass the check before the count reaches the limit
    assert!(report.crawl_count() >= 2 && report.crawl_count() <= 3);
}

/// In-memory transport serving generated pages
///
/// Every request is counted per path; `/robots.txt` is always 404.
struct ScriptedTransport {
    render: Box<dyn Fn(&str) -> String + Send + Sync>,
    delay: Duration,
    requests: Mutex<HashMap<String, usize>>,
}

impl ScriptedTransport {
    fn new(render: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            render: Box::new(render),
            delay: Duration::ZERO,
            requests: Mutex::new(HashMap::new()),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn request_counts(&self) -> HashMap<String, usize> {
        self.requests.lock().unwrap().clone()
    }

    fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    fn agent_name(&self) -> &str {
        "TestBot"
    }

    async fn execute_request(&self, url: &Url, _cookies: &[Cookie]) -> Result<HttpResponse, SumiError> {
        *self
            .requests
            .lock()
            .unwrap()
            .entry(url.path().to_string())
            .or_default() += 1;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let (status_code, body) = if url.path() == "/robots.txt" {
            (404, String::new())
        } else {
            (200, (self.render)(url.path()))
        };

        Ok(HttpResponse {
            final_url: url.to_string(),
            status_code,
            content_type: Some("text/html".to_string()),
            content_encoding: None,
            body,
        })
    }
}

/// Page `/p{n}` links to `/p{n+1}` through `/p{n+fanout}`; `/` links like `/p0`
fn endless_site(fanout: usize) -> impl Fn(&str) -> String + Send + Sync + 'static {
    move |page: &str| {
        let n: usize = page.trim_start_matches("/p").parse().unwrap_or(0);
        (1..=fanout)
            .map(|i| format!(r#"<a href="/p{}">next</a>"#, n + i))
            .collect()
    }
}

fn create_scripted_crawler(transport: Arc<ScriptedTransport>) -> Crawler {
    let limiter = RollingWindowRateLimiter::new(10_000, Duration::from_millis(10));
    Crawler::new(transport, Arc::new(limiter))
        .with_starvation_policy(RetryPolicy::new(5, Duration::from_millis(10)))
        .with_holding_poll(Duration::from_millis(10))
}

#[tokio::test]
async fn test_frontier_never_exceeds_capacity() {
    let transport = Arc::new(ScriptedTransport::new(|_: &str| {
        (0..FRONTIER_CAPACITY + 500)
            .map(|i| format!(r#"<a href="/link{}">x</a>"#, i))
            .collect()
    }));
    let crawler = create_scripted_crawler(Arc::clone(&transport));
    let job = CrawlJob::builder("https://example.com")
        .completion(MaxPagesCrawledCondition::new(1))
        .build()
        .unwrap();

    let report = crawler.crawl(job).await.unwrap();

    assert_eq!(report.crawl_count(), 1);
    assert_eq!(report.queue_size(), FRONTIER_CAPACITY);
}

#[tokio::test]
async fn test_each_url_fetched_at_most_once() {
    // A small, densely linked site: every page links to every page
    let pages: Vec<String> = (0..30).map(|i| format!("/page{}", i)).collect();
    let links: String = pages
        .iter()
        .map(|p| format!(r#"<a href="{}">x</a>"#, p))
        .collect();
    let transport = Arc::new(ScriptedTransport::new(move |_: &str| links.clone()));
    let crawler = create_scripted_crawler(Arc::clone(&transport));
    let job = CrawlJob::builder("https://example.com")
        .workers(6)
        .build()
        .unwrap();

    let report = crawler.crawl(job).await.unwrap();

    // The seed plus thirty pages
    assert_eq!(report.crawl_count(), 31);
    let counts = transport.request_counts();
    for page in &pages {
        assert_eq!(counts.get(page), Some(&1), "{} fetched more than once", page);
    }
    assert_eq!(counts.get("/"), Some(&1));
}

#[tokio::test]
async fn test_max_pages_halts_crawl() {
    let transport = Arc::new(ScriptedTransport::new(endless_site(3)));
    let crawler = create_scripted_crawler(Arc::clone(&transport));
    let job = CrawlJob::builder("https://example.com")
        .completion(MaxPagesCrawledCondition::new(100))
        .build()
        .unwrap();

    let report = crawler.crawl(job).await.unwrap();

    assert_eq!(report.crawl_count(), 100);
    assert!(report.queue_size() > 0, "frontier should still hold work");
}

#[tokio::test]
async fn test_max_pages_halts_all_workers() {
    let transport = Arc::new(ScriptedTransport::new(endless_site(4)));
    let crawler = create_scripted_crawler(Arc::clone(&transport));
    let job = CrawlJob::builder("https://example.com")
        .completion(MaxPagesCrawledCondition::new(100))
        .workers(4)
        .build()
        .unwrap();

    let report = crawler.crawl(job).await.unwrap();

    // Each worker may pass the check once before observing the limit
    assert!(report.crawl_count() >= 100);
    assert!(report.crawl_count() < 100 + 4);
}

#[tokio::test]
async fn test_cancel_stops_running_crawl() {
    let transport = Arc::new(ScriptedTransport::new(endless_site(2)).with_delay(Duration::from_millis(20)));
    let crawler = Arc::new(create_scripted_crawler(transport));
    let job = CrawlJob::builder("https://example.com")
        .workers(4)
        .build()
        .unwrap();

    let running = Arc::clone(&crawler);
    let handle = tokio::spawn(async move { running.crawl(job).await });

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(crawler.is_running());
    assert!(crawler.progress().is_some());
    crawler.cancel().expect("cancel should succeed while running");

    let report = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("workers did not stop after cancel")
        .unwrap()
        .expect("cancelled crawl should still return a report");

    assert!(report.crawl_count() > 0);
    assert!(!crawler.is_running());
    assert!(matches!(crawler.cancel(), Err(SumiError::NotRunning)));
}

#[tokio::test]
async fn test_cancel_releases_held_workers() {
    // A single page with no links: workers 1.. never leave the holding
    // pattern, and worker 0 sits in the starvation backoff
    let transport = Arc::new(ScriptedTransport::new(|_: &str| String::new()));
    let limiter = RollingWindowRateLimiter::new(100, Duration::from_millis(10));
    let crawler = Arc::new(
        Crawler::new(transport, Arc::new(limiter))
            .with_starvation_policy(RetryPolicy::new(1000, Duration::from_millis(1)))
            .with_holding_poll(Duration::from_millis(10)),
    );
    let job = CrawlJob::builder("https://example.com")
        .workers(3)
        .build()
        .unwrap();

    let running = Arc::clone(&crawler);
    let handle = tokio::spawn(async move { running.crawl(job).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    crawler.cancel().unwrap();

    let report = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("held workers did not observe cancellation")
        .unwrap()
        .unwrap();

    assert_eq!(report.crawl_count(), 1);
}

#[tokio::test]
async fn test_cancel_during_default_starvation_backoff_is_prompt() {
    // Default policy: backoff steps grow by 200ms, so by now worker 0 is in
    // the middle of a long sleep
    let transport = Arc::new(ScriptedTransport::new(|_: &str| String::new()));
    let limiter = RollingWindowRateLimiter::new(100, Duration::from_millis(10));
    let crawler = Arc::new(Crawler::new(transport, Arc::new(limiter)));
    let job = CrawlJob::builder("https://example.com")
        .workers(2)
        .build()
        .unwrap();

    let running = Arc::clone(&crawler);
    let handle = tokio::spawn(async move { running.crawl(job).await });

    tokio::time::sleep(Duration::from_millis(1300)).await;
    assert!(crawler.is_running());

    let cancelled_at = std::time::Instant::now();
    crawler.cancel().unwrap();
    let report = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("crawl did not stop after cancel")
        .unwrap()
        .unwrap();

    assert!(
        cancelled_at.elapsed() < Duration::from_millis(250),
        "cancel took {:?}",
        cancelled_at.elapsed()
    );
    assert_eq!(report.crawl_count(), 1);
}

#[tokio::test]
async fn test_dropped_crawl_stops_its_workers() {
    let transport = Arc::new(ScriptedTransport::new(endless_site(3)).with_delay(Duration::from_millis(10)));
    let crawler = create_scripted_crawler(Arc::clone(&transport));
    let job = CrawlJob::builder("https://example.com")
        .workers(2)
        .build()
        .unwrap();

    let outcome = tokio::time::timeout(Duration::from_millis(200), crawler.crawl(job)).await;
    assert!(outcome.is_err(), "endless crawl should not finish on its own");
    assert!(!crawler.is_running());

    let at_drop = transport.total_requests();
    assert!(at_drop > 0);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(
        transport.total_requests(),
        at_drop,
        "workers kept fetching after the crawl was dropped"
    );
}

#[tokio::test]
async fn test_second_crawl_while_running_fails() {
    let transport = Arc::new(ScriptedTransport::new(endless_site(2)).with_delay(Duration::from_millis(20)));
    let crawler = Arc::new(create_scripted_crawler(transport));
    let job = CrawlJob::builder("https://example.com").build().unwrap();

    let running = Arc::clone(&crawler);
    let first = job.clone();
    let handle = tokio::spawn(async move { running.crawl(first).await });

    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = crawler.crawl(job).await;
    assert!(matches!(second, Err(SumiError::AlreadyRunning)));

    crawler.cancel().unwrap();
    assert!(handle.await.unwrap().is_ok());
    assert!(!crawler.is_running());
}

#[tokio::test]
async fn test_crawler_is_reusable() {
    let transport = Arc::new(ScriptedTransport::new(|_: &str| r#"<a href="/a">a</a>"#.to_string()));
    let crawler = create_scripted_crawler(Arc::clone(&transport));

    for _ in 0..2 {
        let job = CrawlJob::builder("https://example.com").build().unwrap();
        let report = crawler.crawl(job).await.unwrap();
        assert_eq!(report.crawl_count(), 2);
    }

    assert_eq!(transport.request_counts().get("/a"), Some(&2));
}

#[test]
fn test_seed_outside_domain_rejected() {
    let result = CrawlJob::builder("https://example.com/docs/")
        .seed("https://example.com/blog/")
        .build();
    assert!(matches!(result, Err(SumiError::SeedUriMismatch { .. })));
}
