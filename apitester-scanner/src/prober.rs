use crate::candidate::Candidate;
use crate::error::Result;
use crate::response::{is_successful_response, summarize_response};
use crate::result::ProbeResult;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Headers the HTTP client negotiates itself. Sending the candidate's
/// values would switch off transparent gzip decoding.
const TRANSPORT_HEADERS: &[&str] = &["accept-encoding", "connection"];

#[derive(Debug, Clone)]
pub enum ProbeEvent {
    Probing {
        index: usize,
        total: usize,
        url: String,
    },
    Finished(ProbeResult),
    Pausing(Duration),
}

pub type ProbeCallback = Arc<dyn Fn(&ProbeEvent) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub timeout: Duration,
    pub max_count: usize,
    pub delay: Duration,
    pub verify_tls: bool,
    pub follow_redirects: bool,
    pub max_redirects: usize,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_count: 50,
            delay: Duration::from_secs(1),
            verify_tls: false,
            follow_redirects: true,
            max_redirects: 5,
        }
    }
}

/// Sequential prober. One request at a time, in candidate order, with a
/// fixed pause between requests. A single client is reused so connections
/// and cookies carry over from one probe to the next.
pub struct Prober {
    client: Client,
    options: ProbeOptions,
    progress_callback: Option<ProbeCallback>,
}

impl Prober {
    pub fn new(options: ProbeOptions) -> Result<Self> {
        let redirect_policy = if options.follow_redirects {
            reqwest::redirect::Policy::limited(options.max_redirects)
        } else {
            reqwest::redirect::Policy::none()
        };

        let client = Client::builder()
            .timeout(options.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .cookie_store(true)
            .danger_accept_invalid_certs(!options.verify_tls)
            .redirect(redirect_policy)
            .build()?;

        Ok(Self {
            client,
            options,
            progress_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProbeCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn emit(&self, event: ProbeEvent) {
        if let Some(ref callback) = self.progress_callback {
            callback(&event);
        }
    }

    /// Probe at most `max_count` candidates. Never fails as a whole: every
    /// request error becomes a failed result and the loop moves on.
    pub async fn probe_all(&self, candidates: &[Candidate]) -> Vec<ProbeResult> {
        let total = candidates.len().min(self.options.max_count);

        if candidates.len() > total {
            warn!(
                "Limiting API testing to {} out of {} found",
                total,
                candidates.len()
            );
        }
        info!("Testing {} APIs sequentially", total);

        let mut results = Vec::with_capacity(total);

        for (index, candidate) in candidates.iter().take(total).enumerate() {
            info!("Testing API {}/{}: {}", index + 1, total, candidate.url);
            self.emit(ProbeEvent::Probing {
                index,
                total,
                url: candidate.url.clone(),
            });

            let result = self.probe(candidate).await;
            self.emit(ProbeEvent::Finished(result.clone()));
            results.push(result);

            if index + 1 < total {
                self.emit(ProbeEvent::Pausing(self.options.delay));
                tokio::time::sleep(self.options.delay).await;
            }
        }

        results
    }

    pub async fn probe(&self, candidate: &Candidate) -> ProbeResult {
        match self.send(candidate).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Error testing API {}: {}", candidate.url, e);
                ProbeResult::with_error(candidate, e.to_string())
            }
        }
    }

    async fn send(&self, candidate: &Candidate) -> Result<ProbeResult> {
        debug!("{} {}", candidate.method, candidate.url);

        let mut request = self
            .client
            .request(candidate.method.into(), &candidate.url);

        for (name, value) in &candidate.headers {
            if TRANSPORT_HEADERS
                .iter()
                .any(|h| h.eq_ignore_ascii_case(name))
            {
                continue;
            }
            request = request.header(name.as_str(), value.as_str());
        }

        let start = Instant::now();
        let response = request.send().await?;

        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.bytes().await?;
        let response_time = start.elapsed();

        let content_type_str = content_type.as_deref().unwrap_or_default();
        let text = String::from_utf8_lossy(&body);

        let mut result = ProbeResult::new(candidate);
        result.success = is_successful_response(status_code, content_type_str, &text);
        result.status_code = status_code;
        result.response_summary = summarize_response(content_type_str, &body);
        result.size = body.len();
        result.content_type = content_type;
        result.response_time = response_time;

        debug!(
            "{} -> {} ({} bytes, success: {})",
            candidate.url, status_code, result.size, result.success
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::HttpMethod;
    use crate::classifier::Classifier;
    use serde_json::json;
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, method, path, path_regex},
    };

    fn candidate(url: &str) -> Candidate {
        Classifier::default().classify(url).unwrap()
    }

    /// URL on a local port that was bound and released, so nothing listens there
    fn closed_port_url(path: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}{}", port, path)
    }

    fn fast_options() -> ProbeOptions {
        ProbeOptions {
            timeout: Duration::from_secs(5),
            delay: Duration::from_millis(0),
            ..ProbeOptions::default()
        }
    }

    #[tokio::test]
    async fn test_probe_success_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&mock_server)
            .await;

        let prober = Prober::new(fast_options()).unwrap();
        let result = prober
            .probe(&candidate(&format!("{}/api/v1/users", mock_server.uri())))
            .await;

        assert!(result.success);
        assert_eq!(result.status_code, 200);
        assert_eq!(result.method, HttpMethod::Get);
        assert_eq!(result.response_summary, "{\n  \"ok\": true\n}");
        assert_eq!(result.size, r#"{"ok":true}"#.len());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_probe_sends_guessed_method_and_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v1/login"))
            .and(header("x-requested-with", "XMLHttpRequest"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "bad"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let prober = Prober::new(fast_options()).unwrap();
        let result = prober
            .probe(&candidate(&format!("{}/api/v1/login", mock_server.uri())))
            .await;

        assert!(!result.success);
        assert_eq!(result.status_code, 401);
        assert_eq!(result.method, HttpMethod::Post);
        // the request completed, so this is not an error
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_connection_failure_is_recorded() {
        let dead_url = closed_port_url("/api/gone");

        let prober = Prober::new(fast_options()).unwrap();
        let result = prober.probe(&candidate(&dead_url)).await;

        assert!(!result.success);
        assert_eq!(result.status_code, 0);
        assert_eq!(result.size, 0);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_timeout_is_recorded() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let options = ProbeOptions {
            timeout: Duration::from_millis(300),
            ..fast_options()
        };
        let prober = Prober::new(options).unwrap();
        let result = prober
            .probe(&candidate(&format!("{}/api/slow", mock_server.uri())))
            .await;

        assert_eq!(result.status_code, 0);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_slow_response_within_timeout_succeeds() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/unhurried"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true}))
                    .set_delay(Duration::from_millis(600)),
            )
            .mount(&mock_server)
            .await;

        // the whole request shares one budget; no shorter connect deadline applies
        let options = ProbeOptions {
            timeout: Duration::from_secs(1),
            ..fast_options()
        };
        let prober = Prober::new(options).unwrap();
        let result = prober
            .probe(&candidate(&format!("{}/api/unhurried", mock_server.uri())))
            .await;

        assert!(result.success);
        assert_eq!(result.status_code, 200);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_batch() {
        let dead_url = closed_port_url("/api/first");

        let live = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/second"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": [1, 2]})))
            .mount(&live)
            .await;

        let candidates = vec![
            candidate(&dead_url),
            candidate(&format!("{}/api/second", live.uri())),
        ];

        let prober = Prober::new(fast_options()).unwrap();
        let results = prober.probe_all(&candidates).await;

        assert_eq!(results.len(), 2);
        assert!(!results[0].success);
        assert_eq!(results[0].status_code, 0);
        assert_eq!(results[0].size, 0);
        assert!(results[0].error.is_some());
        assert!(results[1].success);
        assert_eq!(results[1].status_code, 200);
    }

    #[tokio::test]
    async fn test_truncates_to_max_count() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path_regex(r"^/api/item/\d+$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(50)
            .mount(&mock_server)
            .await;

        let candidates: Vec<Candidate> = (0..60)
            .map(|i| candidate(&format!("{}/api/item/{}", mock_server.uri(), i)))
            .collect();

        let options = ProbeOptions {
            max_count: 50,
            ..fast_options()
        };
        let prober = Prober::new(options).unwrap();
        let results = prober.probe_all(&candidates).await;

        assert_eq!(results.len(), 50);
        for (result, candidate) in results.iter().zip(candidates.iter()) {
            assert_eq!(result.url, candidate.url);
        }
    }

    #[tokio::test]
    async fn test_pauses_between_requests_only() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let pauses = Arc::new(AtomicUsize::new(0));
        let probes = Arc::new(AtomicUsize::new(0));
        let pauses_clone = pauses.clone();
        let probes_clone = probes.clone();

        let prober = Prober::new(fast_options())
            .unwrap()
            .with_progress_callback(Arc::new(move |event: &ProbeEvent| match event {
                ProbeEvent::Pausing(_) => {
                    pauses_clone.fetch_add(1, Ordering::SeqCst);
                }
                ProbeEvent::Probing { .. } => {
                    probes_clone.fetch_add(1, Ordering::SeqCst);
                }
                ProbeEvent::Finished(_) => {}
            }));

        let candidates: Vec<Candidate> = (0..4)
            .map(|i| candidate(&format!("{}/api/page/{}", mock_server.uri(), i)))
            .collect();
        prober.probe_all(&candidates).await;

        assert_eq!(probes.load(Ordering::SeqCst), 4);
        assert_eq!(pauses.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_single_candidate_never_pauses() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let pauses = Arc::new(AtomicUsize::new(0));
        let pauses_clone = pauses.clone();
        let options = ProbeOptions {
            delay: Duration::from_secs(30),
            ..fast_options()
        };
        let prober = Prober::new(options)
            .unwrap()
            .with_progress_callback(Arc::new(move |event: &ProbeEvent| {
                if let ProbeEvent::Pausing(_) = event {
                    pauses_clone.fetch_add(1, Ordering::SeqCst);
                }
            }));

        let results = prober
            .probe_all(&[candidate(&format!("{}/api/one", mock_server.uri()))])
            .await;

        assert_eq!(results.len(), 1);
        assert_eq!(pauses.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_redirects_not_followed_when_disabled() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/old"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/api/new", mock_server.uri())),
            )
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"moved": true})))
            .mount(&mock_server)
            .await;

        let url = format!("{}/api/old", mock_server.uri());

        let following = Prober::new(fast_options()).unwrap();
        let result = following.probe(&candidate(&url)).await;
        assert_eq!(result.status_code, 200);
        assert!(result.success);

        let options = ProbeOptions {
            follow_redirects: false,
            ..fast_options()
        };
        let not_following = Prober::new(options).unwrap();
        let result = not_following.probe(&candidate(&url)).await;
        assert_eq!(result.status_code, 302);
        assert!(!result.success);
    }
}
