#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use switchyard_client::events::{Event, Subscriber};
use switchyard_client::fetcher::{FeatureFetcher, FetchResponse};
use switchyard_client::metrics::{ClientMetrics, ClientRegistration, MetricSender};
use switchyard_core::collection::FeatureCollection;
use switchyard_util::errors::SwitchyardError;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as seen by [`TestServer`]. Header names are lowercased.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.headers
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::status(200)
            .header("Content-Type", "application/json")
            .body(body)
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}

type Handler = Arc<dyn Fn(&Recorded) -> Reply + Send + Sync>;

/// Minimal HTTP/1.1 server on a random local port. Every connection is
/// answered once and closed.
pub struct TestServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let recorded = Arc::clone(&requests);
        let task = tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    return;
                };
                let recorded = Arc::clone(&recorded);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let mut reader = BufReader::new(socket);
                    let Some(request) = read_request(&mut reader).await else {
                        return;
                    };
                    let reply = handler(&request);
                    recorded.lock().unwrap().push(request);
                    let _ = write_reply(reader.get_mut(), &reply).await;
                });
            }
        });

        Self {
            url: format!("http://{addr}/api/"),
            requests,
            task,
        }
    }

    /// Answer with `replies` in order, repeating the last one.
    pub async fn scripted(replies: Vec<Reply>) -> Self {
        let queue = Mutex::new(VecDeque::from(replies));
        Self::start(move |_| {
            let mut queue = queue.lock().unwrap();
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap_or_else(|| Reply::status(500))
            }
        })
        .await
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path_prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with(path_prefix))
            .collect()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn read_request<R>(reader: &mut R) -> Option<Recorded>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut line = String::new();
    reader.read_line(&mut line).await.ok()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await.ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let length = headers
        .iter()
        .find(|(k, _)| k == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0; length];
    reader.read_exact(&mut body).await.ok()?;

    Some(Recorded {
        method,
        path,
        headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn write_reply<W>(writer: &mut W, reply: &Reply) -> std::io::Result<()>
where
    W: AsyncWriteExt + Unpin,
{
    let mut head = format!("HTTP/1.1 {} Test\r\n", reply.status);
    for (name, value) in &reply.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        reply.body.len()
    ));
    writer.write_all(head.as_bytes()).await?;
    writer.write_all(reply.body.as_bytes()).await?;
    writer.flush().await?;
    writer.shutdown().await
}

pub const FEATURES_JSON: &str = r#"{
  "version": 2,
  "features": [
    {
      "name": "checkout.new",
      "type": "release",
      "project": "default",
      "enabled": true,
      "impressionData": true,
      "strategies": [{ "name": "default", "parameters": {} }]
    },
    {
      "name": "checkout.legacy",
      "enabled": false,
      "strategies": []
    }
  ],
  "segments": []
}"#;

pub fn features() -> FeatureCollection {
    FeatureCollection::from_json(FEATURES_JSON).unwrap()
}

/// Serves canned fetch results in order, repeating the last one.
pub struct MemoryFetcher {
    responses: Mutex<VecDeque<FetchResponse>>,
    calls: Mutex<usize>,
}

impl MemoryFetcher {
    pub fn new(responses: Vec<FetchResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::from(responses)),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl FeatureFetcher for MemoryFetcher {
    async fn fetch_features(&self) -> Result<FetchResponse, SwitchyardError> {
        *self.calls.lock().unwrap() += 1;
        let mut responses = self.responses.lock().unwrap();
        let response = if responses.len() > 1 {
            responses.pop_front()
        } else {
            responses.front().cloned()
        };
        response.ok_or_else(|| SwitchyardError::network("no canned response"))
    }
}

/// Records what would have been posted.
pub struct RecordingSender {
    status: u16,
    pub registrations: Mutex<Vec<ClientRegistration>>,
    pub metrics: Mutex<Vec<ClientMetrics>>,
}

impl RecordingSender {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            registrations: Mutex::new(Vec::new()),
            metrics: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl MetricSender for RecordingSender {
    async fn register_client(&self, registration: &ClientRegistration) -> Result<u16, SwitchyardError> {
        self.registrations.lock().unwrap().push(registration.clone());
        Ok(self.status)
    }

    async fn send_metrics(&self, metrics: &ClientMetrics) -> Result<u16, SwitchyardError> {
        self.metrics.lock().unwrap().push(metrics.clone());
        Ok(self.status)
    }
}

#[derive(Default)]
pub struct RecordingSubscriber {
    events: Mutex<Vec<Event>>,
}

impl RecordingSubscriber {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl Subscriber for RecordingSubscriber {
    fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}
