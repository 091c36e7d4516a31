//! HTTP target
//!
//! Records are handed to a worker thread owned by the handle, so dispatch never
//! waits on the network. Each record is sent once: as a query string for GET,
//! or as a form, JSON or XML body for POST. The response body is attached to
//! the record before `logged` fires.

use crate::core::token::value_text;
use crate::core::{
    ContentType, DeferredEvents, HttpMethod, LogRecord, LoggerError, Result, Target, TargetContext,
};
use crossbeam_channel::{unbounded, Sender};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use std::collections::BTreeMap;
use std::thread;
use std::time::{Duration, Instant};
use url::Url;

/// `User-Agent` sent unless the handle configures its own
pub const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Encode `record` as a POST body
pub fn encode_body(content_type: ContentType, record: &LogRecord) -> Result<String> {
    match content_type {
        ContentType::Form => Ok(form_encode(&payload_pairs(record)?)),
        ContentType::Json => Ok(serde_json::to_string(record)?),
        ContentType::Xml => Ok(xml_encode(&payload_pairs(record)?)),
    }
}

/// Endpoint and request settings of one HTTP handle
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub url: Url,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    pub content_type: ContentType,
    /// Skip TLS certificate validation
    pub allow_insecure: bool,
}

impl HttpOptions {
    /// Parse `url`, overriding its port when one is given
    pub fn new(url: &str, port: Option<u16>) -> Result<Self> {
        let mut url = Url::parse(url)
            .map_err(|e| LoggerError::config("http target", format!("Invalid URL '{}': {}", url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LoggerError::config(
                "http target",
                format!("Unsupported scheme '{}'", url.scheme()),
            ));
        }
        if let Some(port) = port {
            url.set_port(Some(port))
                .map_err(|()| LoggerError::config("http target", "URL cannot carry a port"))?;
        }
        Ok(Self {
            url,
            method: HttpMethod::default(),
            headers: BTreeMap::new(),
            content_type: ContentType::default(),
            allow_insecure: false,
        })
    }

    #[must_use]
    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    #[must_use]
    pub fn with_allow_insecure(mut self, allow_insecure: bool) -> Self {
        self.allow_insecure = allow_insecure;
        self
    }
}

/// Flat `key=value` view of a record; null fields are left out
pub fn payload_pairs(record: &LogRecord) -> Result<Vec<(String, String)>> {
    match serde_json::to_value(record)? {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(key, value)| value_text(&value).map(|text| (key, text)))
            .collect()),
        other => Err(LoggerError::formatter(
            "http",
            format!("record serialized to {} instead of an object", other),
        )),
    }
}

#[must_use]
pub fn form_encode(pairs: &[(String, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

#[must_use]
pub fn xml_encode(pairs: &[(String, String)]) -> String {
    let mut xml = String::from("<log>");
    for (key, value) in pairs {
        xml.push_str(&format!("<{0}>{1}</{0}>", key, xml_escape(value)));
    }
    xml.push_str("</log>");
    xml
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

struct Job {
    record: LogRecord,
    events: DeferredEvents,
}

/// Sends records from a dedicated worker thread
pub struct HttpTarget {
    sender: Option<Sender<Job>>,
    worker: Option<thread::JoinHandle<()>>,
}

impl HttpTarget {
    /// Start the worker thread for `handle`
    pub fn new(handle: &str, options: HttpOptions) -> Result<Self> {
        let (sender, receiver) = unbounded::<Job>();
        let worker = thread::Builder::new()
            .name(format!("http-target-{}", handle))
            .spawn(move || {
                let client = match build_client(&options) {
                    Ok(client) => Some(client),
                    Err(e) => {
                        tracing::error!(error = %e, "failed to build HTTP client");
                        None
                    }
                };
                for job in receiver.iter() {
                    let Some(client) = &client else {
                        job.events
                            .error(LoggerError::writer("HTTP client unavailable"), &job.record);
                        continue;
                    };
                    match deliver(client, &options, job.record.clone()) {
                        Ok(record) => job.events.logged(&record),
                        Err(e) => job.events.error(e, &job.record),
                    }
                }
            })
            .map_err(|e| LoggerError::io_operation("spawn HTTP worker", handle.to_string(), e))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }
}

fn build_client(options: &HttpOptions) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(DEFAULT_USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .no_proxy()
        .danger_accept_invalid_certs(options.allow_insecure)
        .build()?)
}

/// One request, no retry
fn deliver(client: &Client, options: &HttpOptions, mut record: LogRecord) -> Result<LogRecord> {
    let mut request = match options.method {
        HttpMethod::Get => {
            let mut url = options.url.clone();
            url.query_pairs_mut().extend_pairs(payload_pairs(&record)?);
            client.get(url)
        }
        HttpMethod::Post => client
            .post(options.url.clone())
            .header(CONTENT_TYPE, options.content_type.mime())
            .body(encode_body(options.content_type, &record)?),
    };
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    let response = request.send()?;
    record.response = Some(response.text()?);
    Ok(record)
}

impl Target for HttpTarget {
    fn emit(&mut self, record: &LogRecord, ctx: &mut TargetContext<'_>) -> Result<()> {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| LoggerError::writer("HTTP target is closed"))?;
        sender
            .send(Job {
                record: record.clone(),
                events: ctx.deferred(),
            })
            .map_err(|_| LoggerError::writer("HTTP worker has stopped"))
    }

    /// Stop accepting records and wait for in-flight requests, up to `ctx.timeout`
    fn close(&mut self, ctx: &mut TargetContext<'_>) -> Result<()> {
        drop(self.sender.take());
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        let start = Instant::now();
        while !worker.is_finished() {
            if start.elapsed() >= ctx.timeout {
                tracing::warn!(
                    handle = %ctx.handle,
                    timeout = ?ctx.timeout,
                    "HTTP worker did not finish in time, pending records may be lost"
                );
                return Ok(());
            }
            thread::sleep(Duration::from_millis(10));
        }
        worker
            .join()
            .map_err(|_| LoggerError::other("HTTP worker thread panicked"))
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> LogRecord {
        let mut record = LogRecord::new("info", 2, "a & b");
        record.logger_name = "api".to_string();
        record.fields.insert("requestId".to_string(), json!("r-1"));
        record.fields.insert("empty".to_string(), json!(null));
        record
    }

    #[test]
    fn test_options_port_override() {
        let options = HttpOptions::new("http://localhost/logs", Some(8125)).unwrap();
        assert_eq!(options.url.as_str(), "http://localhost:8125/logs");
        assert!(!options.allow_insecure);
        assert!(HttpOptions::new("not a url", None).is_err());
        assert!(HttpOptions::new("ftp://host/logs", None).is_err());
    }

    #[test]
    fn test_payload_skips_nulls() {
        let pairs = payload_pairs(&record()).unwrap();
        assert!(pairs.contains(&("message".to_string(), "a & b".to_string())));
        assert!(pairs.contains(&("loggerName".to_string(), "api".to_string())));
        assert!(pairs.iter().all(|(key, _)| key != "empty"));
    }

    #[test]
    fn test_encodings() {
        let r = record();
        let form = encode_body(ContentType::Form, &r).unwrap();
        assert!(form.contains("message=a+%26+b"));
        assert!(form.contains("requestId=r-1"));

        let body: serde_json::Value =
            serde_json::from_str(&encode_body(ContentType::Json, &r).unwrap()).unwrap();
        assert_eq!(body["requestId"], json!("r-1"));

        let xml = encode_body(ContentType::Xml, &r).unwrap();
        assert!(xml.starts_with("<log>"));
        assert!(xml.contains("<message>a &amp; b</message>"));
    }
}
