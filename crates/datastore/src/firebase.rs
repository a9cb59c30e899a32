use crate::sse::{Event, EventDecoder};
use crate::{
    DEFAULT_TALLY_PATH, MAX_TRANSACTION_RETRIES, StoreError, TallyStore, TallySubscription,
    TallyUpdate,
};
use async_trait::async_trait;
use domain::VoteTally;
use futures::StreamExt;
use reqwest::header::{ACCEPT, ETAG, HeaderMap, IF_MATCH};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tokio::sync::watch;

const ETAG_REQUEST_HEADER: &str = "X-Firebase-ETag";

/// Connection settings for a Firebase Realtime Database
#[derive(Debug, Clone)]
pub struct FirebaseConfig {
    /// e.g. `https://teztones-default-rtdb.firebaseio.com`
    pub database_url: String,
    pub path: String,
    /// Database secret or ID token, sent as the `auth` query parameter
    pub auth: Option<String>,
    pub max_retries: usize,
    /// Pause before re-opening a dropped event stream
    pub reconnect_delay: Duration,
}

impl FirebaseConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            path: DEFAULT_TALLY_PATH.to_string(),
            auth: None,
            max_retries: MAX_TRANSACTION_RETRIES,
            reconnect_delay: Duration::from_secs(5),
        }
    }

    fn record_url(&self) -> String {
        format!(
            "{}/{}.json",
            self.database_url.trim_end_matches('/'),
            self.path.trim_matches('/')
        )
    }
}

/// Tally store backed by the Firebase Realtime Database REST API.
///
/// Commits use conditional `PUT` requests keyed on the record's ETag, and the
/// subscription follows the database's server-sent event stream.
#[derive(Clone)]
pub struct FirebaseTallyStore {
    http: reqwest::Client,
    config: FirebaseConfig,
}

impl FirebaseTallyStore {
    pub fn new(config: FirebaseConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: FirebaseConfig) -> Self {
        Self { http, config }
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, self.config.record_url());
        match &self.config.auth {
            Some(token) => builder.query(&[("auth", token)]),
            None => builder,
        }
    }

    /// Stored record, untyped, together with the ETag a conditional write must match
    async fn fetch(&self) -> Result<(String, Value), StoreError> {
        let response = self
            .request(reqwest::Method::GET)
            .header(ETAG_REQUEST_HEADER, "true")
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let etag = etag_of(response.headers())?;
        let record = parse_body(&response.bytes().await?)?;
        Ok((etag, record))
    }
}

#[async_trait]
impl TallyStore for FirebaseTallyStore {
    async fn read(&self) -> Result<Option<VoteTally>, StoreError> {
        decode_record(&self.fetch().await?.1)
    }

    async fn transaction(&self, update: &TallyUpdate) -> Result<VoteTally, StoreError> {
        let (mut etag, mut current) = self.fetch().await?;

        for attempt in 1..=self.config.max_retries {
            let next = update(decode_record(&current)?.as_ref());
            let body = merge_record(&current, &next)?;
            let response = self
                .request(reqwest::Method::PUT)
                .header(IF_MATCH, etag.as_str())
                .json(&body)
                .send()
                .await?;

            if response.status() == StatusCode::PRECONDITION_FAILED {
                // the rejection carries the winning write, so no extra read
                etag = etag_of(response.headers())?;
                current = parse_body(&response.bytes().await?)?;
                tracing::debug!(attempt, "tally commit lost a race, retrying");
                continue;
            }

            let response = ensure_success(response).await?;
            let committed = decode_record(&parse_body(&response.bytes().await?)?)?;
            return Ok(committed.unwrap_or(next));
        }

        Err(StoreError::TooManyRetries(self.config.max_retries))
    }

    fn subscribe(&self) -> TallySubscription {
        let (tx, rx) = watch::channel(None);
        let store = self.clone();
        let task = tokio::spawn(async move { store.listen(tx).await });
        TallySubscription::with_listener(rx, task)
    }
}

impl FirebaseTallyStore {
    async fn listen(self, tx: watch::Sender<Option<VoteTally>>) {
        let mut snapshot = Value::Null;
        loop {
            match self.follow_events(&tx, &mut snapshot).await {
                Ok(StreamEnd::Closed) => {
                    tracing::info!("tally event stream closed, reconnecting");
                }
                Ok(StreamEnd::Cancelled(reason)) => {
                    tracing::warn!(%reason, "tally event stream cancelled by the database");
                    return;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "tally event stream failed, reconnecting");
                }
            }
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    async fn follow_events(
        &self,
        tx: &watch::Sender<Option<VoteTally>>,
        snapshot: &mut Value,
    ) -> Result<StreamEnd, StoreError> {
        let response = self
            .request(reqwest::Method::GET)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let mut decoder = EventDecoder::default();
        let mut body = Box::pin(response.bytes_stream());
        while let Some(chunk) = body.next().await {
            for event in decoder.push(&chunk?) {
                match apply_event(snapshot, &event)? {
                    EventEffect::Changed => publish(tx, snapshot),
                    EventEffect::Ignored => {}
                    EventEffect::Cancelled => return Ok(StreamEnd::Cancelled(event.data)),
                }
            }
        }
        Ok(StreamEnd::Closed)
    }
}

enum StreamEnd {
    Closed,
    Cancelled(String),
}

#[derive(Debug, PartialEq, Eq)]
enum EventEffect {
    Changed,
    Ignored,
    Cancelled,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    path: String,
    data: Value,
}

fn apply_event(snapshot: &mut Value, event: &Event) -> Result<EventEffect, StoreError> {
    match event.name.as_str() {
        "put" => {
            let payload: EventPayload = serde_json::from_str(&event.data)?;
            set_at_path(snapshot, &payload.path, payload.data);
            Ok(EventEffect::Changed)
        }
        "patch" => {
            let payload: EventPayload = serde_json::from_str(&event.data)?;
            if let Value::Object(children) = payload.data {
                for (key, value) in children {
                    let path = format!("{}/{}", payload.path.trim_end_matches('/'), key);
                    set_at_path(snapshot, &path, value);
                }
            }
            Ok(EventEffect::Changed)
        }
        "cancel" | "auth_revoked" => Ok(EventEffect::Cancelled),
        _ => Ok(EventEffect::Ignored),
    }
}

/// Write `value` at a slash separated path below `root`; `null` deletes
fn set_at_path(root: &mut Value, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };

    let mut node = root;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Default::default());
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map.entry(segment.to_string()).or_insert(Value::Null);
    }

    if !node.is_object() {
        if value.is_null() {
            return;
        }
        *node = Value::Object(Default::default());
    }
    if let Some(map) = node.as_object_mut() {
        if value.is_null() {
            map.remove(*last);
        } else {
            map.insert(last.to_string(), value);
        }
    }
}

fn publish(tx: &watch::Sender<Option<VoteTally>>, snapshot: &Value) {
    if snapshot.is_null() {
        tx.send_replace(None);
        return;
    }
    match serde_json::from_value::<VoteTally>(snapshot.clone()) {
        Ok(tally) => {
            tx.send_replace(Some(tally));
        }
        Err(err) => tracing::warn!(error = %err, "ignoring malformed tally record"),
    }
}

fn parse_body(body: &[u8]) -> Result<Value, StoreError> {
    if body.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(body)?)
}

fn decode_record(raw: &Value) -> Result<Option<VoteTally>, StoreError> {
    if raw.is_null() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_value(raw.clone())?))
}

/// Lay the tally's fields over the stored object. Fields the tally does not
/// model stay as they are.
fn merge_record(raw: &Value, tally: &VoteTally) -> Result<Value, StoreError> {
    let mut merged = match raw {
        Value::Object(fields) => fields.clone(),
        _ => Map::new(),
    };
    if let Value::Object(fields) = serde_json::to_value(tally)? {
        merged.extend(fields);
    }
    Ok(Value::Object(merged))
}

fn etag_of(headers: &HeaderMap) -> Result<String, StoreError> {
    headers
        .get(ETAG)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .ok_or(StoreError::MissingETag)
}

async fn ensure_success(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status { status, body })
}
