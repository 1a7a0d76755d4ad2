use crate::errors::{LoadError, LoadResult};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{debug, warn};
use rand::Rng;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;

/// Default remote used by the document dashboard
pub const DEFAULT_SOURCE_URL: &str = "https://jsonplaceholder.typicode.com/posts?_limit=10";

/// Characters of a post title kept in a document name
const TITLE_PREFIX_CHARS: usize = 20;
const CATEGORY_BUCKETS: usize = 4;

/// Read-only collaborator that yields a batch of raw records
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch(&self) -> LoadResult<Value>;
}

/// Caller-supplied records, handed back as-is on every fetch
pub struct StaticRecordSource {
    raw: Value,
}

impl StaticRecordSource {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }
}

#[async_trait]
impl RecordSource for StaticRecordSource {
    async fn fetch(&self) -> LoadResult<Value> {
        Ok(self.raw.clone())
    }
}

/// Fetches a JSON array over HTTP GET
pub struct HttpRecordSource {
    client: Client,
    url: String,
}

impl HttpRecordSource {
    pub fn new(url: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            url: url.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RecordSource for HttpRecordSource {
    async fn fetch(&self) -> LoadResult<Value> {
        debug!("Fetching records from {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        if response.status().is_success() {
            let body = response.json::<Value>().await?;
            Ok(body)
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to get error details".to_string());

            Err(LoadError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// Turns placeholder "posts" (`id`, `title`, `userId`) into dashboard documents.
pub struct PostsDocumentSource<S> {
    inner: S,
}

impl<S: RecordSource> PostsDocumentSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: RecordSource> RecordSource for PostsDocumentSource<S> {
    async fn fetch(&self) -> LoadResult<Value> {
        let posts = self.inner.fetch().await?;
        let today = Utc::now().date_naive();
        let mut rng = rand::rng();
        Ok(posts_to_documents(&posts, today, &mut rng))
    }
}

/// Maps posts to documents. Fields a post lacks are left out so the validator
/// can reject the document; a non-array body passes through untouched.
pub fn posts_to_documents<R: Rng>(posts: &Value, today: NaiveDate, rng: &mut R) -> Value {
    let Some(items) = posts.as_array() else {
        warn!("Post source did not return an array");
        return posts.clone();
    };

    let documents = items
        .iter()
        .enumerate()
        .map(|(index, post)| {
            let mut doc = Map::new();
            if let Some(id) = post.get("id") {
                doc.insert("id".to_string(), id.clone());
            }
            if let Some(title) = post.get("title").and_then(Value::as_str) {
                let prefix: String = title.chars().take(TITLE_PREFIX_CHARS).collect();
                doc.insert("name".to_string(), json!(format!("Document {}...", prefix)));
            }
            doc.insert(
                "category".to_string(),
                json!(format!("Category {}", (index % CATEGORY_BUCKETS) + 1)),
            );
            doc.insert("date".to_string(), json!(today.format("%Y-%m-%d").to_string()));
            doc.insert(
                "size".to_string(),
                json!(format!("{}KB", rng.random_range(100..1100))),
            );
            if let Some(user_id) = post.get("userId") {
                doc.insert("userId".to_string(), user_id.clone());
            }
            Value::Object(doc)
        })
        .collect();

    Value::Array(documents)
}
