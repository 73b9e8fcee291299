use std::{collections::HashMap, time::Duration};

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{error::KvError, store::ScanPage, KvStore};

/// The reference KV implementation: a thin REST client over an HTTPS
/// key-value service. Every operation is one HTTP request; the exact URL
/// shape is implementation-defined by this client and need only be matched
/// by whatever backend serves it.
pub struct RestKvStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl RestKvStore {
    /// Builds a client pointed at `base_url`, optionally presenting `token`
    /// as a bearer credential, with a default per-request timeout of 8s.
    pub fn new(base_url: Url, token: Option<String>) -> Self {
        Self::with_timeout(base_url, token, Duration::from_secs(8))
    }

    pub fn with_timeout(base_url: Url, token: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("reqwest client with static config builds");
        Self { client, base_url, token }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = self.base_url.join(path).expect("path joins base url");
        let mut req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<reqwest::Response, KvError> {
        let resp = req.send().await?;
        let status = resp.status();
        if status.is_server_error() {
            return Err(KvError::Transient(format!("kv store returned {status}")));
        }
        if status.is_client_error() && status != StatusCode::NOT_FOUND {
            let body = resp.text().await.unwrap_or_default();
            return Err(KvError::Rejected(format!("{status}: {body}")));
        }
        Ok(resp)
    }
}

#[derive(Deserialize)]
struct ScanResponse {
    cursor: String,
    keys: Vec<String>,
}

#[derive(Deserialize)]
struct HashResponse {
    #[serde(default)]
    fields: HashMap<String, String>,
}

#[derive(Serialize)]
struct HashRequest<'a> {
    fields: &'a HashMap<String, String>,
}

#[derive(Deserialize)]
struct StringResponse {
    value: Option<String>,
}

#[derive(Serialize)]
struct SetRequest<'a> {
    value: &'a str,
    #[serde(rename = "ttlSeconds", skip_serializing_if = "Option::is_none")]
    ttl_seconds: Option<u64>,
}

#[derive(Serialize)]
struct ExpireRequest {
    #[serde(rename = "ttlSeconds")]
    ttl_seconds: u64,
}

#[derive(Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[async_trait::async_trait]
impl KvStore for RestKvStore {
    async fn scan(&self, pattern: &str, batch_size: u32, cursor: &str) -> Result<ScanPage, KvError> {
        let req = self
            .request(reqwest::Method::GET, "v1/scan")
            .query(&[("pattern", pattern), ("count", &batch_size.to_string()), ("cursor", cursor)]);
        let body: ScanResponse = self.send(req).await?.json().await?;
        Ok((body.cursor, body.keys))
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, KvError> {
        let req = self.request(reqwest::Method::GET, "v1/hash").query(&[("key", key)]);
        let resp = self.send(req).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(HashMap::new());
        }
        let body: HashResponse = resp.json().await?;
        Ok(body.fields)
    }

    async fn hset(&self, key: &str, fields: &HashMap<String, String>) -> Result<(), KvError> {
        let req = self
            .request(reqwest::Method::POST, "v1/hash")
            .query(&[("key", key)])
            .json(&HashRequest { fields });
        self.send(req).await?;
        Ok(())
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<(), KvError> {
        let req = self
            .request(reqwest::Method::POST, "v1/expire")
            .query(&[("key", key)])
            .json(&ExpireRequest { ttl_seconds });
        self.send(req).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let req = self.request(reqwest::Method::GET, "v1/string").query(&[("key", key)]);
        let resp = self.send(req).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body: StringResponse = resp.json().await?;
        Ok(body.value)
    }

    async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<(), KvError> {
        let req = self
            .request(reqwest::Method::POST, "v1/string")
            .query(&[("key", key)])
            .json(&SetRequest { value, ttl_seconds });
        self.send(req).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        let req = self.request(reqwest::Method::GET, "v1/exists").query(&[("key", key)]);
        let resp = self.send(req).await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        let body: ExistsResponse = resp.json().await?;
        Ok(body.exists)
    }

    async fn del(&self, key: &str) -> Result<(), KvError> {
        let req = self.request(reqwest::Method::DELETE, "v1/key").query(&[("key", key)]);
        self.send(req).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    async fn client_for(server: &MockServer) -> RestKvStore {
        RestKvStore::new(Url::parse(&server.uri()).unwrap().join("/").unwrap(), None)
    }

    #[tokio::test]
    async fn get_returns_none_on_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/string"))
            .and(query_param("key", "zano:deposit:foo"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = client_for(&server).await;
        assert_eq!(store.get("zano:deposit:foo").await.unwrap(), None);
    }

    #[tokio::test]
    async fn get_parses_value() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/string"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": "1"})))
            .mount(&server)
            .await;

        let store = client_for(&server).await;
        assert_eq!(store.get("zano:seen:abc").await.unwrap(), Some("1".to_string()));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/v1/exists")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

        let store = client_for(&server).await;
        let err = store.exists("zano:seen:abc").await.unwrap_err();
        assert!(matches!(err, KvError::Transient(_)));
    }

    #[tokio::test]
    async fn hgetall_empty_map_when_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).and(path("/v1/hash")).respond_with(ResponseTemplate::new(404)).mount(&server).await;

        let store = client_for(&server).await;
        assert!(store.hgetall("zano:deposit:zano:pid").await.unwrap().is_empty());
    }
}
