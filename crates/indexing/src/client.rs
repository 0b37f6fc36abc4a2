//! Meilisearch REST client.

use crate::document::{documents, Document};
use crate::error::{IndexError, Result};
use contracts::{default_meili_index, Collect, MeiliOptions};
use reqwest::{Client as HttpClient, Method, Response, StatusCode};
use semver::{Version, VersionReq};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

const TIMEOUT: Duration = Duration::from_secs(10);
const PRIMARY_KEY: &str = "id";
const USER_AGENT: &str = "WaybackArchiver/1.0";

/// Sortable attributes are updated with `PUT` from this release on.
const PUT_SETTINGS_SINCE: &str = ">=0.28";

#[derive(Debug, Deserialize)]
struct IndexInfo {
    uid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnqueuedTask {
    index_uid: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServerVersion {
    pkg_version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateIndex<'a> {
    uid: &'a str,
    primary_key: &'a str,
}

/// Client for a Meilisearch server holding published capsules.
///
/// # Example
///
/// ```no_run
/// use indexing::MeiliClient;
///
/// # async fn example() -> indexing::Result<()> {
/// let mut meili = MeiliClient::new("http://localhost:7700", "masterKey", "")?;
/// meili.setup().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MeiliClient {
    endpoint: String,
    index: String,
    api_key: String,
    version: Option<String>,
    http: HttpClient,
}

impl MeiliClient {
    /// Create a client. An empty `index` falls back to `capsules`.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        index: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(IndexError::InvalidEndpoint(format!(
                "URL must start with http:// or https://, got: {endpoint}"
            )));
        }

        let mut index = index.into();
        if index.trim().is_empty() {
            index = default_meili_index();
        }

        let http = HttpClient::builder()
            .timeout(TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| IndexError::Http {
                operation: "build client",
                source,
            })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            index,
            api_key: api_key.into(),
            version: None,
            http,
        })
    }

    pub fn from_options(opts: &MeiliOptions) -> Result<Self> {
        Self::new(&opts.endpoint, &opts.api_key, &opts.index)
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Server version learned during `setup`
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Create the index when missing, learn the server version and make
    /// `id` sortable.
    #[instrument(name = "meili_setup", skip(self), fields(index = %self.index))]
    pub async fn setup(&mut self) -> Result<()> {
        match self.exist_index().await {
            Err(IndexError::IndexNotFound(_)) => self.create_index().await?,
            other => other?,
        }
        self.fetch_version().await?;
        self.sortable().await?;
        info!(index = %self.index, version = ?self.version, "Search index ready");
        Ok(())
    }

    /// Ok when the index exists, `IndexNotFound` otherwise.
    pub async fn exist_index(&self) -> Result<()> {
        const OP: &str = "get index";
        let resp = self
            .send(OP, Method::GET, &format!("indexes/{}", self.index), None::<&()>)
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(IndexError::IndexNotFound(self.index.clone()));
        }
        let info: IndexInfo = Self::decode(OP, StatusCode::OK, resp).await?;
        if info.uid != self.index {
            return Err(IndexError::IndexNotFound(self.index.clone()));
        }
        Ok(())
    }

    pub async fn create_index(&self) -> Result<()> {
        const OP: &str = "create index";
        let body = CreateIndex {
            uid: &self.index,
            primary_key: PRIMARY_KEY,
        };
        let resp = self.send(OP, Method::POST, "indexes", Some(&body)).await?;
        let task: EnqueuedTask = Self::decode(OP, StatusCode::ACCEPTED, resp).await?;
        self.expect_index(task)
    }

    /// Learn the server version
    pub async fn fetch_version(&mut self) -> Result<String> {
        const OP: &str = "get version";
        let resp = self.send(OP, Method::GET, "version", None::<&()>).await?;
        let server: ServerVersion = Self::decode(OP, StatusCode::OK, resp).await?;
        self.version = Some(server.pkg_version.clone());
        Ok(server.pkg_version)
    }

    /// Mark `id` as sortable
    pub async fn sortable(&self) -> Result<()> {
        const OP: &str = "set sortable attributes";
        let method = self.settings_method()?;
        let path = format!("indexes/{}/settings/sortable-attributes", self.index);
        let resp = self.send(OP, method, &path, Some(&[PRIMARY_KEY])).await?;
        let task: EnqueuedTask = Self::decode(OP, StatusCode::ACCEPTED, resp).await?;
        self.expect_index(task)
    }

    /// Push one document per source
    #[instrument(name = "meili_push", skip(self, cols), fields(index = %self.index, records = cols.len()))]
    pub async fn push(&self, cols: &[Collect]) -> Result<()> {
        const OP: &str = "push document";
        if cols.is_empty() {
            return Err(IndexError::EmptyCollects);
        }

        let docs: Vec<Document> = documents(cols);
        let path = format!("indexes/{}/documents", self.index);
        let resp = self.send(OP, Method::POST, &path, Some(&docs)).await?;
        let task: EnqueuedTask = Self::decode(OP, StatusCode::ACCEPTED, resp).await?;
        self.expect_index(task)?;

        debug!(documents = docs.len(), "Documents enqueued");
        Ok(())
    }

    fn settings_method(&self) -> Result<Method> {
        let raw = self.version.as_deref().unwrap_or_default();
        let version =
            Version::parse(raw).map_err(|e| IndexError::InvalidVersion(format!("{raw}: {e}")))?;
        let req = VersionReq::parse(PUT_SETTINGS_SINCE)
            .map_err(|e| IndexError::InvalidVersion(e.to_string()))?;
        if req.matches(&version) {
            Ok(Method::PUT)
        } else {
            Ok(Method::POST)
        }
    }

    fn expect_index(&self, task: EnqueuedTask) -> Result<()> {
        if task.index_uid != self.index {
            return Err(IndexError::IndexNotMatch(self.index.clone()));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn send<T: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&T>,
    ) -> Result<Response> {
        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(&self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|source| IndexError::Http { operation, source })
    }

    async fn decode<T: DeserializeOwned>(
        operation: &'static str,
        expected: StatusCode,
        resp: Response,
    ) -> Result<T> {
        if resp.status() != expected {
            return Err(IndexError::UnexpectedStatus {
                operation,
                status: resp.status().as_u16(),
            });
        }
        let body = resp
            .text()
            .await
            .map_err(|source| IndexError::Http { operation, source })?;
        serde_json::from_str(&body).map_err(|source| IndexError::Deserialize { operation, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Slot;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn enqueued(index: &str) -> ResponseTemplate {
        ResponseTemplate::new(202).set_body_json(json!({
            "taskUid": 1,
            "indexUid": index,
            "status": "enqueued",
            "type": "indexCreation",
            "enqueuedAt": "2024-01-01T00:00:00Z"
        }))
    }

    #[test]
    fn test_client_rejects_bad_endpoint() {
        let result = MeiliClient::new("localhost:7700", "", "");
        assert!(matches!(result, Err(IndexError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_default_index_name() {
        let client = MeiliClient::new("http://localhost:7700/", "", "").unwrap();
        assert_eq!(client.index(), "capsules");
        assert_eq!(client.url("/version"), "http://localhost:7700/version");
    }

    #[tokio::test]
    async fn test_setup_creates_missing_index() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/capsules"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes"))
            .and(header("Authorization", "Bearer secret"))
            .and(body_json(json!({"uid": "capsules", "primaryKey": "id"})))
            .respond_with(enqueued("capsules"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"pkgVersion": "1.6.2"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/indexes/capsules/settings/sortable-attributes"))
            .and(body_json(json!(["id"])))
            .respond_with(enqueued("capsules"))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = MeiliClient::new(server.uri(), "secret", "").unwrap();
        client.setup().await.unwrap();
        assert_eq!(client.version(), Some("1.6.2"));
    }

    #[tokio::test]
    async fn test_old_server_uses_post_for_settings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/indexes/capsules"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "uid": "capsules",
                "primaryKey": "id"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/version"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"pkgVersion": "0.27.2"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/indexes/capsules/settings/sortable-attributes"))
            .respond_with(enqueued("capsules"))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = MeiliClient::new(server.uri(), "", "capsules").unwrap();
        client.setup().await.unwrap();
    }

    #[tokio::test]
    async fn test_push_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexes/capsules/documents"))
            .respond_with(enqueued("capsules"))
            .expect(1)
            .mount(&server)
            .await;

        let client = MeiliClient::new(server.uri(), "", "").unwrap();
        let cols = vec![Collect::new(
            "https://example.com/",
            "https://archive.ph/abc",
            Slot::Is,
        )];
        client.push(&cols).await.unwrap();
    }

    #[tokio::test]
    async fn test_push_rejects_mismatched_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/indexes/capsules/documents"))
            .respond_with(enqueued("other"))
            .mount(&server)
            .await;

        let client = MeiliClient::new(server.uri(), "", "").unwrap();
        let cols = vec![Collect::new("https://example.com/", "", Slot::Ia)];
        let err = client.push(&cols).await.unwrap_err();
        assert!(matches!(err, IndexError::IndexNotMatch(_)));
    }

    #[tokio::test]
    async fn test_push_empty_is_error_without_request() {
        let server = MockServer::start().await;
        let client = MeiliClient::new(server.uri(), "", "").unwrap();
        let err = client.push(&[]).await.unwrap_err();
        assert!(matches!(err, IndexError::EmptyCollects));
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}
