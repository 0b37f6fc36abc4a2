//! GitHub issue publisher

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use contracts::{Collect, ContractError, GitHubOptions};
use observability::{record_publish, PublishStatus};

use super::http;
use crate::context::PublishContext;
use crate::extract::extract_bundle;
use crate::publisher::Publisher;
use crate::render::{PlainText, Render};

const NAME: &str = "github";
const DEFAULT_TITLE: &str = "Published at Wayback Archiver";

#[derive(Serialize)]
struct NewIssue<'a> {
    title: &'a str,
    body: &'a str,
}

/// Opens one issue per source group in a repository
pub struct GitHubPublisher {
    http: Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
    renderer: Arc<dyn Render>,
}

impl GitHubPublisher {
    pub fn new(opts: &GitHubOptions) -> Result<Self, ContractError> {
        if opts.owner.trim().is_empty() || opts.repo.trim().is_empty() {
            return Err(ContractError::validation(NAME, "owner and repo are required"));
        }
        Ok(Self {
            http: http::client(NAME)?,
            api_base: opts.api_base.trim_end_matches('/').to_string(),
            token: opts.token.clone(),
            owner: opts.owner.clone(),
            repo: opts.repo.clone(),
            renderer: Arc::new(PlainText),
        })
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Render>) -> Self {
        self.renderer = renderer;
        self
    }

    async fn create_issue(&self, title: &str, body: &str) -> Result<(), ContractError> {
        let endpoint = format!("{}/repos/{}/{}/issues", self.api_base, self.owner, self.repo);
        let resp = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .json(&NewIssue { title, body })
            .send()
            .await
            .map_err(|e| http::transport(&endpoint, e))?;
        http::expect_status(&endpoint, resp, StatusCode::CREATED).await?;
        Ok(())
    }
}

#[async_trait]
impl Publisher for GitHubPublisher {
    fn name(&self) -> &str {
        NAME
    }

    #[instrument(name = "github_publish", skip_all, fields(owner = %self.owner, repo = %self.repo))]
    async fn publish(
        &self,
        ctx: &PublishContext,
        cols: &[Collect],
        _args: &[String],
    ) -> Result<(), ContractError> {
        if cols.is_empty() {
            return Err(ContractError::empty_collects(NAME));
        }
        record_publish(NAME, PublishStatus::Request);

        let (reduxer, title) = match extract_bundle(ctx, cols) {
            Ok((rdx, bundle)) => {
                let title = bundle
                    .article
                    .as_ref()
                    .map(|a| a.title.trim().to_string())
                    .filter(|t| !t.is_empty());
                (Some(rdx), title)
            }
            Err(e) => {
                warn!(error = %e, "Publishing without bundle");
                (None, None)
            }
        };
        let title = title.unwrap_or_else(|| DEFAULT_TITLE.to_string());
        let body = self.renderer.render(NAME, cols, reduxer);
        if body.trim().is_empty() {
            record_publish(NAME, PublishStatus::Failure);
            return Err(ContractError::validation(NAME, "issue body is blank"));
        }

        let result = self.create_issue(&title, &body).await;
        match &result {
            Ok(()) => {
                debug!("GitHub issue created");
                record_publish(NAME, PublishStatus::Success);
            }
            Err(_) => record_publish(NAME, PublishStatus::Failure),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Article, Bundle, Reduxer, Slot};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options(api_base: String) -> GitHubOptions {
        GitHubOptions {
            token: "ghp_token".to_string(),
            owner: "wabarc".to_string(),
            repo: "archives".to_string(),
            api_base,
        }
    }

    fn cols() -> Vec<Collect> {
        vec![Collect::new(
            "https://example.com",
            "https://web.archive.org/example",
            Slot::Ia,
        )]
    }

    #[tokio::test]
    async fn test_issue_uses_article_title() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/wabarc/archives/issues"))
            .and(body_partial_json(json!({"title": "Example Domain"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"number": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let mut reduxer = Reduxer::new();
        reduxer.insert(
            "https://example.com",
            Bundle {
                article: Some(Article {
                    title: "Example Domain".to_string(),
                    text: String::new(),
                }),
                ..Bundle::default()
            },
        );
        let ctx = PublishContext::new().with_reduxer(Arc::new(reduxer));

        GitHubPublisher::new(&options(server.uri()))
            .unwrap()
            .publish(&ctx, &cols(), &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_ok_instead_of_created_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = GitHubPublisher::new(&options(server.uri()))
            .unwrap()
            .publish(&PublishContext::new(), &cols(), &[])
            .await
            .unwrap_err();

        match err {
            ContractError::Status { expected, .. } => assert_eq!(expected, "201"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_repo_rejected() {
        let mut opts = options("https://api.github.com".to_string());
        opts.repo = " ".to_string();
        assert!(GitHubPublisher::new(&opts).is_err());
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let err = GitHubPublisher::new(&options(server.uri()))
            .unwrap()
            .publish(&PublishContext::new(), &[], &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::EmptyCollects { .. }));
    }
}
