//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置 -> 编排器 -> 各目的地的完整链路（wiremock 模拟平台）
//! - Nostr relay 广播（模拟 connector，无网络）
//! - 目的地之间的失败隔离

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{Collect, ContractError, PublishOptions, Reduxer, Slot};
    use indexing::MeiliClient;
    use publish::publishers::nostr::{
        Event, NostrPublisher, PublishStatus, RelayConnection, RelayConnector,
    };
    use publish::{
        Connections, Destination, Orchestrator, Outcome, Pacing, PublishContext, Publisher,
    };
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

    /// Relay that records every event it receives
    #[derive(Default)]
    struct RecordingRelays {
        rejected: Option<String>,
        events: Mutex<Vec<(String, Event)>>,
    }

    struct RecordingConnection {
        url: String,
        relays: Arc<RecordingRelays>,
    }

    #[async_trait]
    impl RelayConnection for RecordingConnection {
        async fn publish(&mut self, event: &Event) -> Result<PublishStatus, ContractError> {
            self.relays
                .events
                .lock()
                .unwrap()
                .push((self.url.clone(), event.clone()));
            if self.relays.rejected.as_deref() == Some(self.url.as_str()) {
                return Ok(PublishStatus::Failed("blocked".to_string()));
            }
            Ok(PublishStatus::Succeeded)
        }
    }

    struct RecordingConnector(Arc<RecordingRelays>);

    #[async_trait]
    impl RelayConnector for RecordingConnector {
        async fn connect(&self, url: &str) -> Result<Box<dyn RelayConnection>, ContractError> {
            Ok(Box::new(RecordingConnection {
                url: url.to_string(),
                relays: Arc::clone(&self.0),
            }))
        }
    }

    fn nostr_destination(relays: &Arc<RecordingRelays>) -> Destination {
        let relays = Arc::clone(relays);
        Destination::new(
            "nostr",
            PublishOptions::publish_to_nostr,
            move |opts: &PublishOptions, _conns: &Connections| {
                let connector = Arc::new(RecordingConnector(Arc::clone(&relays)));
                Ok(Arc::new(NostrPublisher::new(opts).with_connector(connector)) as Arc<dyn Publisher>)
            },
        )
    }

    fn config(platform: &str, meili: &str) -> PublishOptions {
        let toml = format!(
            r#"
max_delay_secs = 0

[telegram]
token = "123456:TOKEN"
channel = "@wayback_archives"
api_base = "{platform}"

[mastodon]
server = "{platform}"
access_token = "mastodon-token"

[github]
token = "ghp_token"
owner = "wabarc"
repo = "archives"
api_base = "{platform}"

[nostr]
private_key = "{KEY}"
relay_urls = ["wss://relay-1.example", "wss://relay-2.example"]

[meili]
endpoint = "{meili}"
api_key = "masterKey"
"#
        );
        ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap()
    }

    fn cols() -> Vec<Collect> {
        vec![
            Collect::new("https://example.com", "https://web.archive.org/example", Slot::Ia),
            Collect::new("https://example.com", "https://archive.ph/example", Slot::Is),
            Collect::new("https://example.org", "", Slot::Ia),
        ]
    }

    async fn mount_platforms(server: &MockServer, telegram_status: u16) {
        Mock::given(method("POST"))
            .and(path_regex(r"^/bot.+/sendMessage$"))
            .respond_with(
                ResponseTemplate::new(telegram_status).set_body_json(json!({"ok": telegram_status == 200})),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/statuses"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "1"})))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/wabarc/archives/issues"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"number": 1})))
            .mount(server)
            .await;
    }

    async fn mount_meili(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/indexes/capsules/documents"))
            .respond_with(ResponseTemplate::new(202).set_body_json(json!({
                "taskUid": 7,
                "indexUid": "capsules",
                "status": "enqueued",
                "type": "documentAdditionOrUpdate",
                "enqueuedAt": "2024-01-01T00:00:00Z"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    /// Config -> Orchestrator -> every destination + search index
    #[tokio::test]
    async fn test_e2e_publish_all_destinations() {
        let platform = MockServer::start().await;
        let meili = MockServer::start().await;
        mount_platforms(&platform, 200).await;
        mount_meili(&meili).await;

        let opts = config(&platform.uri(), &meili.uri());
        let relays = Arc::new(RecordingRelays::default());
        let mut orchestrator = Orchestrator::new(opts.clone())
            .with_pacing(Pacing::disabled())
            .with_indexer(MeiliClient::from_options(opts.meili.as_ref().unwrap()).unwrap());
        orchestrator.register(nostr_destination(&relays));

        let report = orchestrator
            .to(&PublishContext::new(), &cols(), &["e2e".to_string()])
            .await;

        for name in ["github", "mastodon", "nostr", "telegram"] {
            assert_eq!(report.outcome(name), Some(&Outcome::Delivered), "{name}");
        }
        assert_eq!(report.index, Some(Outcome::Delivered));

        // Two source groups per destination
        let requests = platform.received_requests().await.unwrap();
        assert_eq!(requests.len(), 6);

        // Two groups x two relays, one signature per group
        let events = relays.events.lock().unwrap().clone();
        assert_eq!(events.len(), 4);
        for (_, event) in &events {
            event.verify().unwrap();
        }
        let mut ids: Vec<_> = events.iter().map(|(_, e)| e.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 2);
    }

    /// One platform down never blocks the others
    #[tokio::test]
    async fn test_e2e_destination_failure_isolated() {
        let platform = MockServer::start().await;
        let meili = MockServer::start().await;
        mount_platforms(&platform, 500).await;

        let relays = Arc::new(RecordingRelays {
            rejected: Some("wss://relay-2.example".to_string()),
            ..RecordingRelays::default()
        });
        let mut orchestrator = Orchestrator::new(config(&platform.uri(), &meili.uri()))
            .with_pacing(Pacing::disabled());
        orchestrator.register(nostr_destination(&relays));

        // A single source group, so every relay task finishes before the report
        let report = orchestrator
            .to(&PublishContext::new(), &cols()[..1], &[])
            .await;

        assert!(matches!(report.outcome("telegram"), Some(Outcome::Failed(_))));
        // relay-2 rejected: the whole nostr destination fails
        assert!(matches!(report.outcome("nostr"), Some(Outcome::Failed(msg)) if msg.contains("relay-2")));
        assert_eq!(report.outcome("mastodon"), Some(&Outcome::Delivered));
        assert_eq!(report.outcome("github"), Some(&Outcome::Delivered));
        assert_eq!(report.index, None);

        // relay-1 was still attempted
        let events = relays.events.lock().unwrap();
        assert_eq!(
            events.iter().filter(|(url, _)| url == "wss://relay-1.example").count(),
            1
        );
    }

    /// Bundle from the capture pipeline enriches the outgoing message
    #[tokio::test]
    async fn test_e2e_bundle_enrichment() {
        let platform = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/wabarc/archives/issues"))
            .and(body_partial_json(json!({"title": "Example Domain"})))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&platform)
            .await;

        let mut opts = config(&platform.uri(), "http://127.0.0.1:7700");
        opts.telegram = None;
        opts.mastodon = None;
        opts.nostr = None;

        let reduxer: Reduxer = serde_json::from_value(json!({
            "https://example.com": {
                "artifact": {"img": "/var/wayback/example.png"},
                "article": {"title": "Example Domain", "text": "This domain is for use in examples."}
            }
        }))
        .unwrap();
        let ctx = PublishContext::new().with_reduxer(Arc::new(reduxer));

        let orchestrator = Orchestrator::new(opts).with_pacing(Pacing::disabled());
        let only_example = vec![Collect::new(
            "https://example.com",
            "https://web.archive.org/example",
            Slot::Ia,
        )];
        let report = orchestrator.to(&ctx, &only_example, &[]).await;

        assert_eq!(report.outcome("github"), Some(&Outcome::Delivered));
        assert_eq!(report.outcome("telegram"), Some(&Outcome::Skipped));
    }

    /// Environment overrides flow into the live predicates
    #[tokio::test]
    async fn test_e2e_env_override_enables_destination() {
        let relays = Arc::new(RecordingRelays::default());
        let orchestrator = Orchestrator::with_destinations(
            PublishOptions::default(),
            vec![nostr_destination(&relays)],
        )
        .with_pacing(Pacing::disabled());

        let skipped = orchestrator.to(&PublishContext::new(), &cols(), &[]).await;
        assert_eq!(skipped.outcome("nostr"), Some(&Outcome::Skipped));

        let mut opts = PublishOptions::default();
        config_loader::apply_env_overrides(
            &mut opts,
            [
                ("WAYBACK_NOSTR_PRIVATE_KEY", KEY),
                ("WAYBACK_NOSTR_RELAY_URL", "wss://relay-1.example,wss://relay-2.example"),
            ],
        )
        .unwrap();
        orchestrator.update_options(opts);

        let delivered = orchestrator.to(&PublishContext::new(), &cols(), &[]).await;
        assert_eq!(delivered.outcome("nostr"), Some(&Outcome::Delivered));
        assert_eq!(relays.events.lock().unwrap().len(), 4);

        let metrics = orchestrator.metrics();
        assert_eq!(metrics[0].0, "nostr");
        assert_eq!(metrics[0].1.skipped, 1);
        assert_eq!(metrics[0].1.delivered, 1);
    }

    /// Cancellation is reported distinctly from platform rejections
    #[tokio::test]
    async fn test_e2e_cancelled_context() {
        let platform = MockServer::start().await;
        let meili = MockServer::start().await;
        mount_platforms(&platform, 200).await;

        let orchestrator = Orchestrator::new(config(&platform.uri(), &meili.uri()))
            .with_pacing(Pacing::disabled());
        let ctx = PublishContext::new();
        ctx.cancel();

        let report = orchestrator.to(&ctx, &cols(), &[]).await;
        for (_, outcome) in &report.outcomes {
            assert_eq!(outcome, &Outcome::Failed("context canceled".to_string()));
        }
        assert!(platform.received_requests().await.unwrap().is_empty());
    }
}
