//! Orchestrator - fan-out across every registered destination

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use contracts::{Collect, ContractError, Flag, PublishOptions};
use indexing::MeiliClient;

use crate::context::{Connections, PublishContext};
use crate::dispatcher::Dispatcher;
use crate::metrics::{DestinationMetrics, MetricsSnapshot};
use crate::pacing::Pacing;
use crate::publisher::{origin, Publisher};
use crate::publishers::{
    GitHubPublisher, MastodonClient, MastodonPublisher, NostrPublisher, TelegramBot,
    TelegramPublisher,
};

/// Enablement predicate, evaluated on every dispatch
pub type EnabledFn = dyn Fn(&PublishOptions) -> bool + Send + Sync;

/// Publisher constructor; may hydrate from a live connection handle
pub type BuildFn =
    dyn Fn(&PublishOptions, &Connections) -> Result<Arc<dyn Publisher>, ContractError> + Send + Sync;

/// One registry row: name, enablement check and constructor
#[derive(Clone)]
pub struct Destination {
    name: String,
    flag: Option<Flag>,
    enabled: Arc<EnabledFn>,
    build: Arc<BuildFn>,
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Destination")
            .field("name", &self.name)
            .field("flag", &self.flag)
            .finish_non_exhaustive()
    }
}

impl Destination {
    pub fn new<E, B>(name: impl Into<String>, enabled: E, build: B) -> Self
    where
        E: Fn(&PublishOptions) -> bool + Send + Sync + 'static,
        B: Fn(&PublishOptions, &Connections) -> Result<Arc<dyn Publisher>, ContractError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            flag: None,
            enabled: Arc::new(enabled),
            build: Arc::new(build),
        }
    }

    /// Key of the live connection handed to the builder
    pub fn with_flag(mut self, flag: Flag) -> Self {
        self.flag = Some(flag);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flag(&self) -> Option<Flag> {
        self.flag
    }
}

/// Stock destinations
pub fn builtin_destinations() -> Vec<Destination> {
    vec![
        Destination::new("telegram", PublishOptions::publish_to_channel, build_telegram)
            .with_flag(Flag::Telegram),
        Destination::new("mastodon", PublishOptions::publish_to_mastodon, build_mastodon)
            .with_flag(Flag::Mastodon),
        Destination::new("github", PublishOptions::publish_to_issues, build_github),
        Destination::new("nostr", PublishOptions::publish_to_nostr, build_nostr),
    ]
}

fn build_telegram(
    opts: &PublishOptions,
    conns: &Connections,
) -> Result<Arc<dyn Publisher>, ContractError> {
    let tg = opts
        .telegram
        .as_ref()
        .ok_or_else(|| ContractError::validation("telegram", "missing telegram section"))?;
    let bot = match conns.telegram() {
        Some(bot) => bot.clone(),
        None => TelegramBot::from_options(tg)?,
    };
    Ok(Arc::new(TelegramPublisher::new(bot, &tg.channel)))
}

fn build_mastodon(
    opts: &PublishOptions,
    conns: &Connections,
) -> Result<Arc<dyn Publisher>, ContractError> {
    let mastodon = opts
        .mastodon
        .as_ref()
        .ok_or_else(|| ContractError::validation("mastodon", "missing mastodon section"))?;
    let client = match conns.mastodon() {
        Some(client) => client.clone(),
        None => MastodonClient::from_options(mastodon)?,
    };
    Ok(Arc::new(MastodonPublisher::new(client, &mastodon.visibility)))
}

fn build_github(
    opts: &PublishOptions,
    _conns: &Connections,
) -> Result<Arc<dyn Publisher>, ContractError> {
    let github = opts
        .github
        .as_ref()
        .ok_or_else(|| ContractError::validation("github", "missing github section"))?;
    Ok(Arc::new(GitHubPublisher::new(github)?))
}

fn build_nostr(
    opts: &PublishOptions,
    _conns: &Connections,
) -> Result<Arc<dyn Publisher>, ContractError> {
    Ok(Arc::new(NostrPublisher::new(opts)))
}

/// Result of one destination branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Predicate was false
    Skipped,
    Delivered,
    Failed(String),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped => f.write_str("skipped"),
            Self::Delivered => f.write_str("delivered"),
            Self::Failed(msg) => write!(f, "failed: {msg}"),
        }
    }
}

/// What happened to every branch of one `to` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Sorted by destination name
    pub outcomes: Vec<(String, Outcome)>,
    /// Search index branch; `None` when no indexer is attached
    pub index: Option<Outcome>,
}

impl DispatchReport {
    pub fn outcome(&self, destination: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == destination)
            .map(|(_, outcome)| outcome)
    }

    pub fn delivered(&self) -> impl Iterator<Item = &str> {
        self.filter(|o| matches!(o, Outcome::Delivered))
    }

    pub fn failed(&self) -> impl Iterator<Item = &str> {
        self.filter(|o| matches!(o, Outcome::Failed(_)))
    }

    fn filter<F>(&self, pred: F) -> impl Iterator<Item = &str>
    where
        F: Fn(&Outcome) -> bool,
    {
        self.outcomes
            .iter()
            .filter(move |(_, outcome)| pred(outcome))
            .map(|(name, _)| name.as_str())
    }
}

/// Publishes a record set to every enabled destination concurrently.
///
/// Failures are absorbed per destination: logged, counted and reported,
/// never returned as an error.
pub struct Orchestrator {
    options: Arc<RwLock<PublishOptions>>,
    destinations: Vec<Destination>,
    metrics: HashMap<String, Arc<DestinationMetrics>>,
    indexer: Option<Arc<MeiliClient>>,
    pacing: Option<Pacing>,
}

impl Orchestrator {
    /// Orchestrator over the built-in destinations
    pub fn new(options: PublishOptions) -> Self {
        Self::with_destinations(options, builtin_destinations())
    }

    pub fn with_destinations(options: PublishOptions, destinations: Vec<Destination>) -> Self {
        let mut orchestrator = Self {
            options: Arc::new(RwLock::new(options)),
            destinations: Vec::new(),
            metrics: HashMap::new(),
            indexer: None,
            pacing: None,
        };
        for destination in destinations {
            orchestrator.register(destination);
        }
        orchestrator
    }

    /// Add a destination; a destination with the same name is replaced
    pub fn register(&mut self, destination: Destination) {
        self.metrics
            .entry(destination.name.clone())
            .or_insert_with(|| Arc::new(DestinationMetrics::new()));
        self.destinations.retain(|d| d.name != destination.name);
        self.destinations.push(destination);
    }

    /// Feed the search index after delivery
    pub fn with_indexer(mut self, indexer: MeiliClient) -> Self {
        self.indexer = Some(Arc::new(indexer));
        self
    }

    /// Override the configured pacing bound
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = Some(pacing);
        self
    }

    /// Shared handle to the live options; writes are seen by the next dispatch
    pub fn options(&self) -> Arc<RwLock<PublishOptions>> {
        Arc::clone(&self.options)
    }

    pub fn update_options(&self, options: PublishOptions) {
        let mut guard = self.options.write().unwrap_or_else(|e| e.into_inner());
        *guard = options;
    }

    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        self.destinations.iter()
    }

    /// Metrics per destination, sorted by name
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        let mut snapshots: Vec<_> = self
            .metrics
            .iter()
            .map(|(name, m)| (name.clone(), m.snapshot()))
            .collect();
        snapshots.sort_by(|a, b| a.0.cmp(&b.0));
        snapshots
    }

    /// Publish `cols` to every enabled destination.
    #[instrument(
        name = "orchestrator_to",
        skip_all,
        fields(from = %origin(args), records = cols.len())
    )]
    pub async fn to(&self, ctx: &PublishContext, cols: &[Collect], args: &[String]) -> DispatchReport {
        let cols: Arc<[Collect]> = Arc::from(cols);
        let args: Arc<[String]> = Arc::from(args);

        let branches: Vec<(String, JoinHandle<Outcome>)> = self
            .destinations
            .iter()
            .map(|destination| {
                let name = destination.name.clone();
                let handle = tokio::spawn(run_destination(
                    ctx.clone(),
                    destination.clone(),
                    Arc::clone(&self.options),
                    self.metrics_for(&name),
                    self.pacing,
                    Arc::clone(&cols),
                    Arc::clone(&args),
                ));
                (name, handle)
            })
            .collect();

        let index_branch = self.spawn_index(Arc::clone(&cols));

        let mut outcomes = Vec::with_capacity(branches.len());
        for (name, handle) in branches {
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(destination = %name, error = ?e, "Destination task panicked");
                    self.metrics_for(&name).inc_failed();
                    Outcome::Failed(format!("task panicked: {e}"))
                }
            };
            outcomes.push((name, outcome));
        }
        outcomes.sort_by(|a, b| a.0.cmp(&b.0));

        let index = match index_branch {
            Some(handle) => Some(match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(error = ?e, "Index task panicked");
                    Outcome::Failed(format!("task panicked: {e}"))
                }
            }),
            None => None,
        };

        let report = DispatchReport { outcomes, index };
        info!(
            delivered = report.delivered().count(),
            failed = report.failed().count(),
            "Dispatch finished"
        );
        report
    }

    fn metrics_for(&self, name: &str) -> Arc<DestinationMetrics> {
        self.metrics
            .get(name)
            .cloned()
            .unwrap_or_else(|| Arc::new(DestinationMetrics::new()))
    }

    fn spawn_index(&self, cols: Arc<[Collect]>) -> Option<JoinHandle<Outcome>> {
        let indexer = Arc::clone(self.indexer.as_ref()?);
        let options = Arc::clone(&self.options);
        Some(tokio::spawn(async move {
            let enabled = options
                .read()
                .unwrap_or_else(|e| e.into_inner())
                .enabled_meilisearch();
            if !enabled {
                return Outcome::Skipped;
            }
            match indexer.push(&cols).await {
                Ok(()) => Outcome::Delivered,
                Err(e) => {
                    warn!(index = %indexer.index(), error = %e, "Push to search index failed");
                    Outcome::Failed(e.to_string())
                }
            }
        }))
    }
}

async fn run_destination(
    ctx: PublishContext,
    destination: Destination,
    options: Arc<RwLock<PublishOptions>>,
    metrics: Arc<DestinationMetrics>,
    pacing: Option<Pacing>,
    cols: Arc<[Collect]>,
    args: Arc<[String]>,
) -> Outcome {
    let name = destination.name.as_str();
    let opts = options.read().unwrap_or_else(|e| e.into_inner()).clone();

    if !(destination.enabled)(&opts) {
        debug!(destination = %name, "Destination disabled");
        metrics.inc_skipped();
        observability::record_destination_skipped(name);
        return Outcome::Skipped;
    }

    debug!(destination = %name, from = %origin(&args), "Publishing");
    metrics.inc_attempts();

    let conns = ctx.connections().scoped(destination.flag);
    let publisher = match (destination.build)(&opts, &conns) {
        Ok(publisher) => publisher,
        Err(e) => {
            error!(destination = %name, error = %e, "Build publisher failed");
            metrics.inc_failed();
            return Outcome::Failed(e.to_string());
        }
    };

    let dispatcher = Dispatcher::new(pacing.unwrap_or_else(|| Pacing::from_secs(opts.max_delay_secs)));
    match dispatcher.process(&ctx, publisher, &cols, &args).await {
        Ok(()) => {
            metrics.inc_delivered();
            Outcome::Delivered
        }
        Err(e) => {
            if e.is_cancellation() {
                metrics.inc_cancelled();
            } else {
                metrics.inc_failed();
            }
            error!(destination = %name, error = %e, "Publish failed");
            Outcome::Failed(e.to_string())
        }
    }
}
