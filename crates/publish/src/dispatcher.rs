//! Dispatcher - per-destination fan-out over source groups

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use contracts::{group_by_source, Collect, ContractError};

use crate::context::PublishContext;
use crate::pacing::Pacing;
use crate::publisher::{origin, Publisher};

/// Runs one destination against a record set.
///
/// One task per source group; each task waits its pacing delay, then races
/// the publisher call against the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct Dispatcher {
    pacing: Pacing,
}

impl Dispatcher {
    pub fn new(pacing: Pacing) -> Self {
        Self { pacing }
    }

    pub fn pacing(&self) -> Pacing {
        self.pacing
    }

    /// Deliver every source group to `publisher`.
    ///
    /// Returns the first group error observed. Remaining group tasks are
    /// detached, not aborted: they run to completion and log their own
    /// result.
    #[instrument(
        name = "dispatcher_process",
        skip_all,
        fields(destination = %publisher.name(), from = %origin(args))
    )]
    pub async fn process(
        &self,
        ctx: &PublishContext,
        publisher: Arc<dyn Publisher>,
        cols: &[Collect],
        args: &[String],
    ) -> Result<(), ContractError> {
        let groups = group_by_source(cols);
        if groups.is_empty() {
            return Err(ContractError::empty_collects(publisher.name()));
        }

        let started = Instant::now();
        let args: Arc<[String]> = Arc::from(args);
        let mut tasks = JoinSet::new();

        debug!(groups = groups.len(), "Dispatching source groups");

        for (source, group) in groups {
            let ctx = ctx.clone();
            let publisher = Arc::clone(&publisher);
            let args = Arc::clone(&args);
            let pacing = self.pacing;

            tasks.spawn(async move {
                let result = publish_part(&ctx, pacing, publisher.clone(), group, args).await;
                if let Err(e) = &result {
                    error!(
                        destination = %publisher.name(),
                        source = %source,
                        error = %e,
                        "Publish source group failed"
                    );
                }
                result
            });
        }

        let mut outcome = Ok(());
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => Err(ContractError::Panicked {
                    task: publisher.name().to_string(),
                    message: e.to_string(),
                }),
            };
            if let Err(e) = result {
                outcome = Err(e);
                break;
            }
        }

        if !tasks.is_empty() {
            warn!(
                pending = tasks.len(),
                "Returning early, remaining groups keep running detached"
            );
            tasks.detach_all();
        }

        observability::record_dispatch_duration(publisher.name(), started.elapsed().as_secs_f64());

        match &outcome {
            Ok(()) => info!("Destination delivered"),
            Err(e) => error!(error = %e, "Destination failed"),
        }
        outcome
    }
}

/// Pace, then race one publisher call against the context.
///
/// The publisher runs on its own task. When the context wins the race the
/// task is detached and keeps running; most platform SDKs offer no way to
/// tear down an in-flight request, so its result is dropped.
async fn publish_part(
    ctx: &PublishContext,
    pacing: Pacing,
    publisher: Arc<dyn Publisher>,
    group: Vec<Collect>,
    args: Arc<[String]>,
) -> Result<(), ContractError> {
    let delay = pacing.draw();
    if !delay.is_zero() {
        tokio::select! {
            biased;
            cause = ctx.done() => return Err(cause),
            _ = tokio::time::sleep(delay) => {}
        }
    }
    if let Some(cause) = ctx.err() {
        return Err(cause);
    }

    let call_ctx = ctx.clone();
    let mut call = tokio::spawn(async move { publisher.publish(&call_ctx, &group, &args).await });

    tokio::select! {
        biased;
        cause = ctx.done() => Err(cause),
        joined = &mut call => match joined {
            Ok(result) => result,
            Err(e) => Err(ContractError::Panicked {
                task: "publish".to_string(),
                message: e.to_string(),
            }),
        },
    }
}
