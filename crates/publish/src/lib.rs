//! # Publish
//!
//! 归档结果分发模块。
//!
//! 负责：
//! - 按 source 分组 `Collect`
//! - Fan-out 到所有启用的目的地（每个目的地独立失败）
//! - 随机延迟，避免触发平台限流
//! - Nostr 多 relay 广播（全部成功才算成功）

pub mod context;
pub mod dispatcher;
pub mod extract;
pub mod metrics;
pub mod orchestrator;
pub mod pacing;
pub mod publisher;
pub mod publishers;
pub mod render;

pub use context::{Connections, PublishContext};
pub use contracts::{group_by_source, Collect, ContractError, Flag};
pub use dispatcher::Dispatcher;
pub use extract::{extract, extract_bundle};
pub use metrics::{DestinationMetrics, MetricsSnapshot};
pub use orchestrator::{builtin_destinations, Destination, DispatchReport, Orchestrator, Outcome};
pub use pacing::Pacing;
pub use publisher::{origin, Publisher};
pub use render::{PlainText, Render};
