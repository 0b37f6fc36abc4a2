//! 发布指标模块
//!
//! 记录各发布目的地的请求/成功/失败计数以及中继确认。

use metrics::{counter, histogram};
use std::fmt;

/// 发布状态标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// 发起请求
    Request,
    /// 投递成功
    Success,
    /// 投递失败
    Failure,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Request => "request",
            PublishStatus::Success => "success",
            PublishStatus::Failure => "failure",
        }
    }
}

impl fmt::Display for PublishStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 记录一次发布状态
///
/// # Example
///
/// ```ignore
/// use observability::metrics::{record_publish, PublishStatus};
///
/// record_publish("nostr", PublishStatus::Request);
/// ```
pub fn record_publish(destination: &str, status: PublishStatus) {
    counter!(
        "wayback_publish_total",
        "destination" => destination.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
}

/// 记录中继确认结果
pub fn record_relay_ack(relay: &str, succeeded: bool) {
    let status = if succeeded { "success" } else { "failure" };
    counter!(
        "wayback_publish_relay_ack_total",
        "relay" => relay.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录单个目的地的分发耗时 (秒)
pub fn record_dispatch_duration(destination: &str, secs: f64) {
    histogram!(
        "wayback_publish_dispatch_seconds",
        "destination" => destination.to_string()
    )
    .record(secs);
}

/// 记录被跳过的目的地 (未启用)
pub fn record_destination_skipped(destination: &str) {
    counter!(
        "wayback_publish_skipped_total",
        "destination" => destination.to_string()
    )
    .increment(1);
}
