//! Shared HTTP plumbing for platform publishers

use std::time::Duration;

use contracts::ContractError;
use reqwest::{Client, Response, StatusCode};

const TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = "WaybackArchiver/1.0";

pub(crate) fn client(destination: &str) -> Result<Client, ContractError> {
    Client::builder()
        .timeout(TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ContractError::connection(destination, e.to_string()))
}

/// Map a transport failure onto the connection category
pub(crate) fn transport(endpoint: &str, err: reqwest::Error) -> ContractError {
    ContractError::connection(endpoint, err.to_string())
}

/// Require `expected`, otherwise fail with a status mismatch carrying the body
pub(crate) async fn expect_status(
    endpoint: &str,
    resp: Response,
    expected: StatusCode,
) -> Result<Response, ContractError> {
    let status = resp.status();
    if status == expected {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ContractError::Status {
        endpoint: endpoint.to_string(),
        status: format!("{} {}", status.as_u16(), body.trim()),
        expected: expected.as_u16().to_string(),
    })
}

/// Hide everything but the tail of a secret
pub(crate) fn redact(secret: &str) -> String {
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(redact("short"), "****");
        assert_eq!(redact("123456:ABCDEFGHIJ"), "****GHIJ");
    }
}
