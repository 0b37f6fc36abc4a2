//! Signed text-note event

use chrono::{DateTime, Utc};
use secp256k1::{schnorr, Message, Secp256k1, XOnlyPublicKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use contracts::ContractError;

use super::keys::SigningKey;

/// Kind of a short text note
pub const KIND_TEXT_NOTE: u16 = 1;

/// Immutable once signed; shared read-only by every relay task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u16,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

impl Event {
    /// Build and sign a kind-1 note
    pub fn text_note(
        key: &SigningKey,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ContractError> {
        let pubkey = key.public_key_hex();
        let content = content.into();
        let created_at = created_at.timestamp();
        let tags = Vec::new();

        let digest = event_hash(&pubkey, created_at, KIND_TEXT_NOTE, &tags, &content)?;
        let secp = Secp256k1::signing_only();
        let sig = secp.sign_schnorr_no_aux_rand(&Message::from_digest(digest), key.keypair());

        Ok(Self {
            id: hex::encode(digest),
            pubkey,
            created_at,
            kind: KIND_TEXT_NOTE,
            tags,
            content,
            sig: hex::encode(sig.serialize()),
        })
    }

    /// Check the id matches the content and the signature matches the id
    pub fn verify(&self) -> Result<(), ContractError> {
        let digest = event_hash(
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        )?;
        if hex::encode(digest) != self.id {
            return Err(invalid("id does not match content"));
        }

        let pubkey = hex::decode(&self.pubkey)
            .ok()
            .and_then(|b| XOnlyPublicKey::from_slice(&b).ok())
            .ok_or_else(|| invalid("malformed pubkey"))?;
        let sig = hex::decode(&self.sig)
            .ok()
            .and_then(|b| schnorr::Signature::from_slice(&b).ok())
            .ok_or_else(|| invalid("malformed signature"))?;

        Secp256k1::verification_only()
            .verify_schnorr(&sig, &Message::from_digest(digest), &pubkey)
            .map_err(|_| invalid("bad signature"))
    }

    /// Client-to-relay frame: `["EVENT", <event>]`
    pub fn to_message(&self) -> Result<String, ContractError> {
        serde_json::to_string(&("EVENT", self))
            .map_err(|e| ContractError::Other(format!("encode nostr event: {e}")))
    }
}

/// sha256 over `[0, pubkey, created_at, kind, tags, content]`
fn event_hash(
    pubkey: &str,
    created_at: i64,
    kind: u16,
    tags: &[Vec<String>],
    content: &str,
) -> Result<[u8; 32], ContractError> {
    let canonical = serde_json::to_string(&(0, pubkey, created_at, kind, tags, content))
        .map_err(|e| ContractError::Other(format!("encode nostr event: {e}")))?;
    Ok(Sha256::digest(canonical.as_bytes()).into())
}

fn invalid(message: &str) -> ContractError {
    ContractError::validation("nostr", format!("invalid event: {message}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const HEX_KEY: &str = "67dea2ed018072d675f5415ecfaed7d2597555e202d85b3d65ea4e58d2d92ffa";

    fn note() -> Event {
        let key = SigningKey::parse(HEX_KEY).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        Event::text_note(&key, "https://example.com\nia: https://web.archive.org/x", at).unwrap()
    }

    #[test]
    fn test_signed_note_verifies() {
        let ev = note();
        assert_eq!(ev.kind, KIND_TEXT_NOTE);
        assert_eq!(ev.created_at, 1_704_164_645);
        assert_eq!(ev.id.len(), 64);
        assert_eq!(ev.sig.len(), 128);
        ev.verify().unwrap();
    }

    #[test]
    fn test_signing_is_deterministic() {
        assert_eq!(note(), note());
    }

    #[test]
    fn test_tampered_content_fails_verify() {
        let mut ev = note();
        ev.content.push('!');
        assert!(ev.verify().is_err());
    }

    #[test]
    fn test_tampered_signature_fails_verify() {
        let mut ev = note();
        let replacement = if ev.sig.starts_with('0') { "1" } else { "0" };
        ev.sig.replace_range(0..1, replacement);
        assert!(ev.verify().is_err());
    }

    #[test]
    fn test_event_frame() {
        let ev = note();
        let frame: serde_json::Value = serde_json::from_str(&ev.to_message().unwrap()).unwrap();
        assert_eq!(frame[0], "EVENT");
        assert_eq!(frame[1]["id"], ev.id);
        assert_eq!(frame[1]["tags"], serde_json::json!([]));
    }
}
