//! Signing key resolution (raw hex or bech32 `nsec`)

use std::fmt;

use secp256k1::{Keypair, Secp256k1, SecretKey};

use contracts::ContractError;

const NAME: &str = "nostr";
const NSEC_HRP: &str = "nsec";

/// BIP-340 keypair with its x-only public key
#[derive(Clone)]
pub struct SigningKey {
    keypair: Keypair,
    public_key: [u8; 32],
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Accepts 64 hex characters or an `nsec1...` string
    pub fn parse(input: &str) -> Result<Self, ContractError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ContractError::credential(NAME, "private key is blank"));
        }
        let secret = if input.to_ascii_lowercase().starts_with(NSEC_HRP) {
            decode_nsec(input)?
        } else {
            hex::decode(input)
                .map_err(|e| ContractError::credential(NAME, format!("invalid hex key: {e}")))?
        };
        Self::from_bytes(&secret)
    }

    pub fn from_bytes(secret: &[u8]) -> Result<Self, ContractError> {
        let secp = Secp256k1::new();
        let keypair = Keypair::from_seckey_slice(&secp, secret)
            .map_err(|e| ContractError::credential(NAME, format!("invalid secret key: {e}")))?;
        let public_key = keypair.x_only_public_key().0.serialize();
        Ok(Self {
            keypair,
            public_key,
        })
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.public_key
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }

    pub fn secret_key(&self) -> SecretKey {
        self.keypair.secret_key()
    }
}

fn decode_nsec(input: &str) -> Result<Vec<u8>, ContractError> {
    let (hrp, data) = bech32::decode(input)
        .map_err(|e| ContractError::credential(NAME, format!("decode private key failed: {e}")))?;
    if hrp.to_lowercase() != NSEC_HRP {
        return Err(ContractError::credential(
            NAME,
            format!("unexpected key prefix {hrp}"),
        ));
    }
    Ok(data)
}
