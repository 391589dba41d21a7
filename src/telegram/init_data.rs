//! Verification of Telegram mini-app init data
//!
//! The mini-app receives a query-string blob signed by Telegram. The data
//! check string is every `key=value` pair except `hash`, sorted by key and
//! joined with `\n`; the signature is HMAC-SHA256 over it keyed with
//! SHA-256 of the bot token.

use crate::errors::SignatureError;
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

const HASH_FIELD: &str = "hash";
const USER_FIELD: &str = "user";

/// Init data that passed signature and allow-list checks
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedInitData {
    /// Signed pairs, `hash` removed
    pub pairs: BTreeMap<String, String>,
    pub user: Value,
    pub user_id: i64,
}

/// Verify `init_data` against the bot token and the user allow-list
///
/// An empty allow-list rejects everyone.
pub fn verify_init_data(
    init_data: &str,
    bot_token: &str,
    allowed_user_ids: &[i64],
) -> Result<VerifiedInitData, SignatureError> {
    if init_data.is_empty() {
        return Err(SignatureError::MissingInitData);
    }

    // Repeated keys: the last value wins
    let mut pairs: BTreeMap<String, String> = url::form_urlencoded::parse(init_data.as_bytes())
        .into_owned()
        .collect();
    let received = pairs.remove(HASH_FIELD).ok_or(SignatureError::MissingHash)?;

    let expected = hex::decode(received.trim()).map_err(|_| SignatureError::InvalidSignature)?;
    let mut mac = signer(bot_token)?;
    Mac::update(&mut mac, data_check_string(&pairs).as_bytes());
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::InvalidSignature)?;

    let raw_user = pairs
        .get(USER_FIELD)
        .filter(|u| !u.is_empty())
        .ok_or(SignatureError::MissingUser)?;
    let user: Value = serde_json::from_str(raw_user).map_err(|_| SignatureError::InvalidUser)?;

    let user_id = user.get("id").and_then(Value::as_i64);
    match user_id {
        Some(id) if allowed_user_ids.contains(&id) => Ok(VerifiedInitData {
            pairs,
            user,
            user_id: id,
        }),
        _ => Err(SignatureError::UserNotAllowed),
    }
}

fn data_check_string(pairs: &BTreeMap<String, String>) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

fn signer(bot_token: &str) -> Result<HmacSha256, SignatureError> {
    let secret_key = Sha256::digest(bot_token.as_bytes());
    <HmacSha256 as Mac>::new_from_slice(&secret_key).map_err(|_| SignatureError::InvalidSignature)
}

/// Hex signature Telegram would attach to `pairs`
pub fn sign_pairs(
    pairs: &BTreeMap<String, String>,
    bot_token: &str,
) -> Result<String, SignatureError> {
    let mut mac = signer(bot_token)?;
    Mac::update(&mut mac, data_check_string(pairs).as_bytes());
    Ok(hex::encode(Mac::finalize(mac).into_bytes()))
}
