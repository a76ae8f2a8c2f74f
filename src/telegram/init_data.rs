// src/telegram/init_data.rs

//! Validation of the `initData` string a Mini App receives from the Telegram client.
//!
//! Telegram signs the payload with HMAC-SHA256. The key is itself
//! `HMAC_SHA256(key = "WebAppData", msg = bot_token)`, and the signed message is the
//! data-check-string: every field except `hash`, as `key=value`, sorted by key and
//! joined with `\n`.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Tolerated clock skew for `auth_date` values in the future, in seconds.
const MAX_CLOCK_SKEW: i64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InitDataError {
    #[error("init data is missing the `{0}` field")]
    MissingField(&'static str),

    #[error("init data contains `{0}` more than once")]
    DuplicateField(String),

    #[error("init data hash is not valid hex")]
    MalformedHash,

    #[error("init data signature mismatch")]
    SignatureMismatch,

    #[error("init data has expired ({age} seconds old)")]
    Expired { age: i64 },

    #[error("init data is dated in the future")]
    FromFuture,

    #[error("init data carries an invalid user: {0}")]
    InvalidUser(String),
}

/// The Telegram user as described by the Mini App payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebAppUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

/// Init data after its signature and age have been checked.
#[derive(Debug, Clone)]
pub struct InitData {
    pub user: WebAppUser,
    pub auth_date: i64,
    pub query_id: Option<String>,
    pub start_param: Option<String>,
}

/// Validates `init_data` against the current wall clock.
pub fn validate(init_data: &str, bot_token: &str, max_age: u64) -> Result<InitData, InitDataError> {
    validate_at(init_data, bot_token, max_age, chrono::Utc::now().timestamp())
}

/// Validates `init_data` as if the current unix time were `now`.
pub fn validate_at(
    init_data: &str,
    bot_token: &str,
    max_age: u64,
    now: i64,
) -> Result<InitData, InitDataError> {
    let mut fields = parse_fields(init_data)?;

    let received_hash = fields
        .remove("hash")
        .ok_or(InitDataError::MissingField("hash"))?;
    let received_hash = hex::decode(received_hash).map_err(|_| InitDataError::MalformedHash)?;

    signer(bot_token, &fields)
        .verify_slice(&received_hash)
        .map_err(|_| InitDataError::SignatureMismatch)?;

    let auth_date: i64 = fields
        .get("auth_date")
        .ok_or(InitDataError::MissingField("auth_date"))?
        .parse()
        .map_err(|_| InitDataError::MissingField("auth_date"))?;

    let age = now - auth_date;
    if age < -MAX_CLOCK_SKEW {
        return Err(InitDataError::FromFuture);
    }
    if age > i64::try_from(max_age).unwrap_or(i64::MAX) {
        return Err(InitDataError::Expired { age });
    }

    let user = fields
        .get("user")
        .ok_or(InitDataError::MissingField("user"))?;
    let user: WebAppUser =
        serde_json::from_str(user).map_err(|e| InitDataError::InvalidUser(e.to_string()))?;

    Ok(InitData {
        user,
        auth_date,
        query_id: fields.remove("query_id"),
        start_param: fields.remove("start_param"),
    })
}

/// Produces a signed init data string, the way the Telegram client would.
///
/// Used by tests and for poking the API locally without a Telegram client.
pub fn sign_init_data(fields: &[(&str, &str)], bot_token: &str) -> String {
    let map: BTreeMap<String, String> = fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let hash = hex::encode(signer(bot_token, &map).finalize().into_bytes());

    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in &map {
        serializer.append_pair(key, value);
    }
    serializer.append_pair("hash", &hash);
    serializer.finish()
}

fn parse_fields(init_data: &str) -> Result<BTreeMap<String, String>, InitDataError> {
    let mut fields = BTreeMap::new();
    for (key, value) in url::form_urlencoded::parse(init_data.as_bytes()) {
        if fields.insert(key.to_string(), value.into_owned()).is_some() {
            return Err(InitDataError::DuplicateField(key.into_owned()));
        }
    }
    Ok(fields)
}

/// A MAC primed with the data-check-string of `fields` (which must not contain `hash`).
fn signer(bot_token: &str, fields: &BTreeMap<String, String>) -> HmacSha256 {
    let data_check_string = fields
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("\n");

    // HMAC accepts keys of any length, so `new_from_slice` cannot fail here.
    let mut secret = HmacSha256::new_from_slice(b"WebAppData")
        .unwrap_or_else(|_| unreachable!("HMAC takes keys of any size"));
    secret.update(bot_token.as_bytes());
    let secret = secret.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret)
        .unwrap_or_else(|_| unreachable!("HMAC takes keys of any size"));
    mac.update(data_check_string.as_bytes());
    mac
}
