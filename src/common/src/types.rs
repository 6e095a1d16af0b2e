use serde::Deserialize;

/// Brand assumed when a record does not say which brand it belongs to.
pub const DEFAULT_BRAND: &str = "channelYoga";
/// Display form of the default brand, as the collector sends it in track
/// properties.
pub const DEFAULT_BRAND_DISPLAY: &str = "Channel Yoga";
/// Track event the backend emits right after a signup. The only track event
/// allowed to proceed before the identity service has caught up.
pub const EVENT_ACCOUNT_CREATED: &str = "Account Created - Server";
/// Prefix of brand-nested trait keys, e.g. `brand_channelYoga`.
pub const TRAIT_BRAND_PREFIX: &str = "brand_";

/// Per-deployment settings. Supplied once per invocation, read-only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub api_host: String,
    pub brand: String,
    pub timeshift_api_bearer_token: String,
}
