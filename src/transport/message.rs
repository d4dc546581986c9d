use serde::Deserialize;

/// Client-to-server control frame:
/// `{ "subscriptionType": "news", "value": "subscribe" }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlFrame {
    #[serde(default)]
    pub subscription_type: String,
    pub value: SubscriptionAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
}
