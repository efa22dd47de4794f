use crate::core::communication::message::Request;
use crate::domain::config::{default_subscriptions, SubscriptionConfig};
use crate::domain::error::MaasLinkResult;

/// Ordered set of requests that re-register interest in server-pushed
/// updates. Request ids are the 1-based positions, so every replay sends the
/// same distinct ids.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionSet {
    requests: Vec<Request>,
    payloads: Vec<String>,
}

impl SubscriptionSet {
    pub fn from_configs(configs: &[SubscriptionConfig]) -> MaasLinkResult<Self> {
        let requests: Vec<Request> = configs
            .iter()
            .enumerate()
            .map(|(index, config)| {
                Request::new(config.method.clone(), index as u64 + 1)
                    .with_params(config.params.clone())
            })
            .collect();

        let payloads = requests
            .iter()
            .map(Request::to_json)
            .collect::<MaasLinkResult<Vec<_>>>()?;

        Ok(Self { requests, payloads })
    }

    pub fn empty() -> Self {
        Self {
            requests: Vec::new(),
            payloads: Vec::new(),
        }
    }

    pub fn requests(&self) -> &[Request] {
        &self.requests
    }

    /// Serialized requests in send order
    pub fn payloads(&self) -> &[String] {
        &self.payloads
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl Default for SubscriptionSet {
    fn default() -> Self {
        Self::from_configs(&default_subscriptions()).unwrap_or_else(|_| Self::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_default_set() {
        let set = SubscriptionSet::default();
        let methods: Vec<_> = set.requests().iter().map(|r| r.method.as_str()).collect();

        assert_eq!(
            methods,
            vec![
                "user.auth_user",
                "notification.list",
                "resourcepool.list",
                "machine.list"
            ]
        );
        let ids: Vec<_> = set.requests().iter().map(|r| r.request_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_payloads_match_requests() {
        let set = SubscriptionSet::default();
        assert_eq!(set.payloads().len(), set.len());

        let machine_list: Value = serde_json::from_str(&set.payloads()[3]).unwrap();
        assert_eq!(machine_list["method"], "machine.list");
        assert_eq!(machine_list["type"], 0);
        assert_eq!(machine_list["request_id"], 4);
        assert_eq!(machine_list["params"]["sort_key"], "hostname");

        let auth: Value = serde_json::from_str(&set.payloads()[0]).unwrap();
        assert!(auth.get("params").is_none());
    }

    #[test]
    fn test_custom_set() {
        let configs = vec![
            SubscriptionConfig::new("zone.list"),
            SubscriptionConfig::new("pod.list"),
        ];
        let set = SubscriptionSet::from_configs(&configs).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.requests()[1].method, "pod.list");
        assert_eq!(set.requests()[1].request_id, 2);
        assert!(SubscriptionSet::empty().is_empty());
    }
}
