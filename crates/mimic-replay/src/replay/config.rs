use serde::{Deserialize, Serialize};

use mimic_kernel::llm::ModelInfo;

use super::client::ReplayResponse;

/// Serializable configuration of a [`ReplayClient`](super::ReplayClient).
///
/// Only the response source and the model descriptor are part of the shape;
/// cursor position, usage counters, and the call log are runtime state and a
/// client reconstructed from config always starts fresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayClientConfig {
    pub responses: Vec<ReplayResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_kernel::llm::{CreateResult, RequestUsage};

    #[test]
    fn config_round_trips_through_json() {
        let config = ReplayClientConfig {
            responses: vec![
                ReplayResponse::Text("Hello there".into()),
                ReplayResponse::Result(CreateResult::stop(
                    "canned",
                    RequestUsage::new(5, 7),
                    false,
                )),
            ],
            model_info: Some(ModelInfo::default()),
        };

        let json = serde_json::to_string(&config).unwrap();
        let restored: ReplayClientConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, config);
    }

    #[test]
    fn text_entries_serialize_as_bare_strings() {
        let config = ReplayClientConfig {
            responses: vec![ReplayResponse::Text("Bye".into())],
            model_info: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"responses":["Bye"]}"#);
    }
}
