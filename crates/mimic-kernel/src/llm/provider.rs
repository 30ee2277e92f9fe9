use async_trait::async_trait;

use super::streaming::CreateStream;
use super::types::*;

/// Model family tag carried by [`ModelInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ModelFamily {
    Gpt,
    Claude,
    Gemini,
    Llama,
    #[default]
    Unknown,
}

/// Claimed model capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModelCapabilities {
    /// Image inputs
    pub vision: bool,
    /// Function/tool calling
    pub tools: bool,
    /// JSON output mode
    pub json_mode: bool,
    /// Schema-constrained (structured) output
    pub json_schema: bool,
}

/// Static model descriptor: which features a client claims to support.
///
/// The default descriptor claims nothing: no advanced capabilities, unknown
/// family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ModelInfo {
    pub family: ModelFamily,
    pub capabilities: ModelCapabilities,
}

/// Reject internally inconsistent descriptors.
///
/// Schema-constrained output is a refinement of JSON output; a descriptor
/// claiming `json_schema` without `json_mode` describes a model that cannot
/// exist.
pub fn validate_model_info(info: &ModelInfo) -> LLMResult<()> {
    if info.capabilities.json_schema && !info.capabilities.json_mode {
        return Err(LLMError::ConfigError(
            "model info claims json_schema support without json_mode".to_string(),
        ));
    }
    Ok(())
}

/// Canonical completion-client trait.
///
/// Implementations serve completion requests either in one piece
/// ([`create`](Self::create)) or as a finite stream of fragments terminated
/// by exactly one full result ([`create_stream`](Self::create_stream)), and
/// keep per-request and cumulative token-usage counters.
#[async_trait]
pub trait ChatCompletionClient: Send + Sync {
    /// Serve one completion.
    async fn create(&self, request: CreateRequest) -> LLMResult<CreateResult>;

    /// Serve one completion as a stream of deltas followed by the result.
    async fn create_stream(&self, request: CreateRequest) -> LLMResult<CreateStream>;

    /// Usage of the most recent request.
    fn actual_usage(&self) -> RequestUsage;

    /// Cumulative usage since construction or the last reset.
    fn total_usage(&self) -> RequestUsage;

    /// Token count for the given messages.
    fn count_tokens(&self, messages: &[ChatMessage], tools: &[Tool]) -> u32;

    /// Tokens left in the client's context budget.
    fn remaining_tokens(&self, messages: &[ChatMessage], tools: &[Tool]) -> u32;

    /// Static model descriptor.
    fn model_info(&self) -> ModelInfo;

    /// Deprecated alias for [`model_info`](Self::model_info).
    #[deprecated(note = "use model_info instead")]
    fn capabilities(&self) -> ModelInfo {
        tracing::warn!("capabilities() is deprecated, use model_info()");
        self.model_info()
    }

    /// Release any held resources.
    async fn close(&self) -> LLMResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_info_claims_nothing() {
        let info = ModelInfo::default();
        assert_eq!(info.family, ModelFamily::Unknown);
        assert!(!info.capabilities.vision);
        assert!(!info.capabilities.tools);
        assert!(!info.capabilities.json_mode);
        assert!(!info.capabilities.json_schema);
        assert!(validate_model_info(&info).is_ok());
    }

    #[test]
    fn validate_rejects_json_schema_without_json_mode() {
        let info = ModelInfo {
            family: ModelFamily::Gpt,
            capabilities: ModelCapabilities {
                json_schema: true,
                ..Default::default()
            },
        };
        match validate_model_info(&info) {
            Err(LLMError::ConfigError(msg)) => assert!(msg.contains("json_schema")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_json_schema_with_json_mode() {
        let info = ModelInfo {
            family: ModelFamily::Claude,
            capabilities: ModelCapabilities {
                json_mode: true,
                json_schema: true,
                ..Default::default()
            },
        };
        assert!(validate_model_info(&info).is_ok());
    }

    #[test]
    fn model_family_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ModelFamily::Claude).unwrap(),
            r#""claude""#
        );
        let family: ModelFamily = serde_json::from_str(r#""unknown""#).unwrap();
        assert_eq!(family, ModelFamily::Unknown);
    }
}
