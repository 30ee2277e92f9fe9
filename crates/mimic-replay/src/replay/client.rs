use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::warn;

use mimic_kernel::llm::{
    ChatCompletionClient, ChatMessage, CreateRequest, CreateResult, CreateStream, FinishReason,
    LLMError, LLMResult, MessageContent, ModelInfo, RequestUsage, StreamItem, Tool, ToolChoice,
    validate_model_info,
};

use super::config::ReplayClientConfig;

/// Fixed synthetic context budget shared by every replay client.
const TOTAL_AVAILABLE_TOKENS: u32 = 10_000;

/// One canned entry in the response source list.
///
/// Plain text entries get their completion tokens counted and their result
/// record synthesized at request time; prebuilt results are returned with
/// their own completion-token count and cache flag intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReplayResponse {
    Text(String),
    Result(CreateResult),
}

impl From<&str> for ReplayResponse {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ReplayResponse {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<CreateResult> for ReplayResponse {
    fn from(result: CreateResult) -> Self {
        Self::Result(result)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal mutable state
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a request mutates, behind one lock.
///
/// Protected by `Arc<Mutex<…>>` so the `&self` async methods of
/// [`ChatCompletionClient`] can mutate it without `&mut self`. No await
/// point is held while the lock is taken.
struct ReplayState {
    /// Index of the next response to serve; never exceeds the list length.
    cursor: usize,
    /// Usage of the most recent request.
    cur_usage: RequestUsage,
    /// Cumulative usage since construction or the last reset.
    total_usage: RequestUsage,
    /// Cache flag stamped onto every synthesized result.
    cached: bool,
    /// Every request passed to `create`, in call order. The streaming path
    /// does not record here.
    create_calls: Vec<CreateRequest>,
}

impl Default for ReplayState {
    fn default() -> Self {
        Self {
            cursor: 0,
            cur_usage: RequestUsage::default(),
            total_usage: RequestUsage::default(),
            cached: true,
            create_calls: Vec::new(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Public type
// ─────────────────────────────────────────────────────────────────────────────

/// A completion client that replays predefined responses in order.
///
/// Each request serves the entry at the cursor and advances it; once the
/// list is exhausted further requests fail with
/// [`LLMError::ResponsesExhausted`] until [`reset`](Self::reset) rewinds
/// the cursor.
///
/// The client is thread-safe in the narrow sense that its state lives behind
/// a single mutex; interleaving requests from several tasks will interleave
/// cursor advances in arrival order, which is rarely what a test wants.
pub struct ReplayClient {
    /// The response source. Never mutated by request handling.
    responses: Vec<ReplayResponse>,
    model_info: ModelInfo,
    state: Arc<Mutex<ReplayState>>,
}

impl ReplayClient {
    /// Build a client over `responses` with the default descriptor
    /// (no advanced capabilities, unknown family).
    pub fn new(responses: Vec<ReplayResponse>) -> Self {
        Self {
            responses,
            model_info: ModelInfo::default(),
            state: Arc::new(Mutex::new(ReplayState::default())),
        }
    }

    /// Build a client with an explicit model descriptor.
    ///
    /// Fails with [`LLMError::ConfigError`] when the descriptor is
    /// internally inconsistent.
    pub fn with_model_info(
        responses: Vec<ReplayResponse>,
        model_info: ModelInfo,
    ) -> LLMResult<Self> {
        validate_model_info(&model_info)?;
        Ok(Self {
            responses,
            model_info,
            state: Arc::new(Mutex::new(ReplayState::default())),
        })
    }

    /// Reconstruct a client from its serialized configuration.
    ///
    /// The cursor, usage counters, and call log always start fresh; only the
    /// response list and the descriptor are part of the configuration shape.
    pub fn from_config(config: ReplayClientConfig) -> LLMResult<Self> {
        match config.model_info {
            Some(model_info) => Self::with_model_info(config.responses, model_info),
            None => Ok(Self::new(config.responses)),
        }
    }

    /// Export the serializable configuration: the response list and the
    /// model descriptor. Cursor, counters, and call log are not serialized.
    pub fn to_config(&self) -> ReplayClientConfig {
        ReplayClientConfig {
            responses: self.responses.clone(),
            model_info: Some(self.model_info),
        }
    }

    /// Set the cache flag stamped onto subsequently synthesized results.
    /// Prebuilt entries keep their own flag.
    pub fn set_cached(&self, cached: bool) {
        self.lock_state().cached = cached;
    }

    /// Rewind the cursor to the first response and zero both usage counters.
    ///
    /// The call log and the response list are untouched; a fresh pass over
    /// the same canned responses can begin immediately.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.cursor = 0;
        state.cur_usage = RequestUsage::default();
        state.total_usage = RequestUsage::default();
    }

    // ── Observation helpers ──────────────────────────────────────────────────

    /// Returns a clone of every request passed to
    /// [`create`](ChatCompletionClient::create), in call order.
    pub fn create_calls(&self) -> Vec<CreateRequest> {
        self.lock_state().create_calls.clone()
    }

    /// Total number of [`create`](ChatCompletionClient::create) calls served.
    pub fn create_call_count(&self) -> usize {
        self.lock_state().create_calls.len()
    }

    /// The most recent [`create`](ChatCompletionClient::create) request, or
    /// `None` if the method has never been called.
    pub fn last_create_call(&self) -> Option<CreateRequest> {
        self.lock_state().create_calls.last().cloned()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ReplayState> {
        self.state.lock().expect("replay state mutex poisoned")
    }

    fn warn_on_ignored_tool_choice(request: &CreateRequest) {
        if matches!(&request.tool_choice, Some(choice) if *choice != ToolChoice::Auto) {
            warn!("tool_choice is ignored in replay mode");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ChatCompletionClient implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ChatCompletionClient for ReplayClient {
    /// Serve the entry at the cursor, advance it, and record the call.
    async fn create(&self, request: CreateRequest) -> LLMResult<CreateResult> {
        Self::warn_on_ignored_tool_choice(&request);

        let mut state = self.lock_state();
        if state.cursor >= self.responses.len() {
            return Err(LLMError::ResponsesExhausted);
        }

        let (_, prompt_tokens) = tokenize_messages(&request.messages);
        let result = match &self.responses[state.cursor] {
            ReplayResponse::Text(text) => {
                let (_, completion_tokens) = tokenize_text(text);
                let usage = RequestUsage::new(prompt_tokens, completion_tokens);
                CreateResult {
                    finish_reason: FinishReason::Stop,
                    content: text.clone(),
                    usage,
                    cached: state.cached,
                }
            }
            ReplayResponse::Result(prebuilt) => {
                // Completion tokens come from the canned record; prompt
                // tokens always reflect the actual call's messages.
                let usage =
                    RequestUsage::new(prompt_tokens, prebuilt.usage.completion_tokens);
                let mut result = prebuilt.clone();
                result.usage = usage;
                result
            }
        };

        state.cur_usage = result.usage;
        let cur = state.cur_usage;
        state.total_usage.accumulate(cur);
        state.cursor += 1;
        state.create_calls.push(request);
        Ok(result)
    }

    /// Serve the entry at the cursor as a stream.
    ///
    /// Text entries yield one [`StreamItem::Delta`] per whitespace fragment
    /// (each but the last carrying a trailing space) and then the terminal
    /// [`StreamItem::Done`]; prebuilt entries yield the `Done` alone. The
    /// cursor advance and usage update are bound to the terminal item, so an
    /// undrained stream leaves the client state unchanged and the next call
    /// replays the same entry.
    ///
    /// Streaming calls are not recorded in the call log.
    async fn create_stream(&self, request: CreateRequest) -> LLMResult<CreateStream> {
        Self::warn_on_ignored_tool_choice(&request);

        let (fragments, result) = {
            let state = self.lock_state();
            if state.cursor >= self.responses.len() {
                return Err(LLMError::ResponsesExhausted);
            }

            let (_, prompt_tokens) = tokenize_messages(&request.messages);
            match &self.responses[state.cursor] {
                ReplayResponse::Text(text) => {
                    let (tokens, completion_tokens) = tokenize_text(text);
                    let usage = RequestUsage::new(prompt_tokens, completion_tokens);
                    let result = CreateResult {
                        finish_reason: FinishReason::Stop,
                        content: text.clone(),
                        usage,
                        cached: state.cached,
                    };
                    (spaced_fragments(tokens), result)
                }
                ReplayResponse::Result(prebuilt) => {
                    let usage =
                        RequestUsage::new(prompt_tokens, prebuilt.usage.completion_tokens);
                    let mut result = prebuilt.clone();
                    result.usage = usage;
                    (Vec::new(), result)
                }
            }
            // MutexGuard drops here — no await is held across the lock.
        };

        let deltas: Vec<LLMResult<StreamItem>> = fragments
            .into_iter()
            .map(|fragment| Ok(StreamItem::Delta(fragment)))
            .collect();

        let state = Arc::clone(&self.state);
        let usage = result.usage;
        let done = stream::once(async move {
            let mut state = state.lock().expect("replay state mutex poisoned");
            state.cur_usage = usage;
            state.total_usage.accumulate(usage);
            state.cursor += 1;
            Ok(StreamItem::Done(result))
        });

        Ok(Box::pin(stream::iter(deltas).chain(done)))
    }

    fn actual_usage(&self) -> RequestUsage {
        self.lock_state().cur_usage
    }

    fn total_usage(&self) -> RequestUsage {
        self.lock_state().total_usage
    }

    /// Whitespace token count of the messages. Tool definitions contribute
    /// nothing; no tokenizer-specific overhead is modeled.
    fn count_tokens(&self, messages: &[ChatMessage], _tools: &[Tool]) -> u32 {
        tokenize_messages(messages).1
    }

    /// What is left of the fixed budget after all usage so far.
    fn remaining_tokens(&self, _messages: &[ChatMessage], _tools: &[Tool]) -> u32 {
        let total = self.lock_state().total_usage;
        TOTAL_AVAILABLE_TOKENS
            .saturating_sub(total.prompt_tokens)
            .saturating_sub(total.completion_tokens)
    }

    fn model_info(&self) -> ModelInfo {
        self.model_info
    }

    /// Nothing to release.
    async fn close(&self) -> LLMResult<()> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenization
// ─────────────────────────────────────────────────────────────────────────────

/// Whitespace-split `text`, returning the fragments and their count.
fn tokenize_text(text: &str) -> (Vec<String>, u32) {
    let tokens: Vec<String> = text.split_whitespace().map(str::to_owned).collect();
    let count = tokens.len() as u32;
    (tokens, count)
}

/// Whitespace-tokenize every message with plain text content.
///
/// Messages whose content is multipart or absent contribute zero tokens and
/// log a warning; usage is under-counted for them.
fn tokenize_messages(messages: &[ChatMessage]) -> (Vec<String>, u32) {
    let mut tokens = Vec::new();
    for message in messages {
        match &message.content {
            Some(MessageContent::Text(text)) => {
                tokens.extend(text.split_whitespace().map(str::to_owned));
            }
            _ => warn!("token count covers plain text content only"),
        }
    }
    let count = tokens.len() as u32;
    (tokens, count)
}

/// Apply the stream emission rule: every fragment except the last carries
/// one trailing space, so re-joining the fragments reproduces the original
/// single-spaced text.
fn spaced_fragments(tokens: Vec<String>) -> Vec<String> {
    let last = tokens.len().saturating_sub(1);
    tokens
        .into_iter()
        .enumerate()
        .map(|(i, token)| if i < last { format!("{token} ") } else { token })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_kernel::llm::ContentPart;

    #[test]
    fn tokenize_text_splits_on_any_whitespace() {
        let (tokens, count) = tokenize_text("Hello  there\n\tfriend");
        assert_eq!(tokens, vec!["Hello", "there", "friend"]);
        assert_eq!(count, 3);
    }

    #[test]
    fn tokenize_text_of_empty_string_is_empty() {
        let (tokens, count) = tokenize_text("   ");
        assert!(tokens.is_empty());
        assert_eq!(count, 0);
    }

    #[test]
    fn tokenize_messages_accumulates_across_messages() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("what is the answer"),
        ];
        let (_, count) = tokenize_messages(&messages);
        assert_eq!(count, 6);
    }

    #[test]
    fn tokenize_messages_counts_zero_for_multipart_content() {
        let messages = vec![ChatMessage::user_with_parts(vec![ContentPart::Text {
            text: "these words are not counted".into(),
        }])];
        let (_, count) = tokenize_messages(&messages);
        assert_eq!(count, 0);
    }

    #[test]
    fn spaced_fragments_pads_all_but_the_last() {
        let spaced = spaced_fragments(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(spaced, vec!["a ", "b ", "c"]);
        assert_eq!(spaced.concat(), "a b c");
    }

    #[test]
    fn spaced_fragments_leaves_a_single_fragment_bare() {
        assert_eq!(spaced_fragments(vec!["solo".into()]), vec!["solo"]);
        assert!(spaced_fragments(Vec::new()).is_empty());
    }

    #[test]
    fn replay_response_converts_from_text_and_result() {
        assert_eq!(ReplayResponse::from("hi"), ReplayResponse::Text("hi".into()));
        let result = CreateResult::stop("hi", RequestUsage::new(0, 1), true);
        assert_eq!(
            ReplayResponse::from(result.clone()),
            ReplayResponse::Result(result)
        );
    }
}
