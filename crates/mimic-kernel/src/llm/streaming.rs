//! Streaming shape of a completion: text deltas, then exactly one result.

use futures::Stream;
use std::pin::Pin;

use super::types::{CreateResult, LLMResult};

/// One item of a completion stream.
///
/// A well-formed stream yields zero or more `Delta` fragments and terminates
/// with exactly one `Done` carrying the full result and its usage.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamItem {
    /// Incremental text fragment
    Delta(String),
    /// Terminal item: the complete result
    Done(CreateResult),
}

impl StreamItem {
    pub fn delta(fragment: impl Into<String>) -> Self {
        Self::Delta(fragment.into())
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    pub fn as_delta(&self) -> Option<&str> {
        match self {
            Self::Delta(fragment) => Some(fragment),
            Self::Done(_) => None,
        }
    }

    pub fn into_result(self) -> Option<CreateResult> {
        match self {
            Self::Done(result) => Some(result),
            Self::Delta(_) => None,
        }
    }
}

/// Type-erased completion stream. Finite and non-restartable.
pub type CreateStream = Pin<Box<dyn Stream<Item = LLMResult<StreamItem>> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::RequestUsage;
    use futures::StreamExt;

    #[test]
    fn item_constructors_and_predicates() {
        let d = StreamItem::delta("hello ");
        assert!(!d.is_done());
        assert_eq!(d.as_delta(), Some("hello "));

        let done = StreamItem::Done(CreateResult::stop("hello", RequestUsage::new(1, 1), true));
        assert!(done.is_done());
        assert_eq!(done.as_delta(), None);
        assert_eq!(done.into_result().unwrap().content, "hello");
    }

    #[tokio::test]
    async fn boxed_stream_drains_in_order() {
        let result = CreateResult::stop("a b", RequestUsage::new(0, 2), false);
        let items = vec![
            Ok(StreamItem::delta("a ")),
            Ok(StreamItem::delta("b")),
            Ok(StreamItem::Done(result.clone())),
        ];
        let mut stream: CreateStream = Box::pin(futures::stream::iter(items));

        assert_eq!(stream.next().await.unwrap().unwrap().as_delta(), Some("a "));
        assert_eq!(stream.next().await.unwrap().unwrap().as_delta(), Some("b"));
        assert_eq!(stream.next().await.unwrap().unwrap(), StreamItem::Done(result));
        assert!(stream.next().await.is_none());
    }
}
