//! Replay Client Demo
//!
//! Feeds a [`ReplayClient`] three canned responses and walks the synchronous
//! path, the streaming path, and the usage counters.
//!
//! Run with: cargo run --example replay_demo -p mimic-replay

use futures::StreamExt;
use mimic_kernel::llm::{ChatCompletionClient, CreateRequest, StreamItem};
use mimic_replay::ReplayClient;

#[tokio::main]
async fn main() {
    let client = ReplayClient::new(vec![
        "Hello, how can I assist you today?".into(),
        "I'm happy to help with any questions you have.".into(),
        "Is there anything else I can assist you with?".into(),
    ]);

    // ─── 1. Synchronous completion ─────────────────────────────────────
    let response = client
        .create(CreateRequest::new().user("What can you do?"))
        .await
        .expect("a canned response is queued");
    println!("create:  {}", response.content);
    println!("usage:   {:?}", response.usage);

    // ─── 2. Streaming completion ───────────────────────────────────────
    let mut stream = client
        .create_stream(CreateRequest::new().user("And after that?"))
        .await
        .expect("a canned response is queued");
    print!("stream:  ");
    while let Some(item) = stream.next().await {
        match item.expect("replay streams do not fail") {
            StreamItem::Delta(fragment) => print!("{fragment}"),
            StreamItem::Done(result) => println!("\nfinish:  {:?}", result.finish_reason),
        }
    }

    // ─── 3. Counters ───────────────────────────────────────────────────
    println!("total:   {:?}", client.total_usage());
    println!("left:    {} tokens", client.remaining_tokens(&[], &[]));
}
