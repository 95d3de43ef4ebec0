// file: src/embedding/mod.rs
// description: embedding provider abstraction and module exports
// reference: internal module structure

pub mod client;
pub mod retry;

pub use client::EmbeddingClient;
pub use retry::RetryPolicy;

use crate::error::Result;

/// Anything that can turn a batch of texts into one vector per text, in
/// input order.
#[allow(async_fn_in_trait)]
pub trait Embedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>>;

    fn model(&self) -> &str;
}
