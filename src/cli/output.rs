//! CLI output formatting utilities
//!
//! This module provides consistent output formatting for the `dsacoach` CLI

use crate::ingest::IndexStats;
use crate::AppConfig;

/// Print the configuration; callers pass a redacted copy
pub fn print_config(config: &AppConfig) {
    println!("📋 dsacoach Configuration:");
    println!();

    println!("📝 Logging:");
    println!("  Level: {}", config.logging.level);
    println!("  Backtrace: {}", config.logging.backtrace);
    println!();

    println!("🌐 Server:");
    println!("  Address: {}:{}", config.server.host, config.server.port);
    println!("  CORS: {}", config.server.enable_cors);
    println!(
        "  Max concurrent requests: {}",
        config.server.max_concurrent_requests
    );
    println!();

    println!("🤖 LLM:");
    println!("  Endpoint: {}", config.llm_endpoint());
    println!("  Model: {}", config.llm_model());
    println!("  Key: {}", display_secret(config.llm_key()));
    println!("  Timeout: {}s", config.llm.timeout_secs);
    println!();

    println!("🧠 Embeddings:");
    println!("  Endpoint: {}", config.embedding_endpoint());
    println!("  Model: {}", config.embedding_model());
    println!("  Dimension: {}", config.embedding_dimension());
    println!();

    println!("📦 Vector store:");
    println!("  Index: {}", config.vector_store.index_name);
    println!("  Host: {}", display_index_host(config.vector_store.index_host.as_deref()));
    println!(
        "  Namespace: {}",
        config.vector_store.namespace.as_deref().unwrap_or("(default)")
    );
    println!("  Key: {}", display_secret(&config.vector_store.api_key));
    println!();

    println!("💬 Chat:");
    println!("  Mode: {:?}", config.chat.mode);
    println!("  Top K: {}", config.chat.top_k);
    println!(
        "  Retries: {} (first delay {}ms)",
        config.chat.max_retries, config.chat.retry_delay_ms
    );
    println!("  Max context: {} chars", config.chat.max_context_chars);
    println!("  Fallback: {}", config.chat.fallback_message);
    println!();

    println!("📚 Ingest:");
    println!(
        "  Chunks: {} chars, {} overlap, batches of {}",
        config.ingest.chunk_size, config.ingest.chunk_overlap, config.ingest.batch_size
    );
}

/// The data-plane host is looked up lazily when not configured
fn display_index_host(host: Option<&str>) -> &str {
    host.unwrap_or("(resolved on first use)")
}

fn display_secret(secret: &str) -> &str {
    if secret.is_empty() {
        "(not set)"
    } else {
        secret
    }
}

/// Print the result of an indexing run
pub fn print_index_stats(stats: &IndexStats) {
    println!("  Chunks: {}", stats.chunks);
    println!("  Vectors upserted: {}", stats.upserted);
}

/// Print colored output functions
pub fn print_info(msg: &str) {
    println!("ℹ️  {msg}");
}

pub fn print_success(msg: &str) {
    println!("✅ {msg}");
}

pub fn print_warning(msg: &str) {
    println!("⚠️  {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("❌ {msg}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_index_host() {
        assert_eq!(display_index_host(None), "(resolved on first use)");
        assert_eq!(
            display_index_host(Some("dsa-abc.svc.pinecone.io")),
            "dsa-abc.svc.pinecone.io"
        );
    }

    #[test]
    fn test_display_secret() {
        assert_eq!(display_secret(""), "(not set)");
        assert_eq!(display_secret("****abcd"), "****abcd");
    }
}
