//! Host integration surface: the callbacks an embedding host calls
//! against the engine around an agent's lifecycle.
//!
//! Every callback talks to the engine only through [`crate::store::Store`]
//! and [`crate::retrieval::RetrievalPipeline`]; none of them spawn their
//! own background task.

use crate::activation::{self, TOOL_REFRESH_BUMP};
use crate::error::Result;
use crate::retrieval::{RetrievalPipeline, RetrievalRequest};
use crate::store::Store;
use std::path::Path;

/// Result of [`before_agent_start`]: text to prepend to the agent's
/// system prompt, already budget-bounded by the retrieval it ran.
#[derive(Debug, Clone, Default)]
pub struct BeforeAgentStart {
    pub prepend_context: Option<String>,
}

/// Words that, when present in a free-text prompt, become domain hints.
/// A coarse stand-in for whatever keyword extraction the embedding host
/// already does upstream; this just needs *some* signal to seed the
/// retrieval's domain hints.
fn keyword_domain_hints(prompt: &str) -> Vec<String> {
    prompt
        .split_whitespace()
        .filter(|w| w.len() > 3)
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .take(5)
        .collect()
}

/// Run a retrieval seeded from `prompt` and render the selected memories
/// as prependable context.
pub async fn before_agent_start(
    pipeline: &RetrievalPipeline,
    prompt: &str,
) -> Result<BeforeAgentStart> {
    let mut request = RetrievalRequest::new(prompt);
    request.domains = keyword_domain_hints(prompt);
    let result = pipeline.retrieve(&request).await?;
    if result.items.is_empty() {
        return Ok(BeforeAgentStart::default());
    }
    let rendered = result
        .items
        .iter()
        .map(|item| format!("- {}: {}", item.memory.title, item.memory.detail))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(BeforeAgentStart {
        prepend_context: Some(rendered),
    })
}

/// Fire-and-forget: bump any memory whose `source_section` mentions
/// `tool_name` by the tool-refresh amount.
pub async fn after_tool_call(store: &dyn Store, tool_name: &str) -> Result<()> {
    if tool_name.is_empty() {
        return Ok(());
    }
    let candidates = store.top_by_activation(500).await?;
    let ids: Vec<String> = candidates
        .into_iter()
        .filter(|m| m.source_section.contains(tool_name))
        .map(|m| m.id)
        .collect();
    if ids.is_empty() {
        return Ok(());
    }
    activation::bump(store, &ids, TOOL_REFRESH_BUMP).await?;
    Ok(())
}

/// Fire-and-forget signal: the session-mining extractor that would
/// normally run here is out of scope. Exists so the host has somewhere
/// to call into.
pub fn before_compaction(session_file: &Path) {
    tracing::debug!(path = %session_file.display(), "compaction signal received, no-op");
}

/// Fire-and-forget: records a session's end. No engine-side effect
/// beyond the trace event; the session-mining trigger this would
/// otherwise schedule is out of scope.
pub fn session_end(session_id: &str, message_count: u64, duration_ms: u64) {
    tracing::info!(session_id, message_count, duration_ms, "session ended");
}

/// Runs schema initialisation if the store has never been migrated.
/// Idempotent: safe to call on every gateway start.
pub async fn gateway_start(store: &dyn Store) -> Result<()> {
    store.migrate().await
}

/// No-op lifecycle hook, kept symmetric with [`gateway_start`].
pub fn gateway_stop() {
    tracing::debug!("gateway stopped");
}
