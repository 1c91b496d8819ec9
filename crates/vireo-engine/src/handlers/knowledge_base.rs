use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use vireo_core::error::Result;
use vireo_core::types::ScoredChunk;
use vireo_core::workflow::KIND_KNOWLEDGE_BASE;

use super::{config_bool, config_usize, ComponentConfig, ComponentHandler, TurnScope};
use crate::context::ExecutionContext;

/// Retrieval-augmented context assembly.
///
/// Searches every document bound to the workflow, merges the per-document
/// hit lists, stable-sorts by score descending, and keeps the overall top
/// `result_count`. The per-document searches are independent reads and run
/// concurrently with bounded fan-out; `buffered` preserves document order in
/// the merged output, so equal-score hits never swap relative positions.
pub struct KnowledgeBaseHandler;

impl ComponentHandler for KnowledgeBaseHandler {
    fn kind(&self) -> &'static str {
        KIND_KNOWLEDGE_BASE
    }

    fn run<'a>(
        &'a self,
        scope: &'a TurnScope<'a>,
        config: &'a ComponentConfig,
        ctx: &'a mut ExecutionContext,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let pass_to_llm = config_bool(config, "pass_to_llm").unwrap_or(true);
            if !pass_to_llm {
                debug!("Knowledge base disabled (pass_to_llm = false)");
                return Ok(());
            }

            // `n_results` is the legacy wire name for the same knob.
            let result_count = config_usize(config, "result_count")
                .or_else(|| config_usize(config, "n_results"))
                .unwrap_or(scope.defaults.default_result_count);

            let documents = scope.documents.list_by_workflow(scope.workflow_id).await?;
            if documents.is_empty() {
                debug!(workflow_id = %scope.workflow_id, "No documents bound, retrieval is empty");
                ctx.retrieved_text = Some(String::new());
                ctx.sources = Vec::new();
                return Ok(());
            }

            let query = ctx.query.clone();
            let fanout = scope.defaults.retrieval_fanout.max(1);

            let searches: Vec<_> = documents
                .iter()
                .map(|doc| scope.index.search_similar(&query, result_count, &doc.id))
                .collect();
            let per_document: Vec<Vec<ScoredChunk>> = stream::iter(searches)
                .buffered(fanout)
                .try_collect()
                .await?;

            let mut merged: Vec<ScoredChunk> = per_document.into_iter().flatten().collect();
            // Stable sort: equal scores keep their retrieval order.
            merged.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            merged.truncate(result_count);

            debug!(
                documents = documents.len(),
                kept = merged.len(),
                "Merged per-document retrieval results"
            );

            ctx.retrieved_text = Some(
                merged
                    .iter()
                    .map(|chunk| chunk.text.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            );

            let mut sources: Vec<String> = Vec::new();
            for doc in &documents {
                if !sources.contains(&doc.filename) {
                    sources.push(doc.filename.clone());
                }
            }
            ctx.sources = sources;

            Ok(())
        })
    }
}
