//! Agent-facing knowledge base query tool.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use kb_core::{DatasetLoader, KbConfig, KbError, KnowledgeBase, LoadStatus, Scorer};
use kb_query::{CacheStats, FieldWeightedScorer, QueryEngine, EMPTY_KB_MESSAGE};

/// Name the tool is registered under.
pub const TOOL_NAME: &str = "knowledge_base_query";

const TOOL_DESCRIPTION: &str = "Searches a knowledge base of past customer conversations \
     and support guidelines. Use this tool to find examples, solutions, or recommended \
     practices based on keywords, tags, or a description of the customer's issue. \
     Include the word 'guideline' or 'conversation' to favour that kind of entry.";

/// Query request parameters.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryParams {
    /// Free-text search query.
    pub query: String,
}

/// Tool result.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Whether the operation was successful.
    pub success: bool,

    /// Result message or content.
    pub message: String,
}

impl ToolResult {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Tool info.
#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Knowledge base query tool.
///
/// Loads its dataset once at construction. [`run`](Self::run) always
/// returns text: load failures, internal errors and panics are all turned
/// into messages.
pub struct KnowledgeQueryTool<S = FieldWeightedScorer> {
    engine: QueryEngine<S>,

    loader: DatasetLoader,

    /// Configured (unresolved) dataset path, reused by `reload`.
    dataset_path: PathBuf,

    status: LoadStatus,
}

impl KnowledgeQueryTool<FieldWeightedScorer> {
    /// Create a tool, loading the dataset named in `config`.
    pub fn new(config: &KbConfig) -> Self {
        Self::with_scorer(config, DatasetLoader::new(), FieldWeightedScorer::new())
    }

    /// Create a tool over an already built knowledge base.
    pub fn from_knowledge_base(kb: KnowledgeBase, config: &KbConfig) -> Self {
        let status = LoadStatus::Loaded {
            path: PathBuf::from(":memory:"),
            entries: kb.len(),
            quarantined: Vec::new(),
        };

        Self {
            engine: QueryEngine::with_default_scorer(kb, config),
            loader: DatasetLoader::new(),
            dataset_path: config.dataset.path.clone(),
            status,
        }
    }

    /// Get the tool info.
    pub fn info() -> ToolInfo {
        ToolInfo {
            name: TOOL_NAME.to_string(),
            description: TOOL_DESCRIPTION.to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The search query or keywords to find relevant \
                            conversations or guidelines based on tags, summary, or content."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    /// List available tools.
    pub fn tools() -> Vec<ToolInfo> {
        vec![Self::info()]
    }
}

impl<S: Scorer> KnowledgeQueryTool<S> {
    /// Create a tool with a custom loader and scorer.
    pub fn with_scorer(config: &KbConfig, loader: DatasetLoader, scorer: S) -> Self {
        info!(
            "Initializing knowledge base tool with dataset {}",
            config.dataset.path.display()
        );

        let (kb, status) = loader.load(&config.dataset.path);
        if !status.is_loaded() {
            warn!("Knowledge base unavailable: {}", status.describe());
        }

        Self {
            engine: QueryEngine::new(kb, scorer, config),
            loader,
            dataset_path: config.dataset.path.clone(),
            status,
        }
    }

    /// Run a query. Never fails; errors come back as text prefixed `Error:`.
    pub fn run(&mut self, query: &str) -> String {
        self.invoke(QueryParams {
            query: query.to_string(),
        })
        .message
    }

    /// Run a query and report whether it succeeded.
    pub fn invoke(&mut self, params: QueryParams) -> ToolResult {
        if self.engine.knowledge_base().is_empty() {
            return ToolResult::error(EMPTY_KB_MESSAGE);
        }

        let engine = &mut self.engine;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| engine.search(&params.query)));

        match outcome {
            Ok(Ok(text)) => ToolResult::success(text),
            Ok(Err(e)) => {
                error!("Query {:?} failed: {}", params.query, e);
                ToolResult::error(failure_message(&e))
            }
            Err(payload) => {
                let e = KbError::query_failed(panic_message(payload.as_ref()));
                error!("Query {:?} panicked: {}", params.query, e);
                // The cache may have been mid-update.
                self.engine.invalidate();
                ToolResult::error(failure_message(&e))
            }
        }
    }

    /// Run a query from JSON tool arguments (`{"query": "..."}`).
    pub fn invoke_json(&mut self, args: &Value) -> ToolResult {
        match serde_json::from_value::<QueryParams>(args.clone()) {
            Ok(params) => self.invoke(params),
            Err(e) => {
                let e = KbError::invalid_argument(e.to_string());
                ToolResult::error(format!("Error: {}", e))
            }
        }
    }

    /// Outcome of the last dataset load.
    pub fn load_status(&self) -> &LoadStatus {
        &self.status
    }

    /// Re-read the dataset from the configured path.
    ///
    /// Cached results survive the reload; call [`invalidate`](Self::invalidate)
    /// as well to see the new data for queries that were already cached.
    pub fn reload(&mut self) -> &LoadStatus {
        let (kb, status) = self.loader.load(&self.dataset_path);
        self.engine.replace_knowledge_base(kb);
        self.status = status;
        &self.status
    }

    /// Swap the in-memory knowledge base. Same cache semantics as `reload`.
    pub fn replace_knowledge_base(&mut self, kb: KnowledgeBase) {
        self.status = LoadStatus::Loaded {
            path: PathBuf::from(":memory:"),
            entries: kb.len(),
            quarantined: Vec::new(),
        };
        self.engine.replace_knowledge_base(kb);
    }

    /// Drop all cached query results.
    pub fn invalidate(&mut self) {
        self.engine.invalidate();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.engine.cache_stats()
    }

    pub fn len(&self) -> usize {
        self.engine.knowledge_base().len()
    }

    pub fn is_empty(&self) -> bool {
        self.engine.knowledge_base().is_empty()
    }

    /// Knowledge base and cache statistics.
    pub fn stats(&self) -> ToolResult {
        let kb = self.engine.knowledge_base().stats();
        let cache = self.engine.cache_stats();

        let mut output = String::new();
        output.push_str(&format!("{}\n\n", self.status.describe()));
        output.push_str(&format!("- Entries: {}\n", kb.entries));
        output.push_str(&format!("- Conversations: {}\n", kb.conversations));
        output.push_str(&format!("- Guidelines: {}\n", kb.guidelines));
        output.push_str(&format!(
            "- Cached queries: {}\n",
            self.engine.cached_queries()
        ));
        output.push_str(&format!(
            "- Cache hits/misses: {}/{} ({:.1}% hit rate)\n",
            cache.hits,
            cache.misses,
            cache.hit_rate() * 100.0
        ));

        if let LoadStatus::Loaded { quarantined, .. } = &self.status {
            for q in quarantined {
                output.push_str(&format!(
                    "- Quarantined #{} ({}): {}\n",
                    q.index,
                    q.id.as_deref().unwrap_or("no id"),
                    q.reason
                ));
            }
        }

        if self.status.is_loaded() {
            ToolResult::success(output)
        } else {
            ToolResult::error(output)
        }
    }
}

fn failure_message(e: &KbError) -> String {
    format!("Error: Failed to query the knowledge base: {}", e)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use kb_core::Entry;
    use kb_query::NO_RESULTS_MESSAGE;
    use tempfile::TempDir;

    const DATASET: &str = r#"[
        {"id": "c1", "type": "conversation_example", "tags": ["refund"],
         "summary": "Refund request",
         "log": "User: I want a refund\nAgent: Sure, processing now"},
        {"id": "c2", "type": "conversation_example", "tags": ["login"],
         "summary": "Cannot log in", "log": "User: login fails\nAgent: Reset your password"},
        {"id": "g1", "type": "guideline", "title": "Tone of voice",
         "summary": "Stay calm and polite",
         "description": "Always acknowledge the customer's frustration before solving.",
         "examples": ["I understand", "I'm sorry", "Let me help", "Thanks", "Noted"]}
    ]"#;

    /// Counts calls and delegates to the default scorer.
    struct CountingScorer {
        calls: Arc<AtomicUsize>,
    }

    impl Scorer for CountingScorer {
        fn score(&self, entry: &Entry, query_tokens: &[String]) -> f32 {
            self.calls.fetch_add(1, Ordering::SeqCst);
            FieldWeightedScorer::new().score(entry, query_tokens)
        }
    }

    struct PanickingScorer;

    impl Scorer for PanickingScorer {
        fn score(&self, _entry: &Entry, _query_tokens: &[String]) -> f32 {
            panic!("scorer exploded")
        }
    }

    fn write_dataset(dir: &TempDir, content: &str) -> KbConfig {
        let path = dir.path().join("kb.json");
        fs::write(&path, content).unwrap();

        let mut config = KbConfig::default();
        config.dataset.path = path;
        config
    }

    fn tool(dir: &TempDir) -> KnowledgeQueryTool {
        KnowledgeQueryTool::new(&write_dataset(dir, DATASET))
    }

    #[test]
    fn test_refund_scenario() {
        let dir = TempDir::new().unwrap();
        let mut tool = tool(&dir);

        let out = tool.run("refund");

        assert!(out.contains("ID: c1"));
        assert!(!out.contains("ID: c2"));
        assert!(!out.starts_with("Error"));
    }

    #[test]
    fn test_no_match_message() {
        let dir = TempDir::new().unwrap();
        let mut tool = tool(&dir);

        assert_eq!(tool.run("unknown_topic"), NO_RESULTS_MESSAGE);
        assert_eq!(
            tool.run("unknown_topic"),
            "No relevant entries found for your query in the knowledge base."
        );
    }

    #[test]
    fn test_empty_knowledge_base_message() {
        let dir = TempDir::new().unwrap();
        let mut config = KbConfig::default();
        config.dataset.path = dir.path().join("missing.json");
        let mut tool = KnowledgeQueryTool::new(&config);

        for query in ["refund", "", "guideline"] {
            assert_eq!(tool.run(query), "Knowledge base is not loaded or is empty.");
        }
        assert!(matches!(tool.load_status(), LoadStatus::NotFound { .. }));
        assert!(!tool.stats().success);
    }

    #[test]
    fn test_malformed_dataset_message() {
        let dir = TempDir::new().unwrap();
        let mut tool = KnowledgeQueryTool::new(&write_dataset(&dir, "not json"));

        assert_eq!(tool.run("refund"), EMPTY_KB_MESSAGE);
        assert!(matches!(tool.load_status(), LoadStatus::Malformed { .. }));
    }

    #[test]
    fn test_empty_query_returns_text() {
        let dir = TempDir::new().unwrap();
        let mut tool = tool(&dir);

        assert_eq!(tool.run(""), NO_RESULTS_MESSAGE);
        assert_eq!(tool.run("?!"), NO_RESULTS_MESSAGE);
    }

    #[test]
    fn test_deterministic() {
        let dir = TempDir::new().unwrap();
        let mut tool = tool(&dir);

        let first = tool.run("login refund guideline");
        let second = tool.run("login refund guideline");

        assert_eq!(first, second);
    }

    #[test]
    fn test_guideline_examples_limited() {
        let dir = TempDir::new().unwrap();
        let mut tool = tool(&dir);

        let out = tool.run("guideline");

        assert!(out.contains("ID: g1"));
        assert!(out.contains("  - I understand\n  - I'm sorry\n  - Let me help\n"));
        assert!(out.contains("2 more examples"));
        assert!(!out.contains("ID: c1"));
    }

    #[test]
    fn test_equal_scores_keep_dataset_order() {
        let dir = TempDir::new().unwrap();
        let mut tool = tool(&dir);

        // Both conversations score exactly the type boost.
        let out = tool.run("conversation");

        let c1 = out.find("ID: c1").unwrap();
        let c2 = out.find("ID: c2").unwrap();
        assert!(c1 < c2);
    }

    #[test]
    fn test_cache_survives_reload() {
        let dir = TempDir::new().unwrap();
        let config = write_dataset(&dir, DATASET);
        let mut tool = KnowledgeQueryTool::new(&config);

        let before = tool.run("refund");

        fs::write(
            &config.dataset.path,
            r#"[{"id": "c9", "type": "conversation_example", "log": "refund issued"}]"#,
        )
        .unwrap();
        tool.reload();

        assert_eq!(tool.len(), 1);
        assert_eq!(tool.run("refund"), before);

        tool.invalidate();
        let after = tool.run("refund");
        assert!(after.contains("ID: c9"));
    }

    #[test]
    fn test_capacity_one_recomputes_evicted_query() {
        let dir = TempDir::new().unwrap();
        let mut config = write_dataset(&dir, DATASET);
        config.cache.capacity = 1;

        let calls = Arc::new(AtomicUsize::new(0));
        let scorer = CountingScorer {
            calls: calls.clone(),
        };
        let mut tool = KnowledgeQueryTool::with_scorer(&config, DatasetLoader::new(), scorer);
        let entries = tool.len();

        tool.run("refund");
        assert_eq!(calls.load(Ordering::SeqCst), entries);

        tool.run("refund");
        assert_eq!(calls.load(Ordering::SeqCst), entries);

        tool.run("login");
        assert_eq!(calls.load(Ordering::SeqCst), 2 * entries);

        tool.run("refund");
        assert_eq!(calls.load(Ordering::SeqCst), 3 * entries);

        let stats = tool.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 3);
        assert_eq!(stats.evictions, 2);
    }

    #[test]
    fn test_panic_becomes_error_text() {
        let dir = TempDir::new().unwrap();
        let config = write_dataset(&dir, DATASET);
        let mut tool =
            KnowledgeQueryTool::with_scorer(&config, DatasetLoader::new(), PanickingScorer);

        let result = tool.invoke(QueryParams {
            query: "refund".to_string(),
        });

        assert!(!result.success);
        assert!(result.message.starts_with("Error:"));
        assert!(result.message.contains("scorer exploded"));
    }

    #[test]
    fn test_invoke_json() {
        let dir = TempDir::new().unwrap();
        let mut tool = tool(&dir);

        let ok = tool.invoke_json(&json!({"query": "login"}));
        assert!(ok.success);
        assert!(ok.message.contains("ID: c2"));

        let bad = tool.invoke_json(&json!({"q": "login"}));
        assert!(!bad.success);
        assert!(bad.message.starts_with("Error: Invalid argument"));
    }

    #[test]
    fn test_from_knowledge_base() {
        let entries: Vec<Entry> = serde_json::from_str(DATASET).unwrap();
        let mut tool =
            KnowledgeQueryTool::from_knowledge_base(KnowledgeBase::new(entries), &KbConfig::default());

        assert_eq!(tool.len(), 3);
        assert!(tool.run("password").contains("ID: c2"));
        assert!(tool.stats().message.contains("- Guidelines: 1"));
    }

    #[test]
    fn test_tools_list() {
        let tools = KnowledgeQueryTool::tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name, TOOL_NAME);
        assert_eq!(tools[0].input_schema["required"][0], "query");
    }
}
