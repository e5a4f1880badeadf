//! kb-tool - Knowledge base query tool
//!
//! This crate exposes the knowledge base as a single tool for an upstream
//! agent framework: a string query goes in, a string result comes out.
//!
//! # Tools
//!
//! - `knowledge_base_query` - Search past conversations and guidelines
//!
//! The tool never returns an error to its caller. Missing or malformed
//! datasets yield an empty knowledge base (inspect
//! [`KnowledgeQueryTool::load_status`]), and query failures are rendered as
//! text starting with `Error:`.

mod tool;

pub use tool::{KnowledgeQueryTool, QueryParams, ToolInfo, ToolResult, TOOL_NAME};

// Re-export for convenience
pub use kb_core::{KbConfig, LoadStatus};
