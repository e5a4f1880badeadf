//! Text rendering of ranked entries for agent consumption.

use std::fmt::Write;
use std::sync::Arc;

use kb_core::{ConversationExample, Entry, Guideline, OutputConfig, Result};

/// Returned when no entry scored above zero.
pub const NO_RESULTS_MESSAGE: &str =
    "No relevant entries found for your query in the knowledge base.";

/// Returned when there is nothing to search.
pub const EMPTY_KB_MESSAGE: &str = "Knowledge base is not loaded or is empty.";

const SEPARATOR: &str = "---";
const NO_SUMMARY: &str = "(no summary)";

/// Renders ranked entries into a text block.
#[derive(Debug, Clone)]
pub struct ResultFormatter {
    /// Descriptions longer than this many characters are cut.
    description_limit: usize,

    max_examples: usize,

    max_log_lines: usize,
}

impl ResultFormatter {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            description_limit: config.description_limit,
            max_examples: config.max_examples,
            max_log_lines: config.max_log_lines,
        }
    }

    /// Render the first `max_results` entries, noting how many were left out.
    pub fn format(&self, ranked: &[Arc<Entry>], max_results: usize) -> Result<String> {
        if ranked.is_empty() {
            return Ok(NO_RESULTS_MESSAGE.to_string());
        }

        let shown = max_results.min(ranked.len());
        let mut output = String::new();
        writeln!(
            output,
            "Found {} relevant entries (showing {}):\n",
            ranked.len(),
            shown
        )?;

        for (i, entry) in ranked.iter().take(shown).enumerate() {
            if i > 0 {
                writeln!(output, "{}", SEPARATOR)?;
            }
            match entry.as_ref() {
                Entry::Guideline(g) => self.write_guideline(&mut output, g)?,
                Entry::ConversationExample(c) => self.write_conversation(&mut output, c)?,
            }
        }

        let hidden = ranked.len() - shown;
        if hidden > 0 {
            write!(
                output,
                "\n... and {} more relevant entries not shown.",
                hidden
            )?;
        }

        Ok(output.trim_end().to_string())
    }

    fn write_guideline(&self, out: &mut String, g: &Guideline) -> std::fmt::Result {
        writeln!(out, "[Guideline] ID: {}", g.meta.id)?;
        writeln!(out, "Title: {}", g.title)?;
        writeln!(
            out,
            "Summary: {}",
            g.meta.summary.as_deref().unwrap_or(NO_SUMMARY)
        )?;
        writeln!(
            out,
            "Description: {}",
            truncate(&g.description, self.description_limit)
        )?;

        if !g.examples.is_empty() {
            writeln!(out, "Examples:")?;
            for example in g.examples.iter().take(self.max_examples) {
                writeln!(out, "  - {}", example)?;
            }
            let omitted = g.examples.len().saturating_sub(self.max_examples);
            if omitted > 0 {
                writeln!(out, "  ... and {} more examples", omitted)?;
            }
        }

        Ok(())
    }

    fn write_conversation(&self, out: &mut String, c: &ConversationExample) -> std::fmt::Result {
        writeln!(out, "[Conversation] ID: {}", c.meta.id)?;
        writeln!(
            out,
            "Summary: {}",
            c.meta.summary.as_deref().unwrap_or(NO_SUMMARY)
        )?;
        if !c.meta.tags.is_empty() {
            writeln!(out, "Tags: {}", c.meta.tags.join(", "))?;
        }

        let lines: Vec<&str> = c.log.lines().collect();
        if lines.is_empty() {
            writeln!(out, "Log excerpt: (empty)")?;
            return Ok(());
        }

        writeln!(out, "Log excerpt:")?;
        for line in lines.iter().take(self.max_log_lines) {
            writeln!(out, "  {}", line)?;
        }
        let omitted = lines.len().saturating_sub(self.max_log_lines);
        if omitted > 0 {
            writeln!(out, "  ... ({} more lines)", omitted)?;
        }

        Ok(())
    }
}

impl Default for ResultFormatter {
    fn default() -> Self {
        Self::new(&OutputConfig::default())
    }
}

/// Cut `text` to `limit` characters, appending "..." if anything was cut.
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(limit).collect();
    cut.push_str("...");
    cut
}
