//! Context assembly for answer generation.
//!
//! The rendered layout is what the language model sees and what the
//! confidence heuristic measures, so it is kept stable:
//!
//! ```text
//! Refer to the following project knowledge base:
//!
//! --- Document 1 ---
//! <content>
//!
//! Metadata: category=architecture, title=Overview
//!
//! --- Document 2 ---
//! ...
//! ```

use std::fmt::Write as _;

use serde_json::Value;

use crate::document::Document;

/// Heading written before the first document.
pub const CONTEXT_HEADER: &str = "Refer to the following project knowledge base:\n\n";

/// Concatenate documents into a single context block in retrieval order.
///
/// Each document is introduced by a `--- Document N ---` marker (1-based),
/// followed by its content and, when present, its metadata flattened to
/// comma-joined `key=value` pairs with keys in sorted order.
pub fn build_context(documents: &[Document]) -> String {
    let mut context = String::from(CONTEXT_HEADER);

    for (index, document) in documents.iter().enumerate() {
        let _ = writeln!(context, "--- Document {} ---", index + 1);
        context.push_str(&document.content);
        context.push_str("\n\n");

        if !document.metadata.is_empty() {
            let mut keys: Vec<&String> = document.metadata.keys().collect();
            keys.sort();
            let pairs: Vec<String> = keys
                .into_iter()
                .map(|key| format!("{key}={}", render_value(&document.metadata[key])))
                .collect();
            context.push_str("Metadata: ");
            context.push_str(&pairs.join(", "));
            context.push_str("\n\n");
        }
    }

    context
}

/// Render a metadata value: strings bare, arrays space-separated in brackets.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", rendered.join(" "))
        }
        other => other.to_string(),
    }
}
