//! Helpers for cleaning data before it reaches logs or LLM prompts.
//!
//! Logs are safe to share for debugging: these functions keep directory
//! layouts and document bodies out of them.

use std::path::Path;

/// Returns only the filename component of a path (no directory).
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// First `max_chars` characters of `text` on one line, for log messages.
pub fn preview(text: &str, max_chars: usize) -> String {
    let flat: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .take(max_chars)
        .collect();

    if text.chars().count() > max_chars {
        format!("{}...", flat)
    } else {
        flat
    }
}

/// Neutralizes chat-template control sequences in untrusted document text.
///
/// Covers `<|...|>` header tokens (Llama 3, ChatML), `<s>`/`</s>`,
/// `[INST]` markers and `<<SYS>>` blocks. Extracted text is pasted into
/// prompts verbatim otherwise.
pub fn sanitize_for_prompt(text: &str) -> String {
    text.replace("<|", "< |")
        .replace("|>", "| >")
        .replace("<s>", "< s >")
        .replace("</s>", "< / s >")
        .replace("[INST]", "[ INST ]")
        .replace("[/INST]", "[ / INST ]")
        .replace("<<SYS>>", "< < SYS > >")
        .replace("<</SYS>>", "< < / SYS > >")
}
