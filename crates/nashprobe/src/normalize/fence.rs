//! Markdown code-fence stripping.

/// Opening/closing delimiter of a Markdown code block.
pub const FENCE: &str = "```";

/// True when already-trimmed text opens with a code fence.
pub fn is_fenced(text: &str) -> bool {
    text.starts_with(FENCE)
}

/// Drop the first and last lines (the fence lines) and re-trim.
///
/// The opening line may carry a language tag (```` ```json ````); it is
/// discarded with the fence. Text with fewer than two lines yields an empty
/// string.
pub fn strip_fence(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < 2 {
        return String::new();
    }
    lines[1..lines.len() - 1].join("\n").trim().to_string()
}
