//! Canonicalise raw program text before parsing.
//!
//! Programs pasted from chat or markdown often arrive wrapped in a code fence,
//! and whitespace programs are commonly written with visible `S`/`T`/`L`
//! markers. Normalisation is opt-in (`options.normalize`).

use crate::language::Language;

/// Normalise `source` for `language`
pub fn normalize(language: Language, source: &str) -> String {
    let source = strip_code_fence(source);
    match language {
        Language::Trie => expand_markers(source),
        Language::Grid => source
            .lines()
            .map(|line| line.trim_end_matches('\r').replace('\t', " "))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => source.to_string(),
    }
}

/// Body of a surrounding ``` fence, or the input unchanged
pub fn strip_code_fence(source: &str) -> &str {
    let trimmed = source.trim();
    if !trimmed.starts_with("```") || !trimmed.ends_with("```") || trimmed.len() < 6 {
        return source;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    // first line of the fence may carry a language tag
    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim_end_matches(['\n', '\r']),
        None => inner,
    }
}

/// Map visible markers to the whitespace they stand for. Real whitespace is
/// kept only when the program has no markers at all.
fn expand_markers(source: &str) -> String {
    let has_markers = source.chars().any(|c| matches!(c, 'S' | 'T' | 'L'));
    if !has_markers {
        return source.to_string();
    }
    source
        .chars()
        .filter_map(|c| match c {
            'S' => Some(' '),
            'T' => Some('\t'),
            'L' => Some('\n'),
            _ => None,
        })
        .collect()
}
