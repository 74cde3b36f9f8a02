//! Splitting a raw reply into text and introspection.

use aura_types::Completion;

/// Marker separating the reply from its introspection block.
pub const BURST_MARKER: &str = "[SYSTEM_BURST]";

/// Introspection used when the reply carries no burst block.
pub const DEFAULT_INTROSPECTION: &str = "Синаптическая связь стабильна.";

/// Split `raw` at the first burst marker. Both halves are trimmed.
pub fn split_burst(raw: &str) -> Completion {
    let mut parts = raw.split(BURST_MARKER);
    let text = parts.next().unwrap_or_default().trim().to_owned();
    let introspection = parts
        .next()
        .map_or_else(|| DEFAULT_INTROSPECTION.to_owned(), |s| s.trim().to_owned());
    Completion {
        text,
        introspection,
    }
}
