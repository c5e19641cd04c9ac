use crate::note::Note;

/// Notes whose title, content or tags contain `query`, case-insensitively.
///
/// The query is trimmed first; an empty query keeps every note. Store order
/// (newest first) is preserved.
pub fn filter_notes<'a>(notes: &'a [Note], query: &str) -> Vec<&'a Note> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return notes.iter().collect();
    }
    notes
        .iter()
        .filter(|note| note.haystack().to_lowercase().contains(&needle))
        .collect()
}
