use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use uuid::Uuid;

/// A captured text record. Field names follow the persisted camelCase format.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Reserved, always empty at creation.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Reserved, never toggled.
    #[serde(default)]
    pub starred: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Note {
    /// Text the side panel searches: title, content and tags joined by spaces.
    pub fn haystack(&self) -> String {
        let mut out = String::with_capacity(self.title.len() + self.content.len() + 16);
        out.push_str(&self.title);
        out.push(' ');
        out.push_str(&self.content);
        out.push(' ');
        out.push_str(&self.tags.join(" "));
        out
    }
}

pub fn new_note_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Raw composer input, as typed into the modal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ComposeForm {
    pub title: String,
    pub content: String,
    pub tags: String,
}

impl ComposeForm {
    /// Prefills the composer from a text selection.
    pub fn prefilled(selection: &str, title_max_chars: usize) -> Self {
        let content = selection.trim().to_string();
        Self {
            title: derive_title(&content, title_max_chars),
            content,
            tags: String::new(),
        }
    }

    pub fn into_note(self, default_title: &str) -> Note {
        self.into_note_with(default_title, new_note_id(), now_millis())
    }

    pub fn into_note_with(self, default_title: &str, id: String, now: i64) -> Note {
        let title = match self.title.trim() {
            "" => default_title.to_string(),
            title => title.to_string(),
        };
        Note {
            id,
            title,
            content: self.content.trim().to_string(),
            tags: parse_tags(&self.tags),
            aliases: Vec::new(),
            starred: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Splits a comma-separated tag string, trimming entries and dropping empty ones.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// First `max_chars` characters of `content` with whitespace runs collapsed.
pub fn derive_title(content: &str, max_chars: usize) -> String {
    static RE_SPACE: OnceLock<Regex> = OnceLock::new();
    let re_space = RE_SPACE.get_or_init(|| Regex::new(r"\s+").unwrap());

    let collapsed = re_space.replace_all(content.trim(), " ");
    collapsed.chars().take(max_chars).collect::<String>().trim_end().to_string()
}

/// Returns `[note, ...notes]`. A colliding id is replaced with a fresh one.
pub fn prepend_note(notes: Vec<Note>, mut note: Note) -> Vec<Note> {
    while notes.iter().any(|existing| existing.id == note.id) {
        log::warn!("[notes] id collision on {}, regenerating", note.id);
        note.id = new_note_id();
    }
    let mut next = Vec::with_capacity(notes.len() + 1);
    next.push(note);
    next.extend(notes);
    next
}

#[cfg(test)]
pub(crate) fn sample(id: &str, title: &str, content: &str, tags: &[&str]) -> Note {
    Note {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        aliases: Vec::new(),
        starred: false,
        created_at: 1,
        updated_at: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comma_separated_tags() {
        assert_eq!(parse_tags("a, b ,, c"), vec!["a", "b", "c"]);
        assert!(parse_tags("").is_empty());
        assert!(parse_tags(" , ,").is_empty());
    }

    #[test]
    fn blank_title_falls_back_to_placeholder() {
        let form = ComposeForm {
            title: "   ".to_string(),
            content: "Hello world".to_string(),
            tags: String::new(),
        };
        let note = form.into_note_with("Untitled note", "n1".to_string(), 42);
        assert_eq!(note.title, "Untitled note");
        assert_eq!(note.content, "Hello world");
        assert_eq!(note.created_at, 42);
        assert_eq!(note.updated_at, 42);
        assert!(!note.starred);
        assert!(note.aliases.is_empty());
    }

    #[test]
    fn prefill_truncates_title_and_trims_content() {
        let form = ComposeForm::prefilled("  Buy milk\n\n and   eggs  ", 12);
        assert_eq!(form.content, "Buy milk\n\n and   eggs");
        assert_eq!(form.title, "Buy milk and");

        let form = ComposeForm::prefilled("Buy milk", 60);
        assert_eq!(form.title, "Buy milk");
    }

    #[test]
    fn title_truncation_respects_char_boundaries() {
        assert_eq!(derive_title("ñandú ñandú", 3), "ñan");
    }

    #[test]
    fn prepend_puts_new_note_first_with_unique_id() {
        let existing = vec![sample("a", "A", "x", &[]), sample("b", "B", "y", &[])];
        let next = prepend_note(existing.clone(), sample("a", "New", "z", &[]));
        assert_eq!(next.len(), 3);
        assert_eq!(next[0].title, "New");
        assert_ne!(next[0].id, "a");
        assert_ne!(next[0].id, "b");
        assert_eq!(&next[1..], &existing[..]);
    }

    #[test]
    fn decodes_records_without_optional_fields() {
        let raw = r#"[{"id":"1","title":"t","content":"c","createdAt":5,"updatedAt":6}]"#;
        let notes: Vec<Note> = serde_json::from_str(raw).unwrap();
        assert!(notes[0].tags.is_empty());
        assert_eq!(notes[0].updated_at, 6);

        let encoded = serde_json::to_value(&notes[0]).unwrap();
        assert_eq!(encoded["createdAt"], 5);
        assert_eq!(encoded["starred"], false);
    }

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(new_note_id(), new_note_id());
    }
}
