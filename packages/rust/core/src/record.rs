//! Projection of source notes into destination records.

use notesync_shared::{Note, NotionSettings, Record};

const ELLIPSIS: char = '…';

/// How a record title is derived from the note content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitlePolicy {
    /// Longest title, in characters, before truncation.
    pub max_chars: usize,
    /// Title used when the content is empty.
    pub placeholder: String,
}

impl Default for TitlePolicy {
    fn default() -> Self {
        Self::from(&NotionSettings::default())
    }
}

impl From<&NotionSettings> for TitlePolicy {
    fn from(settings: &NotionSettings) -> Self {
        Self {
            max_chars: settings.title_max_chars,
            placeholder: settings.title_placeholder.clone(),
        }
    }
}

impl TitlePolicy {
    /// Bounded single-line prefix of `content`, or the placeholder.
    pub fn title_for(&self, content: &str) -> String {
        let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.is_empty() {
            return self.placeholder.clone();
        }
        if flat.chars().count() <= self.max_chars {
            return flat;
        }
        let prefix: String = flat.chars().take(self.max_chars).collect();
        let mut title = prefix.trim_end().to_string();
        title.push(ELLIPSIS);
        title
    }
}

/// Map a note onto the destination schema.
pub fn to_record(note: &Note, titles: &TitlePolicy) -> Record {
    Record {
        title: titles.title_for(&note.content),
        content: note.content.clone(),
        note_id: note.id.clone(),
        book: note.book_name.clone(),
        author: note.author.clone(),
        created_at: note.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_chars: usize) -> TitlePolicy {
        TitlePolicy {
            max_chars,
            placeholder: "Untitled note".into(),
        }
    }

    #[test]
    fn short_content_is_the_title() {
        assert_eq!(policy(20).title_for("Simplify."), "Simplify.");
    }

    #[test]
    fn long_content_is_truncated_by_chars() {
        let title = policy(5).title_for("我们必须学会再苏醒");
        assert_eq!(title, "我们必须学…");
    }

    #[test]
    fn line_breaks_collapse_in_title() {
        assert_eq!(policy(40).title_for("first line\n\n  second"), "first line second");
    }

    #[test]
    fn empty_content_uses_placeholder() {
        assert_eq!(policy(20).title_for(""), "Untitled note");
        assert_eq!(policy(20).title_for(" \n "), "Untitled note");
    }

    #[test]
    fn record_carries_note_fields() {
        let note = Note {
            id: "812345".into(),
            book_name: "Walden".into(),
            author: "Thoreau".into(),
            content: "I went to the woods because I wished to live deliberately.".into(),
            created_at: None,
        };
        let record = to_record(&note, &TitlePolicy::default());
        assert_eq!(record.note_id, "812345");
        assert_eq!(record.content, note.content);
        assert_eq!(record.book, "Walden");
        assert_eq!(record.title, "I went to the woods…");
    }
}
