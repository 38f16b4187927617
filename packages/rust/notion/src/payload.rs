//! JSON bodies for the database query and page create endpoints.

use serde_json::{Value, json};

use notesync_shared::{PropertyMapping, Record};

/// Longest text the API accepts in a single rich-text element.
pub(crate) const RICH_TEXT_LIMIT: usize = 2000;

/// Exact-match filter on the note ID property. One hit is enough to decide.
pub(crate) fn exists_query(id_property: &str, note_id: &str) -> Value {
    json!({
        "filter": {
            "property": id_property,
            "rich_text": { "equals": note_id }
        },
        "page_size": 1
    })
}

/// Page creation body: mapped properties plus a quote block with the full text.
pub(crate) fn create_page(database_id: &str, props: &PropertyMapping, record: &Record) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(props.title.clone(), json!({ "title": rich_text(&record.title) }));
    properties.insert(props.content.clone(), json!({ "rich_text": rich_text(&record.content) }));
    properties.insert(props.note_id.clone(), json!({ "rich_text": rich_text(&record.note_id) }));
    properties.insert(props.book.clone(), json!({ "rich_text": rich_text(&record.book) }));
    properties.insert(props.author.clone(), json!({ "rich_text": rich_text(&record.author) }));
    if let Some(created_at) = record.created_at {
        properties.insert(
            props.created.clone(),
            json!({ "date": { "start": created_at.to_rfc3339() } }),
        );
    }

    json!({
        "parent": { "database_id": database_id },
        "properties": properties,
        "children": [{
            "object": "block",
            "type": "quote",
            "quote": { "rich_text": rich_text(&record.content) }
        }]
    })
}

/// Split `text` into rich-text elements of at most [`RICH_TEXT_LIMIT`] chars.
pub(crate) fn rich_text(text: &str) -> Value {
    let segments: Vec<Value> = split_chars(text, RICH_TEXT_LIMIT)
        .into_iter()
        .map(|segment| json!({ "type": "text", "text": { "content": segment } }))
        .collect();
    Value::Array(segments)
}

fn split_chars(text: &str, max: usize) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(max)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(cut);
        segments.push(head);
        rest = tail;
    }
    segments
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    fn record() -> Record {
        Record {
            title: "I went to the woods…".into(),
            content: "I went to the woods because I wished to live deliberately.".into(),
            note_id: "812345".into(),
            book: "Walden".into(),
            author: "Thoreau".into(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0),
        }
    }

    #[test]
    fn query_filters_on_note_id_property() {
        let body = exists_query("笔记ID", "812345");
        assert_eq!(body["filter"]["property"], "笔记ID");
        assert_eq!(body["filter"]["rich_text"]["equals"], "812345");
        assert_eq!(body["page_size"], 1);
    }

    #[test]
    fn create_body_uses_mapping() {
        let props = PropertyMapping::default();
        let body = create_page("db123", &props, &record());

        assert_eq!(body["parent"]["database_id"], "db123");
        let p = &body["properties"];
        assert_eq!(p["Title"]["title"][0]["text"]["content"], "I went to the woods…");
        assert_eq!(p["Note ID"]["rich_text"][0]["text"]["content"], "812345");
        assert_eq!(p["Book"]["rich_text"][0]["text"]["content"], "Walden");
        assert_eq!(p["Author"]["rich_text"][0]["text"]["content"], "Thoreau");
        assert_eq!(p["Created"]["date"]["start"], "2023-11-14T22:13:20+00:00");
        assert_eq!(body["children"][0]["type"], "quote");
    }

    #[test]
    fn unknown_date_is_omitted() {
        let mut rec = record();
        rec.created_at = None;
        let body = create_page("db123", &PropertyMapping::default(), &rec);
        assert!(body["properties"].get("Created").is_none());
    }

    #[test]
    fn long_text_is_split_on_char_boundaries() {
        let text = "读".repeat(RICH_TEXT_LIMIT + 5);
        let value = rich_text(&text);
        let segments = value.as_array().unwrap();
        assert_eq!(segments.len(), 2);
        let first = segments[0]["text"]["content"].as_str().unwrap();
        let second = segments[1]["text"]["content"].as_str().unwrap();
        assert_eq!(first.chars().count(), RICH_TEXT_LIMIT);
        assert_eq!(second.chars().count(), 5);
    }

    #[test]
    fn empty_text_yields_no_segments() {
        assert_eq!(rich_text(""), json!([]));
    }
}
