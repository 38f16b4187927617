//! Wire shapes of the bookmark list endpoint and their decoding into [`Note`]s.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use notesync_shared::{Note, NoteSyncError, Result};

const UNKNOWN_BOOK: &str = "Unknown book";
const UNKNOWN_AUTHOR: &str = "Unknown author";

/// Response envelope. Successful responses carry `code: 0`; failures seen in
/// the wild use either a non-zero `code` or an `errcode`/`errmsg` pair.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    data: Option<BookmarkPage>,
}

#[derive(Debug, Default, Deserialize)]
struct BookmarkPage {
    #[serde(default, rename = "bookmarkList")]
    bookmark_list: Option<Vec<RawBookmark>>,
}

#[derive(Debug, Deserialize)]
struct RawBookmark {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, rename = "bookmarkId")]
    bookmark_id: Option<Value>,
    #[serde(default, rename = "bookName")]
    book_name: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, rename = "createTime")]
    create_time: Option<Value>,
}

/// Unix seconds from a number or numeric string. Anything else is no timestamp.
fn unix_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

impl RawBookmark {
    fn into_note(self) -> Note {
        let id = match self.id.or(self.bookmark_id) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        Note {
            id,
            book_name: self.book_name.unwrap_or_else(|| UNKNOWN_BOOK.into()),
            author: self.author.unwrap_or_else(|| UNKNOWN_AUTHOR.into()),
            content: self.content.unwrap_or_default().trim().to_string(),
            created_at: self
                .create_time
                .as_ref()
                .and_then(unix_seconds)
                .and_then(|secs| DateTime::from_timestamp(secs, 0)),
        }
    }
}

/// Decode a response body into the page's notes.
///
/// A missing or empty bookmark list is the end-of-data signal and yields an
/// empty vector; a non-success code is an error, never an empty page.
pub(crate) fn decode_page(body: &str) -> Result<Vec<Note>> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| NoteSyncError::Decode(format!("bookmark list: {e}")))?;

    let code = envelope.code.or(envelope.errcode).ok_or_else(|| {
        NoteSyncError::Decode("bookmark list: response carries no status code".into())
    })?;

    if code != 0 {
        return Err(NoteSyncError::SourceApi {
            code,
            message: envelope
                .errmsg
                .or(envelope.msg)
                .unwrap_or_else(|| "no message".into()),
        });
    }

    let bookmarks = envelope
        .data
        .and_then(|d| d.bookmark_list)
        .unwrap_or_default();

    Ok(bookmarks.into_iter().map(RawBookmark::into_note).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bookmarks() {
        let body = r#"{
            "code": 0,
            "data": {
                "bookmarkList": [
                    {"id": 812345, "bookName": "Walden", "author": "Thoreau",
                     "content": "  I went to the woods.\n", "createTime": 1700000000},
                    {"bookmarkId": "b7_2_1024", "content": "Simplify."}
                ]
            }
        }"#;

        let notes = decode_page(body).expect("decode");
        assert_eq!(notes.len(), 2);

        assert_eq!(notes[0].id, "812345");
        assert_eq!(notes[0].content, "I went to the woods.");
        assert_eq!(
            notes[0].created_at.map(|t| t.timestamp()),
            Some(1_700_000_000)
        );

        assert_eq!(notes[1].id, "b7_2_1024");
        assert_eq!(notes[1].book_name, UNKNOWN_BOOK);
        assert_eq!(notes[1].author, UNKNOWN_AUTHOR);
        assert!(notes[1].created_at.is_none());
    }

    #[test]
    fn loose_create_time_does_not_fail_the_page() {
        let body = r#"{"code": 0, "data": {"bookmarkList": [
            {"id": "a", "content": "kept", "createTime": 1700000000},
            {"id": "b", "content": "string", "createTime": "1700000000"},
            {"id": "c", "content": "float", "createTime": 1700000000.5},
            {"id": "d", "content": "garbage", "createTime": "yesterday"},
            {"id": "e", "content": "object", "createTime": {"s": 1}}
        ]}}"#;

        let notes = decode_page(body).expect("decode");
        let stamps: Vec<_> = notes
            .iter()
            .map(|n| n.created_at.map(|t| t.timestamp()))
            .collect();
        assert_eq!(
            stamps,
            [
                Some(1_700_000_000),
                Some(1_700_000_000),
                Some(1_700_000_000),
                None,
                None
            ]
        );
    }

    #[test]
    fn missing_content_decodes_empty() {
        let body = r#"{"code": 0, "data": {"bookmarkList": [{"id": "x", "content": "   "}, {"id": "y"}]}}"#;
        let notes = decode_page(body).expect("decode");
        assert!(notes.iter().all(|n| !n.has_content()));
    }

    #[test]
    fn empty_or_absent_list_is_end_of_data() {
        assert!(decode_page(r#"{"code": 0, "data": {"bookmarkList": []}}"#).unwrap().is_empty());
        assert!(decode_page(r#"{"code": 0, "data": {}}"#).unwrap().is_empty());
        assert!(decode_page(r#"{"code": 0}"#).unwrap().is_empty());
    }

    #[test]
    fn non_zero_code_is_error() {
        let err = decode_page(r#"{"code": -2012, "msg": "login timeout"}"#).unwrap_err();
        match err {
            NoteSyncError::SourceApi { code, message } => {
                assert_eq!(code, -2012);
                assert_eq!(message, "login timeout");
            }
            other => panic!("expected SourceApi, got {other:?}"),
        }

        let err = decode_page(r#"{"errcode": -2010, "errmsg": "user not exist"}"#).unwrap_err();
        assert!(matches!(err, NoteSyncError::SourceApi { code: -2010, .. }));
    }

    #[test]
    fn missing_code_is_error() {
        let err = decode_page(r#"{"data": {"bookmarkList": []}}"#).unwrap_err();
        assert!(matches!(err, NoteSyncError::Decode(_)));
    }

    #[test]
    fn garbage_body_is_decode_error() {
        let err = decode_page("<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, NoteSyncError::Decode(_)));
    }
}
