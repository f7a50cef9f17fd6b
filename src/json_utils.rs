use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::ExtractionError;

const FENCE: &str = "```";
const FENCE_LANG: &[u8] = b"json";

/// Slice of a model reply bounded by its first `[` and last `]`.
///
/// Nothing guarantees the text parses; that is the validator's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedJson(String);

impl ExtractedJson {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for ExtractedJson {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Remove every "```json" (any case) and "```" marker from `raw`.
pub fn strip_fences(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find(FENCE) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + FENCE.len()..];
        let bytes = rest.as_bytes();
        if bytes.len() >= FENCE_LANG.len() && bytes[..FENCE_LANG.len()].eq_ignore_ascii_case(FENCE_LANG) {
            // ASCII prefix, so this stays on a char boundary
            rest = &rest[FENCE_LANG.len()..];
        }
    }
    out.push_str(rest);
    out
}

/// Recover the array text from a free-form model reply.
///
/// Strips code fences, trims, then takes everything from the first `[` to the
/// last `]` inclusive. This is a best-effort heuristic: a stray `]` in trailing
/// prose widens the slice. See [`candidate_arrays`] for the depth-aware scan.
#[instrument(target = "techmate::extract", skip(raw), fields(raw_len = raw.len()))]
pub fn extract(raw: &str) -> Result<ExtractedJson, ExtractionError> {
    let cleaned = strip_fences(raw);
    let cleaned = cleaned.trim();

    let start = cleaned.find('[').ok_or(ExtractionError::MalformedReply)?;
    let end = match cleaned.rfind(']') {
        Some(end) if end > start => end,
        _ => return Err(ExtractionError::MalformedReply),
    };

    debug!(target: "techmate::extract", start, end, "located array bounds");
    Ok(ExtractedJson(cleaned[start..=end].to_string()))
}

/// Type of a JSON node found by the structure scanner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeType {
    Object,
    Array,
}

/// Byte coordinates of a JSON structure within a larger text, including nested children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjCoords {
    pub start: usize,
    pub end: usize, // inclusive index of the closing bracket/brace
    pub kind: NodeType,
    pub children: Vec<ObjCoords>,
}

impl ObjCoords {
    pub fn new(start: usize, end: usize, kind: NodeType, children: Vec<ObjCoords>) -> Self {
        Self { start, end, kind, children }
    }

    /// The text this node covers.
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..=self.end]
    }
}

#[derive(Debug)]
struct Frame {
    start: usize,
    kind: NodeType,
    children: Vec<ObjCoords>,
}

/// Find all root JSON object/array structures in the given text.
///
/// Brackets inside string literals (with escapes) are ignored, so
/// `"see [1]"` in an explanation does not move a boundary. Mismatched closers
/// drop the open frame.
#[instrument(target = "techmate::extract", skip(text))]
pub fn find_json_structures(text: &str) -> Vec<ObjCoords> {
    let bytes = text.as_bytes();
    let mut results: Vec<ObjCoords> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    let mut in_string = false;
    let mut escape = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escape {
                escape = false;
                continue;
            }
            match b {
                b'\\' => escape = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        let closed = match b {
            // quotes only open a string inside a structure; prose apostrophes and quotes are noise
            b'"' if !stack.is_empty() => {
                in_string = true;
                None
            }
            b'{' => {
                stack.push(Frame { start: i, kind: NodeType::Object, children: Vec::new() });
                None
            }
            b'[' => {
                stack.push(Frame { start: i, kind: NodeType::Array, children: Vec::new() });
                None
            }
            b'}' => stack.pop().filter(|f| f.kind == NodeType::Object).map(|f| (f, i)),
            b']' => stack.pop().filter(|f| f.kind == NodeType::Array).map(|f| (f, i)),
            _ => None,
        };

        if let Some((frame, end)) = closed {
            let node = ObjCoords::new(frame.start, end, frame.kind, frame.children);
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => results.push(node),
            }
        }
    }

    debug!(target: "techmate::extract", count = results.len(), "found root structures");
    results
}

/// Root-level arrays of the fence-stripped reply, in order of appearance.
pub fn candidate_arrays(raw: &str) -> Vec<String> {
    let cleaned = strip_fences(raw);
    find_json_structures(&cleaned)
        .into_iter()
        .filter(|node| node.kind == NodeType::Array)
        .map(|node| node.slice(&cleaned).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_uppercase_fence_language() {
        assert_eq!(strip_fences("```JSON\n[1]\n```"), "\n[1]\n");
    }

    #[test]
    fn strip_leaves_other_languages_tagged() {
        assert_eq!(strip_fences("```rust\nfn main() {}\n```"), "rust\nfn main() {}\n");
    }

    #[test]
    fn closing_bracket_before_opening_is_malformed() {
        assert!(matches!(extract("] then ["), Err(ExtractionError::MalformedReply)));
    }

    #[test]
    fn scanner_ignores_brackets_in_strings() {
        let text = r#"[{"q":"what is a[0]?"}]"#;
        let roots = find_json_structures(text);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].slice(text), text);
        assert_eq!(roots[0].children.len(), 1);
    }
}
