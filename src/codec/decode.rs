// Decoding index.md text back into blocks
// Single forward pass; a bad fragment costs at most its own block

use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::LazyLock;

use super::{
    BlockMeta, COMMENT_CLOSE, COMMENT_OPEN, DecodeWarning, DecodedPage, FILE_CLOSE, FILE_OPEN, FRAME_CLOSE,
    FRAME_OPEN, FramePayload,
};
use crate::models::{Block, BlockContent, BlockId, BlockType, FileData, ListItem, PageMetadata};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap());
static TODO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-\s*\[([ xX])\]\s*(.*)$").unwrap());
static LIST_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-*+](?:\s+(.*))?$").unwrap());
static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^!\[(.*)\]\((.*)\)$").unwrap());
static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\[block:(-?\d+)\]\]$").unwrap());
static SEPARATOR_CELL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:?-{3,}:?$").unwrap());
static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^```\s*(\S*)\s*$").unwrap());

/// Block whose comment has been read and whose body is still being collected
struct OpenBlock {
    meta: BlockMeta,
    line: usize,
    body: Vec<String>,
}

/// What the scanner is currently feeding content lines into
enum Target {
    /// Before the first block comment
    Preamble,
    Block(OpenBlock),
    /// The last block comment was unusable; drop lines until the next one
    Skipping,
}

struct Decoder {
    blocks: Vec<Block>,
    metadata: Option<PageMetadata>,
    warnings: Vec<DecodeWarning>,
    seenIds: HashSet<BlockId>,
    /// (index into `blocks`, comment line) of blocks whose id was already taken
    duplicates: Vec<(usize, usize)>,
    target: Target,
}

/// Decode an index.md document. Never fails: malformed fragments are reported
/// in `warnings` and dropped.
pub fn decode(text: &str) -> DecodedPage {
    let mut decoder = Decoder {
        blocks: Vec::new(),
        metadata: None,
        warnings: Vec::new(),
        seenIds: HashSet::new(),
        duplicates: Vec::new(),
        target: Target::Preamble,
    };

    let lines: Vec<&str> = text.lines().collect();
    let mut i = 0;
    while i < lines.len() {
        if isCommentStart(lines[i]) {
            // A comment never runs into the next comment opener
            let start = i;
            while !lines[i].trim_end().ends_with(COMMENT_CLOSE)
                && i + 1 < lines.len()
                && !isCommentStart(lines[i + 1])
            {
                i += 1;
            }
            let closed = lines[i].trim_end().ends_with(COMMENT_CLOSE);
            decoder.comment(start + 1, &lines[start..=i], closed);
        } else {
            decoder.content(lines[i]);
        }
        i += 1;
    }

    decoder.flush();
    decoder.renumberDuplicates();

    let Decoder { blocks, metadata, warnings, .. } = decoder;
    for w in &warnings {
        tracing::warn!("[decode] Dropped fragment at {}", w);
    }

    DecodedPage {
        page: crate::models::Page {
            blocks,
            metadata: metadata.unwrap_or_default(),
        },
        warnings,
    }
}

/// `<!--` followed by nothing or by the start of a JSON object
fn isCommentStart(line: &str) -> bool {
    line.trim_start()
        .strip_prefix(COMMENT_OPEN)
        .map(|rest| {
            let rest = rest.trim_start();
            rest.is_empty() || rest.starts_with('{')
        })
        .unwrap_or(false)
}

/// Undo the encoder's escape of comment-like body lines
fn unescapeLine(line: &str) -> String {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    match rest.strip_prefix('\\') {
        Some(unescaped) if unescaped.trim_start_matches('\\').starts_with(COMMENT_OPEN) => {
            format!("{}{}", &line[..indent], unescaped)
        }
        _ => line.to_string(),
    }
}

/// Text between the first `{` and the last `}`
fn extractJson(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end >= start).then(|| &text[start..=end])
}

impl Decoder {
    fn warn(&mut self, line: usize, message: impl Into<String>) {
        self.warnings.push(DecodeWarning { line, message: message.into() });
    }

    fn comment(&mut self, line: usize, collected: &[&str], closed: bool) {
        let joined = collected.join("\n");

        // A comment without any JSON object is ordinary text
        let Some(json) = extractJson(&joined) else {
            for l in collected {
                self.content(l);
            }
            return;
        };

        if !closed {
            self.flush();
            self.target = Target::Skipping;
            self.warn(line, "unterminated metadata comment");
            return;
        }

        let value: Value = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => {
                self.flush();
                self.target = Target::Skipping;
                self.warn(line, format!("malformed metadata JSON: {}", e));
                return;
            }
        };

        let isBlock = value.as_object().map(|o| o.contains_key("type")).unwrap_or(false);
        if isBlock {
            self.flush();
            match serde_json::from_value::<BlockMeta>(value) {
                Ok(meta) => {
                    self.target = Target::Block(OpenBlock { meta, line, body: Vec::new() });
                }
                Err(e) => {
                    self.target = Target::Skipping;
                    self.warn(line, format!("unusable block metadata: {}", e));
                }
            }
        } else {
            match serde_json::from_value::<PageMetadata>(value) {
                Ok(meta) => self.metadata = Some(meta),
                Err(e) => self.warn(line, format!("unusable page metadata: {}", e)),
            }
        }
    }

    /// Give repeated ids fresh values above every id in the page, so the
    /// first occurrence and later blocks keep theirs
    fn renumberDuplicates(&mut self) {
        let Some(mut next) = self.blocks.iter().map(|b| b.id).max() else {
            return;
        };
        for (index, line) in std::mem::take(&mut self.duplicates) {
            next += 1;
            let old = self.blocks[index].id;
            self.blocks[index].id = next;
            self.warn(line, format!("duplicate block id {}, reassigned to {}", old, next));
        }
    }

    fn content(&mut self, line: &str) {
        if let Target::Block(open) = &mut self.target {
            open.body.push(unescapeLine(line));
        }
    }

    /// Close the open block, keeping it only if it carries content
    fn flush(&mut self) {
        let Target::Block(open) = std::mem::replace(&mut self.target, Target::Preamble) else {
            return;
        };
        let OpenBlock { meta, line, body } = open;

        let content = parseBody(&meta, &body, line, &mut self.warnings);
        if content.isEmpty() {
            tracing::debug!("[decode] Dropping empty {} block {}", meta.blockType.asStr(), meta.id);
            return;
        }

        if !self.seenIds.insert(meta.id) {
            self.duplicates.push((self.blocks.len(), line));
        }

        self.blocks.push(Block {
            id: meta.id,
            createdAt: meta.createdAt,
            lastEdited: meta.lastEdited,
            content,
        });
    }
}

// ============================================
// BODY PARSING
// ============================================

fn parseBody(meta: &BlockMeta, body: &[String], line: usize, warnings: &mut Vec<DecodeWarning>) -> BlockContent {
    match meta.blockType {
        BlockType::Paragraph => BlockContent::Paragraph { content: joinText(body) },
        BlockType::Quote => {
            let stripped: Vec<String> = body.iter().map(|l| stripQuote(l).to_string()).collect();
            BlockContent::Quote { content: joinText(&stripped) }
        }
        BlockType::Code => parseCode(meta, body),
        BlockType::Heading => body
            .iter()
            .find_map(|l| HEADING_RE.captures(l.trim()))
            .map(|caps| BlockContent::Heading {
                level: caps[1].len() as u8,
                content: caps[2].trim().to_string(),
            })
            .unwrap_or_else(|| BlockContent::empty(BlockType::Heading)),
        BlockType::Todo => {
            let items = body
                .iter()
                .filter_map(|l| TODO_RE.captures(l.trim()))
                .enumerate()
                .map(|(n, caps)| ListItem {
                    id: itemId(meta, n),
                    text: caps[2].trim().to_string(),
                    completed: !caps[1].trim().is_empty(),
                })
                .collect();
            BlockContent::Todo { items }
        }
        BlockType::List => {
            let items = body
                .iter()
                .filter_map(|l| LIST_RE.captures(l.trim()))
                .enumerate()
                .map(|(n, caps)| {
                    let text = caps.get(1).map_or("", |m| m.as_str());
                    ListItem::new(itemId(meta, n), text.trim(), false)
                })
                .collect();
            BlockContent::List { items }
        }
        BlockType::Table => BlockContent::Table {
            data: parseTable(body),
            headers: meta.headers.clone(),
        },
        BlockType::Image => body
            .iter()
            .find_map(|l| IMAGE_RE.captures(l.trim()))
            .map(|caps| BlockContent::Image {
                caption: caps[1].to_string(),
                src: caps[2].to_string(),
            })
            .unwrap_or_else(|| BlockContent::empty(BlockType::Image)),
        BlockType::File => match fencedJson::<FileData>(body, FILE_OPEN, FILE_CLOSE) {
            Some(Ok(fileData)) => BlockContent::File { fileData },
            Some(Err(e)) => {
                warnings.push(DecodeWarning { line, message: format!("malformed file payload: {}", e) });
                BlockContent::empty(BlockType::File)
            }
            None => BlockContent::empty(BlockType::File),
        },
        BlockType::Frame => match fencedJson::<FramePayload>(body, FRAME_OPEN, FRAME_CLOSE) {
            Some(Ok(frame)) => BlockContent::Frame { src: frame.src, caption: frame.caption },
            Some(Err(e)) => {
                warnings.push(DecodeWarning { line, message: format!("malformed frame payload: {}", e) });
                BlockContent::empty(BlockType::Frame)
            }
            None => BlockContent::empty(BlockType::Frame),
        },
        BlockType::Reference => BlockContent::Reference {
            referenceId: body
                .iter()
                .find_map(|l| REFERENCE_RE.captures(l.trim()))
                .and_then(|caps| caps[1].parse().ok()),
        },
        BlockType::Divider => BlockContent::Divider,
    }
}

/// Item ids come from the block comment; older files without them get derived ids
fn itemId(meta: &BlockMeta, index: usize) -> BlockId {
    meta.itemIds
        .as_ref()
        .and_then(|ids| ids.get(index).copied())
        .unwrap_or_else(|| meta.id.saturating_mul(1000).saturating_add(index as i64))
}

/// Join body lines, trimming blank lines at both ends
fn joinText(lines: &[String]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}

fn stripQuote(line: &str) -> &str {
    match line.strip_prefix('>') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => line,
    }
}

fn parseCode(meta: &BlockMeta, body: &[String]) -> BlockContent {
    let Some(open) = body.iter().position(|l| FENCE_RE.is_match(l.trim_end())) else {
        return BlockContent::Code {
            language: meta.language.clone().unwrap_or_default(),
            content: joinText(body),
        };
    };

    let fenceLanguage = FENCE_RE
        .captures(body[open].trim_end())
        .map(|caps| caps[1].to_string())
        .unwrap_or_default();
    let rest = &body[open + 1..];
    let close = rest.iter().rposition(|l| l.trim_end() == "```").unwrap_or(rest.len());

    BlockContent::Code {
        language: meta.language.clone().unwrap_or(fenceLanguage),
        content: rest[..close].join("\n"),
    }
}

fn parseTable(body: &[String]) -> Vec<Vec<String>> {
    body.iter()
        .map(|l| l.trim())
        .filter(|l| l.len() >= 2 && l.starts_with('|') && l.ends_with('|'))
        .map(splitRow)
        .filter(|cells| !cells.iter().all(|c| SEPARATOR_CELL_RE.is_match(c)))
        .collect()
}

/// Split `| a | b\|c |` into cells, honouring escaped pipes
fn splitRow(row: &str) -> Vec<String> {
    let inner = &row[1..row.len() - 1];
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => cells.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }
    cells.push(current.trim().to_string());
    cells
}

fn fencedJson<T: serde::de::DeserializeOwned>(body: &[String], open: &str, close: &str) -> Option<serde_json::Result<T>> {
    body.iter().find_map(|l| {
        let inner = l.trim().strip_prefix(open)?.strip_suffix(close)?;
        Some(serde_json::from_str(inner))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_metadata_without_blocks() {
        let decoded = decode("<!--{\"createdAt\":\"2024-01-01T00:00:00Z\",\"title\":\"Home\"}-->\n\n");
        assert!(decoded.page.blocks.is_empty());
        assert_eq!(decoded.page.metadata.title.as_deref(), Some("Home"));
        assert!(decoded.warnings.is_empty());
    }

    #[test]
    fn test_multi_line_comment_is_collected() {
        let text = "<!--\n{\"type\":\"paragraph\",\n\"id\":4}\n-->\nHello\n";
        let decoded = decode(text);
        assert_eq!(decoded.page.blocks.len(), 1);
        assert_eq!(decoded.page.blocks[0].id, 4);
        assert_eq!(decoded.page.blocks[0].content, BlockContent::Paragraph { content: "Hello".into() });
    }

    #[test]
    fn test_malformed_block_json_drops_only_that_block() {
        let text = concat!(
            "<!--{\"type\":\"paragraph\",\"id\":1}-->\nfirst\n\n",
            "<!--{\"type\":\"paragraph\",\"id\":}-->\nbroken\n\n",
            "<!--{\"type\":\"paragraph\",\"id\":3}-->\nthird\n\n",
        );
        let decoded = decode(text);
        let ids: Vec<_> = decoded.page.blocks.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(decoded.warnings.len(), 1);
        assert_eq!(decoded.warnings[0].line, 4);
    }

    #[test]
    fn test_unknown_block_type_is_skipped() {
        let text = "<!--{\"type\":\"video\",\"id\":1}-->\nsomething\n\n<!--{\"type\":\"paragraph\",\"id\":2}-->\nok\n";
        let decoded = decode(text);
        assert_eq!(decoded.page.blocks.len(), 1);
        assert_eq!(decoded.page.blocks[0].id, 2);
        assert_eq!(decoded.warnings.len(), 1);
    }

    #[test]
    fn test_empty_blocks_are_pruned() {
        let text = "<!--{\"type\":\"paragraph\",\"id\":1}-->\nkept\n\n<!--{\"type\":\"todo\",\"id\":2}-->\n\n<!--{\"type\":\"heading\",\"id\":3}-->\n# \n";
        let decoded = decode(text);
        assert_eq!(decoded.page.blocks.len(), 1);
        assert_eq!(decoded.page.blocks[0].id, 1);
    }

    #[test]
    fn test_legacy_header_row_before_separator() {
        let text = "<!--{\"type\":\"table\",\"id\":1}-->\n| h1 | h2 |\n| --- | --- |\n| 1 | 2 |\n";
        let decoded = decode(text);
        assert_eq!(
            decoded.page.blocks[0].content,
            BlockContent::Table {
                data: vec![vec!["h1".into(), "h2".into()], vec!["1".into(), "2".into()]],
                headers: None,
            }
        );
    }

    #[test]
    fn test_escaped_pipe_inside_cell() {
        assert_eq!(splitRow(r"| a\|b | c |"), vec!["a|b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_todo_items_without_ids_get_derived_ids() {
        let text = "<!--{\"type\":\"todo\",\"id\":7}-->\n- [ ] one\n- [x] two\n";
        let decoded = decode(text);
        match &decoded.page.blocks[0].content {
            BlockContent::Todo { items } => {
                assert_eq!(items[0].id, 7000);
                assert_eq!(items[1].id, 7001);
                assert!(items[1].completed);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_plain_html_comment_stays_in_paragraph() {
        let text = "<!--{\"type\":\"paragraph\",\"id\":1}-->\nbefore\n<!-- note to self -->\nafter\n";
        let decoded = decode(text);
        assert_eq!(
            decoded.page.blocks[0].content,
            BlockContent::Paragraph { content: "before\n<!-- note to self -->\nafter".into() }
        );
    }

    #[test]
    fn test_duplicate_ids_are_reassigned() {
        let text = "<!--{\"type\":\"paragraph\",\"id\":1}-->\na\n\n<!--{\"type\":\"paragraph\",\"id\":1}-->\nb\n";
        let decoded = decode(text);
        assert_eq!(decoded.page.blocks[0].id, 1);
        assert_eq!(decoded.page.blocks[1].id, 2);
        assert_eq!(decoded.warnings.len(), 1);
    }
}
