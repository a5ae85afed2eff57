// Encoding blocks into the index.md text format

use chrono::Utc;

use super::assets::externalizeAssets;
use super::{BlockMeta, COMMENT_CLOSE, COMMENT_OPEN, FILE_CLOSE, FILE_OPEN, FRAME_CLOSE, FRAME_OPEN, FramePayload};
use crate::directory::Directory;
use crate::error::Result;
use crate::models::{Block, BlockContent, ListItem, PageMetadata};

/// Render a page. Blocks are stamped with a fresh `lastEdited`; a missing
/// metadata object is synthesized.
pub fn encode(blocks: &[Block], metadata: Option<&PageMetadata>) -> Result<String> {
    let synthesized;
    let metadata = match metadata {
        Some(m) => m,
        None => {
            synthesized = PageMetadata::new();
            &synthesized
        }
    };

    let now = Utc::now();
    let mut out = String::new();
    out.push_str(&comment(&serde_json::to_string(metadata)?));
    out.push_str("\n\n");

    for block in blocks {
        let meta = blockMeta(block, now);
        out.push_str(&comment(&serde_json::to_string(&meta)?));
        out.push('\n');
        out.push_str(&escapeBody(&renderBody(&block.content)?));
        out.push_str("\n\n");
    }

    Ok(out)
}

/// Encode after moving inline image payloads into the workspace's assets folder.
/// Rewritten `src` values are left in `blocks` so the caller sees them.
pub fn encodePage(root: &dyn Directory, blocks: &mut [Block], metadata: Option<&PageMetadata>) -> Result<String> {
    let moved = externalizeAssets(root, blocks)?;
    if moved > 0 {
        tracing::debug!("[encodePage] Externalized {} asset(s)", moved);
    }
    encode(blocks, metadata)
}

fn comment(json: &str) -> String {
    format!("{}{}{}", COMMENT_OPEN, json, COMMENT_CLOSE)
}

fn blockMeta(block: &Block, now: chrono::DateTime<Utc>) -> BlockMeta {
    let mut meta = BlockMeta {
        blockType: block.blockType(),
        id: block.id,
        createdAt: block.createdAt,
        lastEdited: now,
        language: None,
        headers: None,
        itemIds: None,
    };
    match &block.content {
        BlockContent::Code { language, .. } if !language.is_empty() => {
            meta.language = Some(language.clone());
        }
        BlockContent::Table { headers, .. } => meta.headers = headers.clone(),
        BlockContent::Todo { items } | BlockContent::List { items } if !items.is_empty() => {
            meta.itemIds = Some(items.iter().map(|i| i.id).collect());
        }
        _ => {}
    }
    meta
}

/// Single-line text: line breaks would split the item on decode
fn oneLine(text: &str) -> String {
    text.replace("\r\n", " ").replace('\n', " ")
}

/// Body lines that would read as a comment opener get one extra leading backslash
fn escapeBody(body: &str) -> String {
    if !body.contains(COMMENT_OPEN) {
        return body.to_string();
    }
    body.split('\n').map(escapeLine).collect::<Vec<_>>().join("\n")
}

fn escapeLine(line: &str) -> String {
    let indent = line.len() - line.trim_start().len();
    let rest = &line[indent..];
    if rest.trim_start_matches('\\').starts_with(COMMENT_OPEN) {
        format!("{}\\{}", &line[..indent], rest)
    } else {
        line.to_string()
    }
}

fn renderBody(content: &BlockContent) -> Result<String> {
    let body = match content {
        BlockContent::Paragraph { content } => content.clone(),
        BlockContent::Heading { level, content } => {
            format!("{} {}", "#".repeat((*level).clamp(1, 6) as usize), oneLine(content))
        }
        BlockContent::Quote { content } => content
            .lines()
            .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {}", l) })
            .collect::<Vec<_>>()
            .join("\n"),
        BlockContent::Code { language, content } => format!("```{}\n{}\n```", language, content),
        BlockContent::Todo { items } => renderItems(items, true),
        BlockContent::List { items } => renderItems(items, false),
        BlockContent::Table { data, .. } => renderTable(data),
        BlockContent::Image { src, caption } => format!("![{}]({})", oneLine(caption), src),
        BlockContent::File { fileData } => {
            format!("{}{}{}", FILE_OPEN, serde_json::to_string(fileData)?, FILE_CLOSE)
        }
        BlockContent::Frame { src, caption } => {
            let payload = FramePayload { src: src.clone(), caption: caption.clone() };
            format!("{}{}{}", FRAME_OPEN, serde_json::to_string(&payload)?, FRAME_CLOSE)
        }
        BlockContent::Reference { referenceId } => referenceId
            .map(|id| format!("[[block:{}]]", id))
            .unwrap_or_default(),
        BlockContent::Divider => "---".to_string(),
    };
    Ok(body)
}

fn renderItems(items: &[ListItem], checkboxes: bool) -> String {
    items
        .iter()
        .map(|item| {
            let text = oneLine(&item.text);
            if checkboxes {
                format!("- [{}] {}", if item.completed { "x" } else { " " }, text)
            } else {
                format!("- {}", text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn escapeCell(cell: &str) -> String {
    oneLine(cell).replace('|', "\\|")
}

fn renderTable(data: &[Vec<String>]) -> String {
    let mut width = data.first().map(|r| r.len()).unwrap_or(0);
    if width == 0 {
        width = data.iter().map(|r| r.len()).max().unwrap_or(0);
    }
    if width == 0 {
        return String::new();
    }

    let mut lines = Vec::with_capacity(data.len() + 1);
    lines.push(format!("|{}", " --- |".repeat(width)));
    for row in data {
        let mut line = String::from("|");
        for i in 0..width.max(row.len()) {
            let cell = row.get(i).map(String::as_str).unwrap_or("");
            line.push(' ');
            line.push_str(&escapeCell(cell));
            line.push_str(" |");
        }
        lines.push(line);
    }
    lines.join("\n")
}
