// Codec behaviour through the public API
#![allow(non_snake_case)]

use folio_lib::models::{FileData, ListItem};
use folio_lib::{Block, BlockContent, PageMetadata, decode, encode};

fn everyKind() -> Vec<Block> {
    vec![
        Block::heading(1, 1, "Project plan"),
        Block::paragraph(2, "First line\nsecond line"),
        Block::new(3, BlockContent::Quote { content: "Quoted\n\nwith a gap".into() }),
        Block::new(4, BlockContent::Code {
            language: "rust".into(),
            content: "fn main() {\n    println!(\"hi\");\n}".into(),
        }),
        Block::new(5, BlockContent::Todo {
            items: vec![ListItem::new(50, "Write tests", true), ListItem::new(51, "Ship", false)],
        }),
        Block::new(6, BlockContent::List {
            items: vec![ListItem::new(60, "apples", false), ListItem::new(61, "pears", false)],
        }),
        Block::new(7, BlockContent::Table {
            data: vec![
                vec!["Name".into(), "Notes".into()],
                vec!["pipe".into(), "a|b".into()],
            ],
            headers: Some(vec!["Name".into(), "Notes".into()]),
        }),
        Block::new(8, BlockContent::Image { src: "assets/photo-0123456789ab.png".into(), caption: "A photo".into() }),
        Block::new(9, BlockContent::File {
            fileData: FileData { name: "notes.txt".into(), base64: "aGVsbG8=".into() },
        }),
        Block::new(10, BlockContent::Frame { src: "https://example.com/embed".into(), caption: "Demo".into() }),
        Block::new(11, BlockContent::Reference { referenceId: Some(2) }),
        Block::new(12, BlockContent::Divider),
    ]
}

#[test]
fn test_every_block_kind_survives_a_round_trip() {
    let blocks = everyKind();
    let text = encode(&blocks, None).unwrap();
    let decoded = decode(&text);

    assert!(decoded.warnings.is_empty(), "{:?}", decoded.warnings);
    assert_eq!(decoded.page.blocks.len(), blocks.len());
    for (before, after) in blocks.iter().zip(&decoded.page.blocks) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.createdAt, after.createdAt);
        assert_eq!(before.content, after.content, "block {}", before.id);
    }
}

#[test]
fn test_page_metadata_round_trips() {
    let mut meta = PageMetadata::new();
    meta.title = Some("Home".into());
    meta.tags = vec!["work".into(), "draft".into()];
    meta.extra.insert("icon".into(), serde_json::json!("star"));

    let text = encode(&[Block::paragraph(1, "x")], Some(&meta)).unwrap();
    let decoded = decode(&text).page.metadata;

    assert_eq!(decoded.createdAt, meta.createdAt);
    assert_eq!(decoded.title.as_deref(), Some("Home"));
    assert_eq!(decoded.tags, meta.tags);
    assert_eq!(decoded.extra.get("icon"), Some(&serde_json::json!("star")));
}

#[test]
fn test_heading_and_todo_document() {
    let text = concat!(
        "<!--{\"createdAt\":\"2024-05-01T10:00:00Z\",\"lastEdited\":\"2024-05-01T10:00:00Z\"}-->\n\n",
        "<!--{\"type\":\"heading\",\"id\":1,\"createdAt\":\"2024-05-01T10:00:00Z\",\"lastEdited\":\"2024-05-01T10:00:00Z\"}-->\n",
        "## Groceries\n\n",
        "<!--{\"type\":\"todo\",\"id\":2,\"createdAt\":\"2024-05-01T10:00:00Z\",\"lastEdited\":\"2024-05-01T10:00:00Z\"}-->\n",
        "- [ ] Milk\n- [x] Eggs\n\n",
    );
    let page = decode(text).page;

    assert_eq!(page.blocks.len(), 2);
    assert_eq!(page.blocks[0].content, BlockContent::Heading { level: 2, content: "Groceries".into() });
    let BlockContent::Todo { items } = &page.blocks[1].content else {
        panic!("expected a todo block");
    };
    assert_eq!(items.len(), 2);
    assert_eq!((items[0].text.as_str(), items[0].completed), ("Milk", false));
    assert_eq!((items[1].text.as_str(), items[1].completed), ("Eggs", true));
    // No itemIds in the comment: ids derive from the block id
    assert_eq!(items[0].id, 2000);
    assert_eq!(items[1].id, 2001);
}

#[test]
fn test_table_document() {
    let text = concat!(
        "<!--{\"type\":\"table\",\"id\":7}-->\n",
        "| --- | --- | --- |\n",
        "| City | Country | Note |\n",
        "| Lyon | France | a\\|b |\n",
    );
    let page = decode(text).page;

    assert_eq!(
        page.blocks[0].content,
        BlockContent::Table {
            data: vec![
                vec!["City".into(), "Country".into(), "Note".into()],
                vec!["Lyon".into(), "France".into(), "a|b".into()],
            ],
            headers: None,
        }
    );
}

#[test]
fn test_empty_blocks_never_reach_the_caller() {
    let blocks = vec![
        Block::paragraph(1, "kept"),
        Block::paragraph(2, ""),
        Block::new(3, BlockContent::List { items: vec![] }),
        Block::new(4, BlockContent::Image { src: String::new(), caption: String::new() }),
        Block::new(5, BlockContent::Reference { referenceId: None }),
        Block::new(6, BlockContent::Divider),
    ];
    let page = decode(&encode(&blocks, None).unwrap()).page;

    let ids: Vec<_> = page.blocks.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 6]);
}

#[test]
fn test_duplicate_ids_are_made_unique() {
    let text = concat!(
        "<!--{\"type\":\"paragraph\",\"id\":5}-->\none\n\n",
        "<!--{\"type\":\"paragraph\",\"id\":5}-->\ntwo\n\n",
    );
    let decoded = decode(text);

    let ids: Vec<_> = decoded.page.blocks.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![5, 6]);
    assert_eq!(decoded.warnings.len(), 1);
}

#[test]
fn test_duplicate_id_never_takes_a_later_blocks_id() {
    let text = concat!(
        "<!--{\"type\":\"paragraph\",\"id\":5}-->\none\n\n",
        "<!--{\"type\":\"paragraph\",\"id\":5}-->\ntwo\n\n",
        "<!--{\"type\":\"paragraph\",\"id\":6}-->\nthree\n\n",
        "<!--{\"type\":\"reference\",\"id\":7}-->\n[[block:6]]\n\n",
    );
    let page = decode(text).page;

    let ids: Vec<_> = page.blocks.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![5, 8, 6, 7]);
    assert_eq!(page.blocks[2].content, BlockContent::Paragraph { content: "three".into() });
    assert_eq!(page.blocks[3].content, BlockContent::Reference { referenceId: Some(6) });
}

#[test]
fn test_comment_like_text_survives_a_round_trip() {
    let blocks = vec![
        Block::paragraph(1, "Draft:\n<!-- todo later"),
        Block::paragraph(2, "<!-- {draft"),
        Block::new(3, BlockContent::Code { language: "html".into(), content: "  <!--{\"a\":1}-->\n\\<!-- kept".into() }),
        Block::paragraph(4, "second"),
    ];
    let decoded = decode(&encode(&blocks, None).unwrap());

    assert!(decoded.warnings.is_empty(), "{:?}", decoded.warnings);
    assert_eq!(decoded.page.blocks.len(), blocks.len());
    for (before, after) in blocks.iter().zip(&decoded.page.blocks) {
        assert_eq!(before.id, after.id);
        assert_eq!(before.content, after.content);
    }
}

#[test]
fn test_hand_written_comment_does_not_swallow_the_next_block() {
    let text = concat!(
        "<!--{\"type\":\"paragraph\",\"id\":1}-->\nDraft:\n<!-- todo later\n\n",
        "<!--{\"type\":\"paragraph\",\"id\":2}-->\nsecond\n\n",
    );
    let page = decode(text).page;

    let ids: Vec<_> = page.blocks.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert_eq!(page.blocks[0].content, BlockContent::Paragraph { content: "Draft:\n<!-- todo later".into() });
}

#[test]
fn test_empty_items_keep_their_place() {
    let blocks = vec![
        Block::new(1, BlockContent::Todo {
            items: vec![ListItem::new(10, "", false), ListItem::new(11, "Eggs", true)],
        }),
        Block::new(2, BlockContent::List {
            items: vec![ListItem::new(20, "first", false), ListItem::new(21, "", false), ListItem::new(22, "third", false)],
        }),
    ];
    let page = decode(&encode(&blocks, None).unwrap()).page;

    assert_eq!(page.blocks[0].content, blocks[0].content);
    assert_eq!(page.blocks[1].content, blocks[1].content);
}

#[test]
fn test_plain_html_comment_is_content() {
    let text = "<!--{\"type\":\"paragraph\",\"id\":1}-->\nbefore\n<!-- just a note -->\nafter\n";
    let page = decode(text).page;
    assert_eq!(
        page.blocks[0].content,
        BlockContent::Paragraph { content: "before\n<!-- just a note -->\nafter".into() }
    );
}
