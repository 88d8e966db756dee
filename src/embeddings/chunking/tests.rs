use super::*;

fn document(content: &str, row: usize) -> Document {
    Document {
        content: content.to_string(),
        source: "data/processed_anime.csv".to_string(),
        row,
    }
}

#[test]
fn short_document_is_single_chunk() {
    let doc = document("combined_info: Title: Mushishi Overview: Ginko wanders.", 0);

    let chunks = chunk_document(&doc, &ChunkingConfig::default());

    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, doc.content);
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].char_count, doc.content.chars().count());
}

#[test]
fn long_document_splits_at_fixed_width() {
    let text = "abcdefghij".repeat(25);
    let config = ChunkingConfig {
        chunk_size: 100,
        chunk_overlap: 0,
    };

    let splits = split_fixed_width(&text, &config);

    assert_eq!(splits.len(), 3);
    assert_eq!(splits[0].len(), 100);
    assert_eq!(splits[1].len(), 100);
    assert_eq!(splits[2].len(), 50);
    assert_eq!(splits.concat(), text);
}

#[test]
fn overlap_repeats_trailing_characters() {
    let text: String = ('a'..='z').collect();
    let config = ChunkingConfig {
        chunk_size: 10,
        chunk_overlap: 4,
    };

    let splits = split_fixed_width(&text, &config);

    assert_eq!(splits[0], "abcdefghij");
    assert_eq!(splits[1], "ghijklmnop");
    assert_eq!(splits.last().map(String::as_str), Some("stuvwxyz"));
}

#[test]
fn multibyte_characters_are_never_split() {
    let text = "進撃の巨人".repeat(3);
    let config = ChunkingConfig {
        chunk_size: 4,
        chunk_overlap: 0,
    };

    let splits = split_fixed_width(&text, &config);

    assert!(splits.iter().all(|s| s.chars().count() <= 4));
    assert_eq!(splits.concat(), text);
}

#[test]
fn whitespace_windows_are_dropped() {
    let text = format!("{}{}", "x".repeat(5), " ".repeat(10));
    let config = ChunkingConfig {
        chunk_size: 5,
        chunk_overlap: 0,
    };

    assert_eq!(split_fixed_width(&text, &config), vec!["xxxxx".to_string()]);
}

#[test]
fn chunk_indices_restart_per_document() {
    let docs = vec![document(&"a".repeat(25), 0), document(&"b".repeat(12), 1)];
    let config = ChunkingConfig {
        chunk_size: 10,
        chunk_overlap: 0,
    };

    let chunks = chunk_documents(&docs, &config);

    let layout: Vec<(usize, usize)> = chunks.iter().map(|c| (c.row, c.chunk_index)).collect();
    assert_eq!(layout, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1)]);
    assert!(chunks.iter().all(|c| c.source == "data/processed_anime.csv"));
}

#[test]
fn empty_content() {
    let chunks = chunk_documents(&[document("", 0)], &ChunkingConfig::default());
    assert!(chunks.is_empty());
}
