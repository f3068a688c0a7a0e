use std::fs;
use tempfile::TempDir;

use sanskrit_rag_core::config::{Config, DistanceMetric};
use sanskrit_rag_core::error::Error;
use sanskrit_rag_core::splitter::{load_corpus, ChunkingConfig, SplitStrategy, TextSplitter};

fn window_splitter() -> TextSplitter { TextSplitter::new(ChunkingConfig::default()).unwrap() }

#[test]
fn window_split_covers_corpus_with_exact_overlap() {
    let text: String = (0..1337).map(|i| if i % 7 == 0 { 'अ' } else { 'x' }).collect();
    let chunks = window_splitter().split_text(&text);
    assert_eq!(chunks.len(), 3, "1337 chars in windows of 500 stepping 450");

    for c in &chunks { assert!(c.chars().count() <= 500); }
    for pair in chunks.windows(2) {
        let prev: Vec<char> = pair[0].chars().collect();
        let next: Vec<char> = pair[1].chars().collect();
        assert_eq!(&prev[prev.len() - 50..], &next[..50], "adjacent chunks share exactly 50 chars");
    }

    // Dropping each overlap reconstructs the corpus.
    let mut rebuilt: String = chunks[0].clone();
    for c in &chunks[1..] { rebuilt.extend(c.chars().skip(50)); }
    assert_eq!(rebuilt, text);
}

#[test]
fn window_split_small_and_empty_inputs() {
    let splitter = window_splitter();
    assert!(splitter.split_text("").is_empty());
    let short = "अग्निः देवः अस्ति। सः यज्ञे प्रमुखः।";
    assert_eq!(splitter.split_text(short), vec![short.to_string()]);
    let exact: String = "क".repeat(500);
    assert_eq!(splitter.split_text(&exact).len(), 1);
}

#[test]
fn recursive_split_prefers_paragraphs_and_trims() {
    let config = ChunkingConfig { chunk_size: 40, chunk_overlap: 10, strategy: SplitStrategy::Recursive };
    let splitter = TextSplitter::new(config).unwrap();
    let text = "first paragraph is here\n\nsecond paragraph is here\n\n   \n\nthird one";
    let chunks = splitter.split_text(text);
    assert_eq!(chunks, vec!["first paragraph is here", "second paragraph is here", "third one"]);
}

#[test]
fn recursive_split_falls_back_to_words_with_overlap() {
    let config = ChunkingConfig { chunk_size: 20, chunk_overlap: 8, strategy: SplitStrategy::Recursive };
    let splitter = TextSplitter::new(config).unwrap();
    let chunks = splitter.split_text("alpha beta gamma delta epsilon zeta");
    assert!(chunks.len() > 1);
    for c in &chunks { assert!(c.chars().count() <= 20, "chunk too long: {c:?}"); }
    assert_eq!(chunks.first().map(String::as_str), Some("alpha beta gamma"));
    // The last word of one chunk reappears at the start of the next.
    assert!(chunks[1].starts_with("gamma"));
}

#[test]
fn invalid_chunking_config_is_rejected() {
    let config = ChunkingConfig { chunk_size: 50, chunk_overlap: 50, strategy: SplitStrategy::Window };
    assert!(TextSplitter::new(config).is_err());
}

#[test]
fn process_file_assigns_positions() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sanskrit_docs.txt");
    fs::write(&path, "ॐ ".repeat(600)).unwrap();

    let chunks = window_splitter().process_file(&path).expect("process");
    assert_eq!(chunks.len(), 3);
    for (i, c) in chunks.iter().enumerate() {
        assert_eq!(c.chunk_index, i);
        assert_eq!(c.total_chunks, 3);
        assert_eq!(c.id, format!("sanskrit_docs:{i}"));
    }
}

#[test]
fn missing_corpus_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let err = load_corpus(&tmp.path().join("absent.txt")).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotFound(_))));
}

#[test]
fn invalid_utf8_corpus_is_decode_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("bad.txt");
    fs::write(&path, [0xffu8, 0xfe, 0x00, 0x41]).unwrap();
    let err = load_corpus(&path).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Decode(_))));
}

#[test]
fn settings_default_when_no_config_files() {
    let tmp = TempDir::new().unwrap();
    let settings = Config::load_from(tmp.path()).unwrap().settings().unwrap();
    assert_eq!(settings.data.corpus_path, "data/sanskrit_docs.txt");
    assert_eq!(settings.splitter.chunk_size, 500);
    assert_eq!(settings.splitter.chunk_overlap, 50);
    assert_eq!(settings.retriever.top_k, 3);
    assert_eq!(settings.retriever.metric, DistanceMetric::L2);
    assert_eq!(settings.generator.num_beams, 4);
    assert_eq!(settings.generator.max_new_tokens, 120);
    assert_eq!(settings.generator.max_input_tokens, 512);
}

#[test]
fn settings_read_from_config_toml() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join("config.toml"),
        "[retriever]\ntop_k = 5\nmetric = \"cosine\"\n\n[splitter]\nstrategy = \"recursive\"\n",
    )
    .unwrap();
    let config = Config::load_from(tmp.path()).unwrap();
    let settings = config.settings().unwrap();
    assert_eq!(settings.retriever.top_k, 5);
    assert_eq!(settings.retriever.metric, DistanceMetric::Cosine);
    assert_eq!(settings.splitter.strategy, SplitStrategy::Recursive);
    assert_eq!(settings.splitter.chunk_size, 500, "unset keys keep defaults");
    assert_eq!(config.get::<usize>("retriever.top_k").unwrap(), 5);
}

#[test]
fn settings_reject_overlap_not_smaller_than_size() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("config.toml"), "[splitter]\nchunk_size = 10\nchunk_overlap = 20\n").unwrap();
    assert!(Config::load_from(tmp.path()).unwrap().settings().is_err());
}
