use std::collections::HashMap;

use candle_core::Device;
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::pre_tokenizers::whitespace::WhitespaceSplit;
use tokenizers::pre_tokenizers::PreTokenizerWrapper;
use tokenizers::processors::template::TemplateProcessing;
use tokenizers::processors::PostProcessorWrapper;
use tokenizers::Tokenizer;

use sanskrit_rag_embed::tokenize::{encode_truncated, tokenize_batch};

const EOS: u32 = 1;

/// Whitespace word tokenizer that closes every sequence with `</s>`, like T5.
fn t5_like_tokenizer() -> Tokenizer {
    let vocab: HashMap<String, u32> = [("<unk>", 0), ("</s>", EOS), ("अग्निः", 2), ("देवः", 3), ("अस्ति", 4), ("यज्ञे", 5)]
        .into_iter()
        .map(|(w, id)| (w.to_string(), id))
        .collect();
    let model = WordLevel::builder().vocab(vocab).unk_token("<unk>".to_string()).build().unwrap();
    let template = TemplateProcessing::builder()
        .try_single("$A </s>")
        .unwrap()
        .special_tokens(vec![("</s>", EOS)])
        .build()
        .unwrap();
    let mut tokenizer = Tokenizer::new(model);
    tokenizer.with_pre_tokenizer(PreTokenizerWrapper::WhitespaceSplit(WhitespaceSplit));
    tokenizer.with_post_processor(PostProcessorWrapper::Template(template));
    tokenizer
}

#[test]
fn long_input_is_cut_to_limit_keeping_eos() {
    let tok = t5_like_tokenizer();
    let text = "अग्निः देवः अस्ति यज्ञे अग्निः देवः";
    let (full, none_dropped) = encode_truncated(&tok, text, 512).unwrap();
    assert_eq!(full.len(), 7);
    assert_eq!(none_dropped, 0);

    let (ids, dropped) = encode_truncated(&tok, text, 4).unwrap();
    assert_eq!(ids.len(), 4);
    assert_eq!(ids, vec![2, 3, 4, EOS]);
    assert_eq!(dropped, full.len() - 4);
}

#[test]
fn short_input_is_unchanged() {
    let tok = t5_like_tokenizer();
    let (ids, dropped) = encode_truncated(&tok, "अग्निः देवः", 10).unwrap();
    assert_eq!(ids, vec![2, 3, EOS]);
    assert_eq!(dropped, 0);

    let (exact, dropped) = encode_truncated(&tok, "अग्निः देवः", 3).unwrap();
    assert_eq!(exact, ids);
    assert_eq!(dropped, 0);
}

#[test]
fn unknown_words_map_to_unk() {
    let tok = t5_like_tokenizer();
    let (ids, _) = encode_truncated(&tok, "वरुणः अस्ति", 8).unwrap();
    assert_eq!(ids, vec![0, 4, EOS]);
}

#[test]
fn batch_is_padded_to_longest_row() {
    let tok = t5_like_tokenizer();
    let texts = vec!["अग्निः".to_string(), "अग्निः देवः अस्ति".to_string()];
    let (ids, mask) = tokenize_batch(&tok, &texts, 16, 0, &Device::Cpu).unwrap();
    assert_eq!(ids.dims(), &[2, 4]);
    assert_eq!(ids.to_vec2::<u32>().unwrap(), vec![vec![2, EOS, 0, 0], vec![2, 3, 4, EOS]]);
    assert_eq!(mask.to_vec2::<u32>().unwrap(), vec![vec![1, 1, 0, 0], vec![1, 1, 1, 1]]);
}
