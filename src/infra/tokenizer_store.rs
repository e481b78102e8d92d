// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Builds a HuggingFace WordLevel tokenizer whose vocabulary is
// exactly the (truncated) pretrained-vector vocabulary, so every
// id it emits is a valid embedding row.
//
// The tokenizer JSON is generated directly rather than trained:
// the vocabulary already exists and must keep its indices.
// `<unk>` at id 0 doubles as the padding id.
//
// Reference: tokenizers crate documentation

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokenizers::Tokenizer;

use crate::domain::vocabulary::{Vocabulary, UNKNOWN_INDEX, UNKNOWN_TOKEN};

pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Text → vocabulary index encoder.
#[derive(Clone)]
pub struct TextTokenizer {
    inner: Tokenizer,
}

impl TextTokenizer {
    /// Generate a tokenizer for `vocab`.
    pub fn from_vocabulary(vocab: &Vocabulary) -> Result<Self> {
        let entries: serde_json::Map<String, serde_json::Value> = vocab
            .tokens()
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), serde_json::json!(i)))
            .collect();

        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [
                {"id": UNKNOWN_INDEX, "content": UNKNOWN_TOKEN, "single_word": false, "lstrip": false, "rstrip": false, "normalized": false, "special": true}
            ],
            "normalizer": {
                "type": "BertNormalizer",
                "clean_text": true,
                "handle_chinese_chars": true,
                "strip_accents": null,
                "lowercase": true
            },
            "pre_tokenizer": {
                "type": "Whitespace"
            },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": entries,
                "unk_token": UNKNOWN_TOKEN
            }
        });

        let inner = Tokenizer::from_str(&tokenizer_json.to_string())
            .map_err(|e| anyhow::anyhow!("Cannot build tokenizer: {e}"))?;
        tracing::debug!("Tokenizer built over {} vocabulary entries", vocab.len());
        Ok(Self { inner })
    }

    /// Vocabulary indices of `text`, in reading order.
    pub fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self.inner
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("Tokenisation error: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    pub fn vocab_size(&self) -> usize {
        self.inner.get_vocab_size(true)
    }
}

/// Saves and loads the tokenizer next to a checkpoint.
pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    pub fn save(&self, tokenizer: &TextTokenizer) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.path();
        tokenizer.inner
            .save(&path, true)
            .map_err(|e| anyhow::anyhow!("Cannot write tokenizer to '{}': {e}", path.display()))?;
        Ok(())
    }

    pub fn load(&self) -> Result<TextTokenizer> {
        let path = self.path();
        let inner = Tokenizer::from_file(&path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", path.display(), e
            ))?;
        Ok(TextTokenizer { inner })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> Vocabulary {
        Vocabulary::from_tokens(["oil", "prices", "rose", ","], 100)
    }

    #[test]
    fn test_ids_match_vocabulary() {
        let tok = TextTokenizer::from_vocabulary(&vocab()).unwrap();
        assert_eq!(tok.encode("oil prices rose").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_lowercases_and_maps_unknown_to_zero() {
        let tok = TextTokenizer::from_vocabulary(&vocab()).unwrap();
        assert_eq!(tok.encode("OIL, wheat").unwrap(), vec![1, 4, UNKNOWN_INDEX]);
    }

    #[test]
    fn test_empty_text_has_no_tokens() {
        let tok = TextTokenizer::from_vocabulary(&vocab()).unwrap();
        assert!(tok.encode("").unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tok = TextTokenizer::from_vocabulary(&vocab()).unwrap();
        store.save(&tok).unwrap();
        let back = store.load().unwrap();
        assert_eq!(back.encode("rose").unwrap(), vec![3]);
        assert_eq!(back.vocab_size(), 5);
    }
}
