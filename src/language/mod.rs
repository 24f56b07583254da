//! Language detection from a short audio sample.

use std::collections::HashMap;
use std::path::Path;

use crate::transcribe::SpeechRecognizer;

/// Code used whenever detection cannot produce a confident answer.
pub const DEFAULT_LANGUAGE: &str = "en";

/// The second recognition attempt on the sample uses this hint.
const SAMPLE_RETRY_HINT: &str = "ar";

/// Failure modes of the language-identification capability.
#[derive(thiserror::Error, Debug)]
pub enum IdentifyError {
    #[error("text too short to classify ({0} letters)")]
    TooShort(usize),

    #[error("no dominant script or vocabulary in sample")]
    Ambiguous,
}

/// Capability seam for statistical language identification.
pub trait LanguageIdentifier: Send + Sync {
    fn identify(&self, text: &str) -> Result<String, IdentifyError>;
}

/// Detect the run's language from a short audio sample.
///
/// Transcribes the sample without a hint, retries once with the Arabic hint,
/// and classifies the resulting text. Every failure path resolves to
/// [`DEFAULT_LANGUAGE`]: a wrong or missing guess degrades transcription
/// quality but must never abort the pipeline.
pub async fn sample_language(
    recognizer: &dyn SpeechRecognizer,
    identifier: &dyn LanguageIdentifier,
    sample: &Path,
) -> String {
    let text = match recognizer.recognize(sample, None).await {
        Ok(text) => text,
        Err(_) => recognizer
            .recognize(sample, Some(SAMPLE_RETRY_HINT))
            .await
            .unwrap_or_default(),
    };

    if text.trim().is_empty() {
        tracing::warn!("sample produced no text; falling back to {DEFAULT_LANGUAGE}");
        return DEFAULT_LANGUAGE.to_string();
    }

    match identifier.identify(&text) {
        Ok(code) => {
            tracing::info!(language = %code, "language detected from sample");
            code
        }
        Err(err) => {
            tracing::warn!(%err, "language identification failed; falling back to {DEFAULT_LANGUAGE}");
            DEFAULT_LANGUAGE.to_string()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Script {
    Latin,
    Arabic,
    Cyrillic,
    Hebrew,
    Greek,
    Han,
    Kana,
    Hangul,
    Devanagari,
    Thai,
    Other,
}

fn script_of(c: char) -> Script {
    match c as u32 {
        0x0041..=0x024F => Script::Latin,
        0x0370..=0x03FF => Script::Greek,
        0x0400..=0x052F => Script::Cyrillic,
        0x0590..=0x05FF => Script::Hebrew,
        0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF => Script::Arabic,
        0x0900..=0x097F => Script::Devanagari,
        0x0E00..=0x0E7F => Script::Thai,
        0x1100..=0x11FF | 0xAC00..=0xD7AF => Script::Hangul,
        0x3040..=0x30FF => Script::Kana,
        0x3400..=0x4DBF | 0x4E00..=0x9FFF => Script::Han,
        _ => Script::Other,
    }
}

/// Stop words used to tell common Latin-script languages apart.
const LATIN_STOPWORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "is", "of", "to", "in", "that", "it", "you", "for"]),
    ("es", &["el", "la", "que", "los", "las", "una", "por", "como", "pero", "esta"]),
    ("fr", &["le", "les", "des", "est", "une", "dans", "pour", "nous", "vous", "avec"]),
    ("de", &["der", "die", "das", "und", "ist", "nicht", "ein", "mit", "sie", "ich"]),
    ("pt", &["que", "não", "uma", "para", "com", "mais", "isso", "você", "são", "como"]),
    ("it", &["il", "che", "di", "non", "una", "per", "con", "sono", "come", "questo"]),
];

/// Classifies text by its dominant Unicode script, with a small stop-word
/// vote to tell common Latin-script languages apart. Fails on too-short or
/// ambiguous input; the caller falls back to the default code.
pub struct ScriptIdentifier {
    min_letters: usize,
}

impl ScriptIdentifier {
    pub fn new() -> Self {
        Self { min_letters: 10 }
    }

    fn latin_language(&self, text: &str) -> Result<String, IdentifyError> {
        let mut votes: HashMap<&str, usize> = HashMap::new();
        for token in text
            .split(|c: char| !c.is_alphabetic())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            for (code, words) in LATIN_STOPWORDS {
                if words.contains(&token.as_str()) {
                    *votes.entry(*code).or_default() += 1;
                }
            }
        }

        votes
            .into_iter()
            .max_by_key(|(_, count)| *count)
            .map(|(code, _)| code.to_string())
            .ok_or(IdentifyError::Ambiguous)
    }
}

impl Default for ScriptIdentifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageIdentifier for ScriptIdentifier {
    fn identify(&self, text: &str) -> Result<String, IdentifyError> {
        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.len() < self.min_letters {
            return Err(IdentifyError::TooShort(letters.len()));
        }

        let mut counts: HashMap<Script, usize> = HashMap::new();
        for c in &letters {
            *counts.entry(script_of(*c)).or_default() += 1;
        }

        let (&dominant, &count) = counts
            .iter()
            .max_by_key(|(_, count)| **count)
            .ok_or(IdentifyError::Ambiguous)?;
        if count * 2 <= letters.len() {
            return Err(IdentifyError::Ambiguous);
        }

        // Japanese mixes Han with kana; any kana at all outweighs the Han
        // count for classification.
        let kana = counts.get(&Script::Kana).copied().unwrap_or(0);

        match dominant {
            Script::Arabic => Ok("ar".to_string()),
            Script::Cyrillic => Ok("ru".to_string()),
            Script::Hebrew => Ok("he".to_string()),
            Script::Greek => Ok("el".to_string()),
            Script::Han if kana > 0 => Ok("ja".to_string()),
            Script::Han => Ok("zh".to_string()),
            Script::Kana => Ok("ja".to_string()),
            Script::Hangul => Ok("ko".to_string()),
            Script::Devanagari => Ok("hi".to_string()),
            Script::Thai => Ok("th".to_string()),
            Script::Latin => self.latin_language(text),
            Script::Other => Err(IdentifyError::Ambiguous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcribe::{MockSpeechRecognizer, RecognizeError};
    use std::path::PathBuf;

    struct PanicIdentifier;

    impl LanguageIdentifier for PanicIdentifier {
        fn identify(&self, _text: &str) -> Result<String, IdentifyError> {
            panic!("identifier must not run on empty sample text");
        }
    }

    struct FixedIdentifier(&'static str);

    impl LanguageIdentifier for FixedIdentifier {
        fn identify(&self, _text: &str) -> Result<String, IdentifyError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn identifies_scripts() {
        let id = ScriptIdentifier::new();
        assert_eq!(id.identify("هذا نص عربي طويل بما يكفي للتصنيف").unwrap(), "ar");
        assert_eq!(id.identify("это довольно длинный русский текст").unwrap(), "ru");
        assert_eq!(id.identify("これは日本語のサンプルテキストです").unwrap(), "ja");
        assert_eq!(id.identify("the cat and the dog sit in the house").unwrap(), "en");
    }

    #[test]
    fn rejects_short_and_ambiguous_text() {
        let id = ScriptIdentifier::new();
        assert!(matches!(id.identify("hi"), Err(IdentifyError::TooShort(_))));
        assert!(matches!(id.identify("12345 67890"), Err(IdentifyError::TooShort(_))));
        assert!(matches!(
            id.identify("xqzt vbnm plk jhgf dsaw qwerty"),
            Err(IdentifyError::Ambiguous)
        ));
    }

    #[tokio::test]
    async fn empty_sample_falls_back_without_identification() {
        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize().returning(|_, _| Ok("   ".to_string()));

        let code = sample_language(&mock, &PanicIdentifier, &PathBuf::from("s.wav")).await;
        assert_eq!(code, DEFAULT_LANGUAGE);
    }

    #[tokio::test]
    async fn failed_sample_attempts_fall_back_to_default() {
        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize()
            .returning(|_, _| Err(RecognizeError::NoSpeech));

        let code = sample_language(&mock, &PanicIdentifier, &PathBuf::from("s.wav")).await;
        assert_eq!(code, DEFAULT_LANGUAGE);
    }

    #[tokio::test]
    async fn retry_uses_arabic_hint_then_identifies() {
        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize()
            .withf(|_, hint| hint.is_none())
            .returning(|_, _| Err(RecognizeError::NoSpeech));
        mock.expect_recognize()
            .withf(|_, hint| hint == &Some("ar"))
            .returning(|_, _| Ok("نص عربي".to_string()));

        let code = sample_language(&mock, &FixedIdentifier("ar"), &PathBuf::from("s.wav")).await;
        assert_eq!(code, "ar");
    }

    #[tokio::test]
    async fn identifier_failure_falls_back_to_default() {
        struct FailingIdentifier;
        impl LanguageIdentifier for FailingIdentifier {
            fn identify(&self, _text: &str) -> Result<String, IdentifyError> {
                Err(IdentifyError::Ambiguous)
            }
        }

        let mut mock = MockSpeechRecognizer::new();
        mock.expect_recognize()
            .returning(|_, _| Ok("some recognized text".to_string()));

        let code = sample_language(&mock, &FailingIdentifier, &PathBuf::from("s.wav")).await;
        assert_eq!(code, DEFAULT_LANGUAGE);
    }
}
