use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref NON_WORD: Regex = Regex::new(r"[\W_]+").expect("valid regex");
}

/// NFKC-normalizes, lowercases and strips every non-word character and underscore.
/// May return an empty string.
pub fn normalize_word(word: &str) -> String {
    let folded = word.nfkc().collect::<String>().to_lowercase();
    NON_WORD.replace_all(&folded, "").into_owned()
}

/// Splits on whitespace and normalizes each piece, dropping those that end up empty.
pub fn parse_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(normalize_word).filter(|w| !w.is_empty()).collect()
}
