use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical index key for an institution name or query token.
///
/// Whitespace is trimmed and collapsed, accents are folded to ASCII where an
/// equivalent exists, every word is lowercased unless it is written entirely in
/// uppercase letters, and punctuation is removed. The result is stable under a
/// second application.
#[must_use]
pub fn normalize(text: &str) -> String {
    let folded = transliterate(&collapse_whitespace(text));
    let cased = folded
        .split_whitespace()
        .map(fold_word_case)
        .collect::<Vec<_>>()
        .join(" ");
    let stripped = cased
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect::<String>();
    collapse_whitespace(&stripped)
}

/// Case-insensitive comparison key for place names.
#[must_use]
pub fn location_key(text: &str) -> String {
    normalize(text).to_lowercase()
}

#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// True when the word has at least one letter and every letter is uppercase.
/// Digits and punctuation do not count either way.
#[must_use]
pub fn is_all_uppercase(word: &str) -> bool {
    let mut letters = word.chars().filter(|ch| ch.is_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(char::is_uppercase)
}

fn fold_word_case(word: &str) -> String {
    if is_all_uppercase(word) {
        word.to_string()
    } else {
        word.to_lowercase()
    }
}

fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        match ascii_fallback(ch) {
            Some(replacement) => out.push_str(replacement),
            None => out.push(ch),
        }
    }
    out
}

// Letters that carry no canonical decomposition but have a conventional
// ASCII spelling.
fn ascii_fallback(ch: char) -> Option<&'static str> {
    let replacement = match ch {
        'ß' => "ss",
        'ẞ' => "SS",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        'ø' => "o",
        'Ø' => "O",
        'ł' => "l",
        'Ł' => "L",
        'đ' | 'ð' => "d",
        'Đ' | 'Ð' => "D",
        'þ' => "th",
        'Þ' => "TH",
        'ı' => "i",
        'ħ' => "h",
        'Ħ' => "H",
        'ŋ' => "ng",
        'Ŋ' => "NG",
        _ => return None,
    };
    Some(replacement)
}

#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((clip_idx, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let mut out = text[..clip_idx].to_string();
    out.push_str("...");
    out
}
