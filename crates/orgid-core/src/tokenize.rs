use crate::models::{Token, TokenSource};

/// Tokens shorter than this carry too little signal to match reliably.
pub const MIN_TOKEN_CHARS: usize = 3;

const WORD_EDGE_PUNCTUATION: &[char] = &[',', ';', '.', ':', '!', '?', '"', '\''];

/// Split an affiliation string into candidate institution names.
///
/// Passes run in order and each one removes what it extracted before the next
/// pass sees the text:
/// 1. whitespace-delimited words written entirely in uppercase letters,
/// 2. the contents of parenthesized spans,
/// 3. whatever remains, split on commas, semicolons and dashes.
///
/// Every extracted span leaves the working text, but only tokens whose trimmed
/// length reaches [`MIN_TOKEN_CHARS`] are emitted.
#[must_use]
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let working = extract_uppercase_words(text, &mut tokens);
    let working = extract_parentheticals(&working, &mut tokens);
    split_on_dividers(&working, &mut tokens);
    tokens
}

#[must_use]
pub fn is_divider(ch: char) -> bool {
    matches!(
        ch,
        ',' | ';' | '-' | '\u{2010}'..='\u{2015}' | '\u{2212}'
    )
}

fn has_min_length(text: &str) -> bool {
    text.chars().count() >= MIN_TOKEN_CHARS
}

fn extract_uppercase_words(text: &str, tokens: &mut Vec<Token>) -> String {
    let mut removed = Vec::<Removal>::new();
    for (start, end) in word_spans(text) {
        let word = &text[start..end];
        let core_start = start + (word.len() - word.trim_start_matches(WORD_EDGE_PUNCTUATION).len());
        let core_end = end - (word.len() - word.trim_end_matches(WORD_EDGE_PUNCTUATION).len());
        if core_start >= core_end {
            continue;
        }
        let core = &text[core_start..core_end];
        if !core.chars().all(|ch| ch.is_alphabetic() && ch.is_uppercase()) {
            continue;
        }
        if has_min_length(core) {
            tokens.push(Token::new(core, TokenSource::Uppercase));
        }
        // Edge punctuation goes with the word, but dividers must survive for pass 3.
        let mut replacement = String::from(" ");
        replacement.extend(text[start..core_start].chars().filter(|ch| is_divider(*ch)));
        replacement.extend(text[core_end..end].chars().filter(|ch| is_divider(*ch)));
        replacement.push(' ');
        removed.push(Removal {
            start,
            end,
            replacement,
        });
    }
    apply_removals(text, &removed)
}

fn extract_parentheticals(text: &str, tokens: &mut Vec<Token>) -> String {
    let mut removed = Vec::<Removal>::new();
    let mut cursor = 0usize;
    while let Some(open_rel) = text[cursor..].find('(') {
        let open = cursor + open_rel;
        let Some(close_rel) = text[open + 1..].find(')') else {
            break;
        };
        let close = open + 1 + close_rel;
        let inner = text[open + 1..close].trim();
        if has_min_length(inner) {
            tokens.push(Token::new(inner, TokenSource::Parenthetical));
        }
        removed.push(Removal {
            start: open,
            end: close + 1,
            replacement: " ".to_string(),
        });
        cursor = close + 1;
    }
    apply_removals(text, &removed)
}

fn split_on_dividers(text: &str, tokens: &mut Vec<Token>) {
    for segment in text.split(is_divider) {
        let segment = segment.trim();
        if has_min_length(segment) {
            tokens.push(Token::new(segment, TokenSource::Divider));
        }
    }
}

fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(word_start)) => {
                spans.push((word_start, idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(word_start) = start {
        spans.push((word_start, text.len()));
    }
    spans
}

struct Removal {
    start: usize,
    end: usize,
    replacement: String,
}

/// Removals must be sorted by position and must not overlap.
fn apply_removals(text: &str, removals: &[Removal]) -> String {
    if removals.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;
    for removal in removals {
        out.push_str(&text[cursor..removal.start]);
        out.push_str(&removal.replacement);
        cursor = removal.end;
    }
    out.push_str(&text[cursor..]);
    out
}
