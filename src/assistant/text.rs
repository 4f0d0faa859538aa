//! Small text utilities shared by the recognizers.

/// Characters stripped from both ends of a question token.
const TOKEN_PUNCT: &[char] = &['¿', '?', '¡', '!', '.', ',', ';', ':'];

/// `true` when `haystack` contains any of `needles`.
pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Whitespace tokens of `lower` with surrounding punctuation removed,
/// minus `stopwords`.
pub fn tokens<'a>(lower: &'a str, stopwords: &[&str]) -> Vec<&'a str> {
    lower
        .split_whitespace()
        .map(strip_punct)
        .filter(|t| !t.is_empty() && !stopwords.contains(t))
        .collect()
}

pub fn strip_punct(token: &str) -> &str {
    token.trim_matches(TOKEN_PUNCT)
}

/// `true` when the token is long enough to search names with.
pub fn searchable(token: &str) -> bool {
    token.chars().count() >= 3
}

/// Lowercase and drop Spanish acute accents so "Concepción" equals
/// "concepcion". `ñ` is kept.
pub fn fold(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

/// "viña del mar" → "Viña Del Mar".
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `true` when `word` appears in `lower` delimited by non-alphanumerics.
pub fn contains_word(lower: &str, word: &str) -> bool {
    lower
        .split(|c: char| !c.is_alphanumeric())
        .any(|w| w == word)
}
