//! Query tokenization and text folding
//!
//! Queries, paths, titles and bodies are all compared in folded form:
//! lowercase with Latin diacritics removed, so "Vinhos Tintos Português" and
//! "vinhos-tintos-portugues" agree.

/// Maximum number of query tokens considered
pub const MAX_TOKENS: usize = 8;

fn fold_char(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Lowercases text and strips Latin diacritics
///
/// # Example
///
/// ```
/// use guide_harvest::search::fold;
///
/// assert_eq!(fold("Ação ÚNICA"), "acao unica");
/// ```
pub fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).map(fold_char).collect()
}

/// Splits folded text into alphanumeric words
pub fn words(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_string)
        .collect()
}

/// Tokenizes a query
///
/// Distinct folded words in query order, at most [`MAX_TOKENS`].
///
/// # Example
///
/// ```
/// use guide_harvest::search::tokenize;
///
/// assert_eq!(tokenize("Vinho TINTO, vinho!"), vec!["vinho", "tinto"]);
/// ```
pub fn tokenize(query: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    for word in words(query) {
        if tokens.len() == MAX_TOKENS {
            break;
        }
        if !tokens.contains(&word) {
            tokens.push(word);
        }
    }
    tokens
}

/// Number of non-overlapping occurrences of `needle` in `haystack`
pub fn occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}
