use std::collections::HashSet;

/// Split characters besides whitespace. `+`, `#` and inner `.` are kept so
/// terms like `C++`, `C#` and `Node.js` survive.
const SEPARATORS: &[char] = &[
    ',', ';', ':', '!', '?', '(', ')', '[', ']', '{', '}', '<', '>', '"', '\'', '`', '/', '\\',
    '|', '*', '=', '„', '“', '”', '‚', '‘', '’', '«', '»',
];

/// Deliberately small: dropping a real search term is worse than keeping a filler word.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "of", "for", "with", "to", "und", "oder", "der", "die",
    "das", "mit", "für", "von", "zu",
];

pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| c.is_whitespace() || SEPARATORS.contains(&c))
        .map(|token| token.trim_matches('.'))
        .filter(|token| token.chars().any(char::is_alphanumeric))
        .map(String::from)
        .collect()
}

/// Case-insensitive de-duplication keeping the first spelling seen.
pub fn unique(tokens: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.to_lowercase()))
        .collect()
}

pub fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_on_whitespace_and_punctuation() {
        let tokens = tokenize("Buyer (m/w/d), Einkauf; \"SAP\" - Hamburg.");
        assert_eq!(tokens, vec!["Buyer", "m", "w", "d", "Einkauf", "SAP", "Hamburg"]);
    }

    #[test]
    fn test_tokenize_keeps_technology_spellings() {
        let tokens = tokenize("C++ C# Node.js .NET");
        assert_eq!(tokens, vec!["C++", "C#", "Node.js", "NET"]);
    }

    #[test]
    fn test_unique_keeps_first_spelling() {
        let tokens = unique(vec![
            "Java".to_string(),
            "java".to_string(),
            "Spring".to_string(),
            "JAVA".to_string(),
        ]);
        assert_eq!(tokens, vec!["Java", "Spring"]);
    }

    #[test]
    fn test_stopwords_in_both_languages() {
        assert!(is_stopword("The"));
        assert!(is_stopword("und"));
        assert!(is_stopword("FÜR"));
        assert!(!is_stopword("in"));
        assert!(!is_stopword("Berlin"));
    }
}
