/// Languages the fallback synthesizer distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    German,
}

const GERMAN_MARKERS: &[&str] = &[
    "und", "oder", "der", "die", "das", "den", "dem", "mit", "für", "wir", "sie", "ist", "sind",
    "ein", "eine", "bei", "im", "zur", "zum", "auf", "suchen", "unser", "unsere",
];

/// German if any token is a common German function word, English otherwise.
pub fn detect(tokens: &[String]) -> Language {
    let german = tokens
        .iter()
        .any(|token| GERMAN_MARKERS.contains(&token.to_lowercase().as_str()));
    if german {
        Language::German
    } else {
        Language::English
    }
}
