//! Fallback Query Synthesizer.
//!
//! Used whenever the language model is not configured or fails. Pure function
//! of (text, query type): no randomness, no I/O. Every token that survives
//! stopword removal appears quoted in the output.

mod classify;
mod language;
mod tokens;

use language::Language;

use crate::models::search_request::QueryType;

/// Inputs with at most this many filtered tokens become a single OR-group.
pub const SHORT_INPUT_MAX_TOKENS: usize = 10;

pub fn synthesize(text: &str, query_type: QueryType) -> String {
    let unique = tokens::unique(tokens::tokenize(text));
    let language = language::detect(&unique);
    let terms: Vec<String> = unique
        .into_iter()
        .filter(|token| !tokens::is_stopword(token))
        .collect();

    let body = if terms.len() <= SHORT_INPUT_MAX_TOKENS {
        or_group(&terms)
    } else {
        let buckets = classify::classify(&terms);
        let groups: Vec<String> = buckets
            .groups()
            .into_iter()
            .filter_map(or_group)
            .collect();
        if groups.is_empty() {
            or_group(&terms)
        } else {
            Some(groups.join(" AND "))
        }
    };

    let closing = closing_clause(query_type, language);
    match body {
        Some(body) => format!("{body} AND {closing}"),
        None => closing,
    }
}

fn quote(term: &str) -> String {
    format!("\"{term}\"")
}

fn or_group(terms: &[String]) -> Option<String> {
    if terms.is_empty() {
        return None;
    }
    let quoted: Vec<String> = terms.iter().map(|t| quote(t)).collect();
    Some(format!("({})", quoted.join(" OR ")))
}

/// Restricts results to CVs (recruiting) or companies (lead generation).
fn closing_clause(query_type: QueryType, language: Language) -> String {
    let terms: &[&str] = match (query_type, language) {
        (QueryType::Recruiting, Language::English) => &["Resume", "CV"],
        (QueryType::Recruiting, Language::German) => &["Lebenslauf", "CV"],
        (QueryType::LeadGeneration, Language::English) => &["Company", "Business"],
        (QueryType::LeadGeneration, Language::German) => &["Unternehmen", "Firma"],
    };
    let quoted: Vec<String> = terms.iter().map(|t| quote(t)).collect();
    format!("({})", quoted.join(" OR "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_INPUT: &str = "senior java developer in berlin with 5y experience, \
        kubernetes docker remote 50km Teamplayer communication";

    #[test]
    fn test_short_input_is_single_or_group() {
        let query = synthesize(
            "Senior Java Developer Berlin 5 years Spring Boot",
            QueryType::Recruiting,
        );
        assert_eq!(
            query,
            r#"("Senior" OR "Java" OR "Developer" OR "Berlin" OR "5" OR "years" OR "Spring" OR "Boot") AND ("Resume" OR "CV")"#
        );
    }

    #[test]
    fn test_long_input_groups_buckets_in_order() {
        let query = synthesize(LONG_INPUT, QueryType::Recruiting);
        assert_eq!(
            query,
            concat!(
                r#"("developer" OR "Teamplayer") AND "#,
                r#"("java" OR "kubernetes" OR "docker") AND "#,
                r#"("berlin" OR "remote" OR "50km") AND "#,
                r#"("senior" OR "5y") AND "#,
                r#"("in" OR "experience" OR "communication") AND "#,
                r#"("Resume" OR "CV")"#
            )
        );
    }

    #[test]
    fn test_synthesis_is_deterministic() {
        let first = synthesize(LONG_INPUT, QueryType::LeadGeneration);
        for _ in 0..10 {
            assert_eq!(synthesize(LONG_INPUT, QueryType::LeadGeneration), first);
        }
    }

    #[test]
    fn test_every_filtered_token_is_included() {
        let text = "Wir suchen einen erfahrenen SAP-Berater für Logistik und Einkauf \
            in München oder remote, mindestens 5 Jahre Erfahrung mit S/4HANA, \
            Reisebereitschaft 30%, Führerschein Klasse B";
        let query = synthesize(text, QueryType::Recruiting);
        let terms: Vec<String> = tokens::unique(tokens::tokenize(text))
            .into_iter()
            .filter(|t| !tokens::is_stopword(t))
            .collect();
        assert!(terms.len() > SHORT_INPUT_MAX_TOKENS);
        for term in terms {
            assert!(query.contains(&quote(&term)), "{term} missing from {query}");
        }
    }

    #[test]
    fn test_stopwords_and_duplicates_are_dropped() {
        let query = synthesize("The Java and the java OR Kotlin", QueryType::Recruiting);
        assert_eq!(query, r#"("Java" OR "Kotlin") AND ("Resume" OR "CV")"#);
    }

    #[test]
    fn test_german_closing_clauses() {
        let text = "Wir suchen Vertriebsleiter mit Erfahrung im Maschinenbau";
        assert!(synthesize(text, QueryType::Recruiting).ends_with(r#"AND ("Lebenslauf" OR "CV")"#));
        assert!(synthesize(text, QueryType::LeadGeneration)
            .ends_with(r#"AND ("Unternehmen" OR "Firma")"#));
    }

    #[test]
    fn test_english_lead_generation_closing_clause() {
        let query = synthesize("logistics providers near Rotterdam port", QueryType::LeadGeneration);
        assert_eq!(
            query,
            r#"("logistics" OR "providers" OR "near" OR "Rotterdam" OR "port") AND ("Company" OR "Business")"#
        );
    }

    #[test]
    fn test_only_stopwords_yields_closing_clause() {
        assert_eq!(
            synthesize("and or the, und oder der", QueryType::Recruiting),
            r#"("Lebenslauf" OR "CV")"#
        );
    }

    #[test]
    fn test_title_and_skill_token_is_not_duplicated() {
        let text = "java-engineer python golang docker aws azure linux sql react angular spring";
        let query = synthesize(text, QueryType::Recruiting);
        assert_eq!(query.matches("\"java-engineer\"").count(), 1);
        assert!(query.starts_with(r#"("java-engineer") AND ("python""#));
    }
}
