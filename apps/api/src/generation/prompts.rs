// Prompt Builder: one template per query type.
// Shared fragments come from llm_client::prompts.

use crate::llm_client::prompts::{
    INCLUSION_INSTRUCTION, LANGUAGE_INSTRUCTION, SYNTAX_INSTRUCTION,
};
use crate::models::search_request::QueryType;

/// Recruiting template. Replace: {inclusion_instruction}, {syntax_instruction},
/// {language_instruction}, {input_text}
pub const RECRUITING_PROMPT_TEMPLATE: &str = r#"Write a Boolean search string that finds CANDIDATE PROFILES and CVs matching the recruiting brief below.

FOCUS:
- Job titles and their common variants
- Hard skills, technologies, certifications and tools
- Seniority and years of experience
- Location and remote / hybrid options

{inclusion_instruction}

{syntax_instruction}

{language_instruction}

End the query with a clause that restricts results to resumes / CVs.

Reply with the search string ONLY.

RECRUITING BRIEF:
{input_text}"#;

/// Lead generation template. Replace: {inclusion_instruction}, {syntax_instruction},
/// {language_instruction}, {input_text}
pub const LEAD_GENERATION_PROMPT_TEMPLATE: &str = r#"Write a Boolean search string that finds COMPANIES and DECISION MAKERS matching the target description below.

FOCUS:
- Industries, sectors and product categories
- Company attributes: size, legal form, region, growth signals
- Decision-maker titles (e.g. CEO, Managing Director, Head of Purchasing)
- Location and markets served

{inclusion_instruction}

{syntax_instruction}

{language_instruction}

End the query with a clause that restricts results to companies / businesses.

Reply with the search string ONLY.

TARGET DESCRIPTION:
{input_text}"#;

/// Builds the model prompt. The input text is embedded verbatim and inserted
/// last so placeholders inside it are left alone.
pub fn build_prompt(query_type: QueryType, text: &str) -> String {
    let template = match query_type {
        QueryType::Recruiting => RECRUITING_PROMPT_TEMPLATE,
        QueryType::LeadGeneration => LEAD_GENERATION_PROMPT_TEMPLATE,
    };

    template
        .replace("{inclusion_instruction}", INCLUSION_INSTRUCTION)
        .replace("{syntax_instruction}", SYNTAX_INSTRUCTION)
        .replace("{language_instruction}", LANGUAGE_INSTRUCTION)
        .replace("{input_text}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BRIEF: &str = "Senior Java Developer Berlin 5 years Spring Boot";

    #[test]
    fn test_prompt_embeds_text_verbatim() {
        let prompt = build_prompt(QueryType::Recruiting, BRIEF);
        assert!(prompt.ends_with(BRIEF));
        assert!(!prompt.contains('{'), "unfilled placeholder in prompt");
    }

    #[test]
    fn test_templates_differ_by_query_type() {
        let recruiting = build_prompt(QueryType::Recruiting, BRIEF);
        let leads = build_prompt(QueryType::LeadGeneration, BRIEF);
        assert_ne!(recruiting, leads);
        assert!(recruiting.contains("CVs"));
        assert!(leads.contains("DECISION MAKERS"));
        assert!(leads.contains("Industries"));
    }

    #[test]
    fn test_prompt_carries_syntax_and_inclusion_rules() {
        for query_type in [QueryType::Recruiting, QueryType::LeadGeneration] {
            let prompt = build_prompt(query_type, BRIEF);
            assert!(prompt.contains("AND, OR and NOT"));
            assert!(prompt.contains("upper case"));
            assert!(prompt.contains("EVERY significant term"));
            assert!(prompt.contains("synonyms"));
            assert!(prompt.contains("search string ONLY"));
        }
    }

    #[test]
    fn test_placeholders_in_input_are_not_expanded() {
        let prompt = build_prompt(QueryType::Recruiting, "literal {syntax_instruction} text");
        assert!(prompt.ends_with("literal {syntax_instruction} text"));
    }
}
