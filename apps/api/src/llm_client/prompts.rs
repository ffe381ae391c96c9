// Shared prompt fragments for Boolean query generation.
// Query-type specific templates live in generation::prompts.

/// System prompt that pins the reply to a bare query string.
pub const QUERY_ONLY_SYSTEM: &str = "You are an expert sourcer who writes Boolean search strings. \
    You MUST respond with the search string only. \
    Do NOT include explanations, headings, labels or apologies. \
    Do NOT use markdown code fences.";

/// Every significant input term must make it into the query.
pub const INCLUSION_INSTRUCTION: &str = "\
    CRITICAL: Include EVERY significant term from the input: job titles, skills, tools, \
    industries, locations, seniority and years of experience. \
    Leaving out a term the user supplied is worse than a broad query.";

/// Boolean syntax rules shared by all query types.
pub const SYNTAX_INSTRUCTION: &str = "\
    SYNTAX: Use only the operators AND, OR and NOT, always in upper case. \
    Group alternatives in parentheses. Put every multi-word phrase in double quotes. \
    The output must be a single syntactically valid Boolean expression with balanced \
    parentheses and quotes.";

/// Synonyms follow the language of the input.
pub const LANGUAGE_INSTRUCTION: &str = "\
    LANGUAGE: Detect the language of the input and add common synonyms and spelling \
    variants in that language. For German input also add the usual English equivalents \
    of job titles (e.g. \"Entwickler\" OR \"Developer\").";
