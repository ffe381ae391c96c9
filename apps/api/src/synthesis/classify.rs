//! Term categorization for longer inputs.
//!
//! Every token lands in exactly one bucket, tested in priority order:
//! job title, skill, location, experience, general.
//! Patterns cover English and German only.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CAPITALIZED: Regex = Regex::new(r"^\p{Lu}\p{Ll}+$").unwrap();

    static ref JOB_TITLE: Regex = Regex::new(
        r"(?i)(manager|engineer|developer|specialist|consultant|analyst|architect|administrator|director|designer|assistant|technician|recruiter|entwickler|spezialist|berater|ingenieur|architekt|leiter|leitung|referent|sachbearbeiter|techniker|kaufmann|kauffrau|assistenz)"
    ).unwrap();

    static ref SKILL: Regex = Regex::new(
        r"(?i)(java|python|typescript|kotlin|golang|rust|php|ruby|swift|scala|c\+\+|c#|\.net|sql|sap|excel|aws|azure|docker|kubernetes|react|angular|spring|linux|salesforce|erp|crm|erfahrung|kenntnisse)"
    ).unwrap();

    static ref LOCATION: Regex = Regex::new(
        r"(?i)(berlin|hamburg|münchen|munich|köln|cologne|frankfurt|stuttgart|düsseldorf|leipzig|dresden|hannover|nürnberg|bremen|dortmund|wien|vienna|zürich|zurich|london|remote|homeoffice|home-office|hybrid|\d+\s*km)"
    ).unwrap();

    static ref EXPERIENCE: Regex = Regex::new(
        r"(?i)(\d+\s*[jy]|senior|junior|^years?$|^jahren?$)"
    ).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    JobTitle,
    Skill,
    Location,
    Experience,
    General,
}

pub fn bucket_for(token: &str) -> Bucket {
    if CAPITALIZED.is_match(token) || JOB_TITLE.is_match(token) {
        Bucket::JobTitle
    } else if SKILL.is_match(token) {
        Bucket::Skill
    } else if LOCATION.is_match(token) {
        Bucket::Location
    } else if EXPERIENCE.is_match(token) {
        Bucket::Experience
    } else {
        Bucket::General
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Buckets {
    pub job_titles: Vec<String>,
    pub skills: Vec<String>,
    pub locations: Vec<String>,
    pub experience: Vec<String>,
    pub general: Vec<String>,
}

impl Buckets {
    /// Non-empty buckets in their fixed output order.
    pub fn groups(&self) -> Vec<&[String]> {
        [
            &self.job_titles,
            &self.skills,
            &self.locations,
            &self.experience,
            &self.general,
        ]
        .into_iter()
        .filter(|bucket| !bucket.is_empty())
        .map(Vec::as_slice)
        .collect()
    }
}

pub fn classify(tokens: &[String]) -> Buckets {
    let mut buckets = Buckets::default();
    for token in tokens {
        let target = match bucket_for(token) {
            Bucket::JobTitle => &mut buckets.job_titles,
            Bucket::Skill => &mut buckets.skills,
            Bucket::Location => &mut buckets.locations,
            Bucket::Experience => &mut buckets.experience,
            Bucket::General => &mut buckets.general,
        };
        target.push(token.clone());
    }
    buckets
}
