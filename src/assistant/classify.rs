use super::types::Intent;

/// A keyword rule: matches when the lower-cased input contains any keyword.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub intent: Intent,
    pub keywords: &'static [&'static str],
}

impl Rule {
    pub fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().any(|k| lower.contains(k))
    }
}

/// Rules in priority order. First match wins; no match is `Intent::Fallback`.
///
/// Matching is plain substring containment, so "hi" also fires inside
/// "this" or "which". Earlier rules win even when a later one is more
/// specific: "thank you for the job info" is a job search.
pub const RULES: [Rule; 6] = [
    Rule {
        intent: Intent::JobSearch,
        keywords: &["job", "find"],
    },
    Rule {
        intent: Intent::CvUpload,
        keywords: &["cv", "resume"],
    },
    Rule {
        intent: Intent::CareerAdvice,
        keywords: &["career", "advice"],
    },
    Rule {
        intent: Intent::Support,
        keywords: &["contact", "support"],
    },
    Rule {
        intent: Intent::Greeting,
        keywords: &["hello", "hi"],
    },
    Rule {
        intent: Intent::Thanks,
        keywords: &["thank"],
    },
];

/// Classify user text into an intent using the keyword rules.
pub fn classify_intent(text: &str) -> Intent {
    let lower = text.to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.matches(&lower))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Fallback)
}

/// Canned reply for user text. Total and pure.
pub fn classify(text: &str) -> &'static str {
    classify_intent(text).response()
}
