//! Statement Oracle - Deterministic rule checking for debate statements
//!
//! The Statement Oracle checks a statement against fixed keyword tables
//! without ML. It runs the safety gate and the fallacy detector before any
//! external lookup happens, and rewrites factual claims into questions for
//! the knowledge engine.
//!
//! Every table is an ordered list evaluated first-match-wins. Table order is
//! part of the observable behaviour.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Slot in a rewrite template that receives the text after the trigger
pub const SUBJECT_SLOT: &str = "{subject}";

// ============ Core Types ============

/// A single debate claim or topic, captured once and never mutated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Statement {
    pub id: Uuid,
    text: String,
}

impl Statement {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    fn lowered(&self) -> String {
        self.text.to_lowercase()
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BlockReason {
    OffensiveLanguage,
    SensitiveTopic,
}

impl BlockReason {
    /// Short reason label
    pub fn label(&self) -> &'static str {
        match self {
            BlockReason::OffensiveLanguage => "offensive language",
            BlockReason::SensitiveTopic => "sensitive topic, rephrase",
        }
    }

    /// Warning shown to the user instead of proceeding
    pub fn message(&self) -> &'static str {
        match self {
            BlockReason::OffensiveLanguage => {
                "This statement contains offensive language and is not allowed."
            }
            BlockReason::SensitiveTopic => {
                "This topic is highly sensitive. Please rephrase to maintain neutrality."
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SafetyVerdict {
    Allowed,
    Blocked { reason: BlockReason, term: String },
}

impl SafetyVerdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, SafetyVerdict::Blocked { .. })
    }

    pub fn reason(&self) -> Option<BlockReason> {
        match self {
            SafetyVerdict::Allowed => None,
            SafetyVerdict::Blocked { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FallacyCategory {
    Strawman,
    AdHominem,
    FalseCause,
    SlipperySlope,
    HastyGeneralization,
    AppealToEmotion,
    Bandwagon,
    Oversimplification,
}

impl FallacyCategory {
    /// All categories in default table order
    pub const ALL: [FallacyCategory; 8] = [
        FallacyCategory::Strawman,
        FallacyCategory::AdHominem,
        FallacyCategory::FalseCause,
        FallacyCategory::SlipperySlope,
        FallacyCategory::HastyGeneralization,
        FallacyCategory::AppealToEmotion,
        FallacyCategory::Bandwagon,
        FallacyCategory::Oversimplification,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FallacyCategory::Strawman => "Strawman",
            FallacyCategory::AdHominem => "Ad Hominem",
            FallacyCategory::FalseCause => "False Cause",
            FallacyCategory::SlipperySlope => "Slippery Slope",
            FallacyCategory::HastyGeneralization => "Hasty Generalization",
            FallacyCategory::AppealToEmotion => "Appeal to Emotion",
            FallacyCategory::Bandwagon => "Bandwagon",
            FallacyCategory::Oversimplification => "Oversimplification",
        }
    }
}

impl fmt::Display for FallacyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FallacyFinding {
    pub category: FallacyCategory,
    pub explanation: String,
    /// Keyword that triggered the match
    pub keyword: String,
}

impl FallacyFinding {
    pub fn warning(&self) -> String {
        format!(
            "Logical Fallacy Detected: {}\nExplanation: {}",
            self.category, self.explanation
        )
    }
}

/// Question derived from a statement for the knowledge engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    /// Trigger of the rewrite rule that produced the question, `None` for
    /// the generic fallback
    pub trigger: Option<String>,
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum StatementVerdict {
    Clear,
    Blocked(BlockReason),
    Fallacious(FallacyCategory),
}

// ============ Policy Configuration ============

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DebatePolicy {
    pub name: String,
    pub safety: SafetyPolicy,
    pub fallacies: FallacyPolicy,
    pub queries: QueryPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SafetyPolicy {
    pub banned_words: Vec<String>,
    pub sensitive_topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FallacyPolicy {
    pub rules: Vec<FallacyRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallacyRule {
    pub category: FallacyCategory,
    pub keywords: Vec<String>,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryPolicy {
    pub opinion_markers: Vec<String>,
    pub filler_words: Vec<String>,
    pub rewrites: Vec<RewriteRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRule {
    pub trigger: String,
    pub template: String,
}

impl RewriteRule {
    /// Fill the `{subject}` slot, or append the remainder when there is none
    fn render(&self, subject: &str) -> String {
        if self.template.contains(SUBJECT_SLOT) {
            self.template
                .replace(SUBJECT_SLOT, subject)
                .trim_end()
                .to_string()
        } else {
            format!("{}{}", self.template, subject)
        }
    }
}

// ============ Evaluation Results ============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleEvaluation {
    pub statement_id: Uuid,
    pub verdict: StatementVerdict,
    pub rules_checked: Vec<String>,
    pub safety: SafetyVerdict,
    /// `None` when no fallacy matched or the safety gate already blocked
    pub fallacy: Option<FallacyFinding>,
}

// ============ Errors ============

#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Policy parse error: {0}")]
    PolicyParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid regex: {0}")]
    RegexError(#[from] regex::Error),
}

// ============ Oracle Implementation ============

pub struct Oracle {
    policy: DebatePolicy,
}

impl Oracle {
    pub fn new(policy: DebatePolicy) -> Self {
        Self { policy }
    }

    pub fn with_defaults() -> Self {
        Self::new(DebatePolicy::standard())
    }

    pub fn policy(&self) -> &DebatePolicy {
        &self.policy
    }

    /// Run the safety gate and, when it passes, the fallacy detector
    pub fn check_statement(&self, statement: &Statement) -> OracleEvaluation {
        let mut rules_checked = vec![
            "safety_banned_words".to_string(),
            "safety_sensitive_topics".to_string(),
        ];

        let safety = self.check_safety(statement);
        let fallacy = if safety.is_blocked() {
            None
        } else {
            rules_checked.push("fallacy_table".to_string());
            self.detect_fallacy(statement)
        };

        let verdict = match (&safety, &fallacy) {
            (SafetyVerdict::Blocked { reason, .. }, _) => StatementVerdict::Blocked(*reason),
            (SafetyVerdict::Allowed, Some(finding)) => {
                StatementVerdict::Fallacious(finding.category)
            }
            (SafetyVerdict::Allowed, None) => StatementVerdict::Clear,
        };

        OracleEvaluation {
            statement_id: statement.id,
            verdict,
            rules_checked,
            safety,
            fallacy,
        }
    }

    /// Banned words take priority over sensitive topics
    pub fn check_safety(&self, statement: &Statement) -> SafetyVerdict {
        let lowered = statement.lowered();

        if let Some(term) = first_contained(&lowered, &self.policy.safety.banned_words) {
            debug!(term, "statement contains banned word");
            return SafetyVerdict::Blocked {
                reason: BlockReason::OffensiveLanguage,
                term: term.to_string(),
            };
        }

        if let Some(term) = first_contained(&lowered, &self.policy.safety.sensitive_topics) {
            debug!(term, "statement touches sensitive topic");
            return SafetyVerdict::Blocked {
                reason: BlockReason::SensitiveTopic,
                term: term.to_string(),
            };
        }

        SafetyVerdict::Allowed
    }

    pub fn detect_fallacy(&self, statement: &Statement) -> Option<FallacyFinding> {
        let lowered = statement.lowered();

        self.policy.fallacies.rules.iter().find_map(|rule| {
            first_contained(&lowered, &rule.keywords).map(|keyword| FallacyFinding {
                category: rule.category,
                explanation: rule.explanation.clone(),
                keyword: keyword.to_string(),
            })
        })
    }

    /// Rewrite a factual statement into a question.
    ///
    /// Returns `Ok(None)` for opinion-based statements and for statements
    /// that are empty once filler words are removed.
    pub fn normalize_query(&self, statement: &Statement) -> Result<Option<Query>, OracleError> {
        let lowered = statement.text().trim().to_lowercase();

        if let Some(marker) = first_contained(&lowered, &self.policy.queries.opinion_markers) {
            debug!(marker, "opinion marker found, statement is not fact-checkable");
            return Ok(None);
        }

        let cleaned = self.strip_fillers(&lowered)?;
        if cleaned.is_empty() {
            return Ok(None);
        }

        // Triggers are matched as written, so one containing a filler word
        // never matches the cleaned statement
        for rule in &self.policy.queries.rewrites {
            let trigger = rule.trigger.to_lowercase();
            if trigger.trim().is_empty() {
                continue;
            }
            if let Some((_, remainder)) = cleaned.rsplit_once(trigger.as_str()) {
                return Ok(Some(Query {
                    text: rule.render(remainder.trim()),
                    trigger: Some(rule.trigger.clone()),
                }));
            }
        }

        Ok(Some(Query {
            text: format!("What is {}?", cleaned),
            trigger: None,
        }))
    }

    fn strip_fillers(&self, text: &str) -> Result<String, OracleError> {
        let fillers = &self.policy.queries.filler_words;
        if fillers.is_empty() {
            return Ok(collapse_whitespace(text));
        }

        let alternation = fillers
            .iter()
            .map(|w| regex::escape(&w.to_lowercase()))
            .collect::<Vec<_>>()
            .join("|");
        let re = Regex::new(&format!(r"\b(?:{})\b", alternation))?;
        Ok(collapse_whitespace(&re.replace_all(text, "")))
    }
}

impl Default for Oracle {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn first_contained<'a>(haystack: &str, needles: &'a [String]) -> Option<&'a str> {
    needles
        .iter()
        .find(|n| haystack.contains(&n.to_lowercase()))
        .map(String::as_str)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ============ Policy Loading ============

impl DebatePolicy {
    pub fn from_json(json: &str) -> Result<Self, OracleError> {
        let policy: DebatePolicy =
            serde_json::from_str(json).map_err(|e| OracleError::PolicyParseError(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_file(path: &Path) -> Result<Self, OracleError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Reject tables that would match everything or never match
    pub fn validate(&self) -> Result<(), OracleError> {
        let all_terms = self
            .safety
            .banned_words
            .iter()
            .chain(&self.safety.sensitive_topics)
            .chain(&self.queries.opinion_markers)
            .chain(&self.queries.filler_words)
            .chain(self.fallacies.rules.iter().flat_map(|r| &r.keywords));
        if all_terms.into_iter().any(|t| t.trim().is_empty()) {
            return Err(OracleError::PolicyParseError(
                "empty keyword in policy tables".to_string(),
            ));
        }

        let mut seen = Vec::new();
        for rule in &self.fallacies.rules {
            if rule.keywords.is_empty() {
                return Err(OracleError::PolicyParseError(format!(
                    "fallacy rule {} has no keywords",
                    rule.category
                )));
            }
            if seen.contains(&rule.category) {
                return Err(OracleError::PolicyParseError(format!(
                    "fallacy rule {} listed twice",
                    rule.category
                )));
            }
            seen.push(rule.category);
        }

        if let Some(rule) = self.queries.rewrites.iter().find(|r| r.trigger.trim().is_empty()) {
            return Err(OracleError::PolicyParseError(format!(
                "rewrite rule with template \"{}\" has an empty trigger",
                rule.template
            )));
        }

        Ok(())
    }
}

// ============ Default Policy ============

fn terms(list: &[&str]) -> Vec<String> {
    list.iter().map(|t| t.to_string()).collect()
}

impl DebatePolicy {
    /// Default tables of the debate assistant
    pub fn standard() -> Self {
        Self {
            name: "Standard Debate Policy".to_string(),
            safety: SafetyPolicy {
                banned_words: terms(&["ugly", "disgusting", "unhygienic", "hate", "kill", "racist"]),
                sensitive_topics: terms(&["religion", "ethnicity", "genocide", "violence"]),
            },
            fallacies: FallacyPolicy {
                rules: vec![
                    FallacyRule {
                        category: FallacyCategory::Strawman,
                        keywords: terms(&["misrepresents", "distorts", "twists words"]),
                        explanation: "This misrepresents an opponent’s position to make it easier to attack."
                            .to_string(),
                    },
                    FallacyRule {
                        category: FallacyCategory::AdHominem,
                        keywords: terms(&["attacks the person", "personal attack"]),
                        explanation: "This attacks the character of the opponent instead of addressing their argument."
                            .to_string(),
                    },
                    FallacyRule {
                        category: FallacyCategory::FalseCause,
                        keywords: terms(&["correlation", "causation", "because of"]),
                        explanation: "This assumes that because one event follows another, the first caused the second."
                            .to_string(),
                    },
                    FallacyRule {
                        category: FallacyCategory::SlipperySlope,
                        keywords: terms(&["leads to", "escalates", "domino effect"]),
                        explanation: "This assumes that taking one step will inevitably lead to extreme consequences."
                            .to_string(),
                    },
                    FallacyRule {
                        category: FallacyCategory::HastyGeneralization,
                        keywords: terms(&["all", "always", "never", "everyone", "nobody"]),
                        explanation: "This draws a broad conclusion based on insufficient evidence."
                            .to_string(),
                    },
                    FallacyRule {
                        category: FallacyCategory::AppealToEmotion,
                        keywords: terms(&["fear", "sympathy", "pity", "imagine"]),
                        explanation: "This manipulates emotions instead of using logic to argue a point."
                            .to_string(),
                    },
                    FallacyRule {
                        category: FallacyCategory::Bandwagon,
                        keywords: terms(&["everyone agrees", "most people believe", "popular opinion"]),
                        explanation: "This assumes a claim is true simply because many people believe it."
                            .to_string(),
                    },
                    FallacyRule {
                        category: FallacyCategory::Oversimplification,
                        keywords: terms(&[
                            "only reason",
                            "single cause",
                            "the solution is simple",
                            "will solve",
                        ]),
                        explanation: "This reduces a complex issue to an overly simple cause or solution."
                            .to_string(),
                    },
                ],
            },
            queries: QueryPolicy {
                opinion_markers: terms(&["should", "better than", "want to", "just"]),
                filler_words: terms(&["is", "the", "a", "an"]),
                rewrites: [
                    ("currency of", "What is the official currency of {subject}"),
                    ("prime minister of", "Who is the current Prime Minister of {subject}"),
                    ("president of", "Who is the current President of {subject}"),
                    ("capital of", "What is the capital of {subject}"),
                    ("ceo of", "Who is the CEO of {subject}"),
                    ("largest ocean", "What is the largest ocean on Earth?"),
                    ("gravity on", "What is the gravity on {subject}"),
                    ("age of the universe", "What is the estimated age of the universe?"),
                    ("nuclear power", "Is it a nuclear power?"),
                ]
                .iter()
                .map(|(trigger, template)| RewriteRule {
                    trigger: trigger.to_string(),
                    template: template.to_string(),
                })
                .collect(),
            },
        }
    }
}

// ============ Tests ============

#[cfg(test)]
mod tests {
    use super::*;

    fn oracle() -> Oracle {
        Oracle::with_defaults()
    }

    fn query_text(statement: &str) -> Option<String> {
        oracle()
            .normalize_query(&Statement::new(statement))
            .unwrap()
            .map(|q| q.text)
    }

    #[test]
    fn test_banned_word_blocks() {
        let verdict = oracle().check_safety(&Statement::new("That argument is DISGUSTING"));
        assert_eq!(
            verdict,
            SafetyVerdict::Blocked {
                reason: BlockReason::OffensiveLanguage,
                term: "disgusting".to_string(),
            }
        );
    }

    #[test]
    fn test_banned_word_wins_over_sensitive_topic() {
        let verdict = oracle().check_safety(&Statement::new("I hate debates about religion"));
        assert_eq!(verdict.reason(), Some(BlockReason::OffensiveLanguage));
    }

    #[test]
    fn test_sensitive_topic_blocks() {
        let verdict = oracle().check_safety(&Statement::new("Violence in video games"));
        assert_eq!(verdict.reason(), Some(BlockReason::SensitiveTopic));
        assert_eq!(
            BlockReason::SensitiveTopic.message(),
            "This topic is highly sensitive. Please rephrase to maintain neutrality."
        );
    }

    #[test]
    fn test_neutral_statement_allowed() {
        let verdict = oracle().check_safety(&Statement::new("Paris is the capital of France"));
        assert_eq!(verdict, SafetyVerdict::Allowed);
    }

    #[test]
    fn test_oversimplification_scenario() {
        let finding = oracle()
            .detect_fallacy(&Statement::new("Banning cars will solve climate change"))
            .unwrap();
        assert_eq!(finding.category, FallacyCategory::Oversimplification);
        assert_eq!(
            finding.explanation,
            "This reduces a complex issue to an overly simple cause or solution."
        );
    }

    #[test]
    fn test_first_category_in_table_wins() {
        // "leads to" (Slippery Slope), "everyone" (Hasty Generalization) and
        // "everyone agrees" (Bandwagon) all match
        let finding = oracle()
            .detect_fallacy(&Statement::new("Everyone agrees this leads to ruin"))
            .unwrap();
        assert_eq!(finding.category, FallacyCategory::SlipperySlope);

        let finding = oracle()
            .detect_fallacy(&Statement::new("Everyone agrees that this policy is the best."))
            .unwrap();
        assert_eq!(finding.category, FallacyCategory::HastyGeneralization);
    }

    #[test]
    fn test_reordered_table_changes_winner() {
        let mut policy = DebatePolicy::standard();
        policy.fallacies.rules.reverse();
        let oracle = Oracle::new(policy);

        let finding = oracle
            .detect_fallacy(&Statement::new("Everyone agrees that this policy is the best."))
            .unwrap();
        assert_eq!(finding.category, FallacyCategory::Bandwagon);
    }

    #[test]
    fn test_standard_table_order() {
        let categories: Vec<FallacyCategory> = DebatePolicy::standard()
            .fallacies
            .rules
            .iter()
            .map(|r| r.category)
            .collect();
        assert_eq!(categories, FallacyCategory::ALL.to_vec());
    }

    #[test]
    fn test_fallacy_detection_is_idempotent() {
        let oracle = oracle();
        let statement = Statement::new("People from city X are always rude");
        let first = oracle.detect_fallacy(&statement);
        let second = oracle.detect_fallacy(&statement);
        assert_eq!(first, second);
        assert_eq!(
            first.map(|f| f.category),
            Some(FallacyCategory::HastyGeneralization)
        );
    }

    #[test]
    fn test_no_fallacy() {
        assert!(oracle()
            .detect_fallacy(&Statement::new("Elon Musk is the CEO of Tesla"))
            .is_none());
    }

    #[test]
    fn test_capital_of_france_query() {
        assert_eq!(
            query_text("Paris is the capital of France").as_deref(),
            Some("What is the capital of france")
        );
    }

    #[test]
    fn test_opinion_markers_yield_no_query() {
        for statement in [
            "AI should replace human teachers",
            "Cats are better than dogs",
            "People who want to protect forests",
            "It is just a phase",
        ] {
            assert_eq!(query_text(statement), None, "{statement}");
        }
    }

    #[test]
    fn test_rewrite_rules() {
        assert_eq!(
            query_text("Narendra Modi is the Prime Minister of India").as_deref(),
            Some("Who is the current Prime Minister of india")
        );
        assert_eq!(
            query_text("Gravity on Mars").as_deref(),
            Some("What is the gravity on mars")
        );
        assert_eq!(
            query_text("Largest ocean on Earth").as_deref(),
            Some("What is the largest ocean on Earth?on earth")
        );
        assert_eq!(
            query_text("India is a nuclear power").as_deref(),
            Some("Is it a nuclear power?")
        );
    }

    #[test]
    fn test_slotless_template_appends_remainder() {
        let query = oracle()
            .normalize_query(&Statement::new("Brazil has nuclear power plants"))
            .unwrap()
            .unwrap();
        assert_eq!(query.text, "Is it a nuclear power?plants");
        assert_eq!(query.trigger.as_deref(), Some("nuclear power"));
    }

    #[test]
    fn test_trigger_with_filler_word_never_matches() {
        let query = oracle()
            .normalize_query(&Statement::new("Age of the universe"))
            .unwrap()
            .unwrap();
        assert_eq!(query.text, "What is age of universe?");
        assert_eq!(query.trigger, None);
    }

    #[test]
    fn test_strawman_explanation_text() {
        let finding = oracle()
            .detect_fallacy(&Statement::new("My opponent distorts the facts"))
            .unwrap();
        assert_eq!(finding.category, FallacyCategory::Strawman);
        assert_eq!(
            finding.explanation,
            "This misrepresents an opponent\u{2019}s position to make it easier to attack."
        );
    }

    #[test]
    fn test_first_rewrite_wins() {
        // "currency of" precedes "capital of" in the table
        assert_eq!(
            query_text("The capital of the currency of Japan").as_deref(),
            Some("What is the official currency of japan")
        );
    }

    #[test]
    fn test_generic_fallback_query() {
        let query = oracle()
            .normalize_query(&Statement::new("The boiling point of water"))
            .unwrap()
            .unwrap();
        assert_eq!(query.text, "What is boiling point of water?");
        assert!(query.trigger.is_none());
    }

    #[test]
    fn test_filler_only_statement_yields_no_query() {
        assert_eq!(query_text("  The  a an is "), None);
        assert_eq!(query_text(""), None);
    }

    #[test]
    fn test_check_statement_short_circuits_on_safety() {
        let eval = oracle().check_statement(&Statement::new("Racist jokes always offend"));
        assert_eq!(
            eval.verdict,
            StatementVerdict::Blocked(BlockReason::OffensiveLanguage)
        );
        assert!(eval.fallacy.is_none());
        assert!(!eval.rules_checked.contains(&"fallacy_table".to_string()));
    }

    #[test]
    fn test_check_statement_clear() {
        let eval = oracle().check_statement(&Statement::new("The currency of India is rupees"));
        assert_eq!(eval.verdict, StatementVerdict::Clear);
        assert_eq!(eval.rules_checked.len(), 3);
    }

    #[test]
    fn test_policy_rejects_empty_keyword() {
        let mut policy = DebatePolicy::standard();
        policy.fallacies.rules[0].keywords.push(" ".to_string());
        assert!(matches!(
            policy.validate(),
            Err(OracleError::PolicyParseError(_))
        ));
    }

    #[test]
    fn test_policy_rejects_duplicate_category() {
        let mut policy = DebatePolicy::standard();
        let duplicate = policy.fallacies.rules[0].clone();
        policy.fallacies.rules.push(duplicate);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_custom_policy_from_json() {
        let json = r#"{
            "name": "Classroom",
            "safety": { "banned_words": ["stupid"], "sensitive_topics": [] },
            "fallacies": { "rules": [] },
            "queries": { "opinion_markers": [], "filler_words": [], "rewrites": [] }
        }"#;
        let oracle = Oracle::new(DebatePolicy::from_json(json).unwrap());

        assert!(oracle
            .check_safety(&Statement::new("That is a stupid idea"))
            .is_blocked());
        assert!(oracle
            .detect_fallacy(&Statement::new("Everyone agrees"))
            .is_none());
        assert_eq!(
            oracle
                .normalize_query(&Statement::new("The speed of light"))
                .unwrap()
                .map(|q| q.text)
                .as_deref(),
            Some("What is the speed of light?")
        );
    }

    #[test]
    fn test_malformed_policy_json() {
        assert!(matches!(
            DebatePolicy::from_json("{ not json"),
            Err(OracleError::PolicyParseError(_))
        ));
    }
}
