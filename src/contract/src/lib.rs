// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (C) 2025 Jonathan D.A. Jewell

//! Debate Contract - Testable specification for debate pipeline decisions
//!
//! This module defines the complete contract for the debate pipeline:
//! - **Inputs**: What the pipeline receives (`DebateRequest`)
//! - **Outputs**: What the pipeline returns (`PipelineDecision`)
//! - **Refusal Taxonomy**: Categorization of every way a statement is stopped
//! - **Audit Log Format**: Structured logging for debugging
//! - **Argument Composer**: Prompt assembly and rhetorical framings
//!
//! Control flows strictly forward: safety gate, fallacy detector, query
//! normalizer, evidence gatherer, argument composer. A gate failure ends the
//! request with a decision, never an error. Only generation failures (and a
//! missing capability) surface as `ContractError`.

use chrono::{DateTime, Utc};
use evidence_gatherer::{EvidenceBundle, EvidenceGatherer, FactCheck, OPINION_NOTICE};
use serde::{Deserialize, Serialize};
use statement_oracle::{
    BlockReason, FallacyCategory, FallacyFinding, Oracle, OracleError, OracleEvaluation, Query,
    SafetyVerdict, Statement,
};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use text_generator::{DecodingConfig, GenerationError, TextGenerator};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

// ============================================================================
// CONTRACT VERSION
// ============================================================================

/// Contract version for compatibility checking
pub const CONTRACT_VERSION: &str = "0.1.0";

/// Contract schema identifier
pub const CONTRACT_SCHEMA: &str = "debate-pipeline-contract-v1";

// ============================================================================
// INPUTS - What the pipeline receives
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Position {
    Pro,
    Con,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Position::Pro => "Pro",
            Position::Con => "Con",
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Stage {
    Opening,
    Counterargument,
    Rebuttal,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Opening => "Opening",
            Stage::Counterargument => "Counterargument",
            Stage::Rebuttal => "Rebuttal",
        })
    }
}

/// What the caller wants done with the statement or topic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RequestMode {
    /// Gates and query normalization only, no external calls
    Screen { statement: String },

    /// Gates, then ethos/pathos/logos framings without evidence
    Rhetoric { statement: String },

    /// Gates, then a fact check against the knowledge engine
    Verify { statement: String },

    /// Verify, then the three framings, each with its own fact check
    Debate { statement: String },

    /// Generate an argument from topic, position and stage
    Argue {
        topic: String,
        position: Position,
        stage: Stage,
    },

    /// Gather evidence for a topic and generate a reply from it
    Chat { topic: String },
}

impl RequestMode {
    /// The text that passes through the gates
    pub fn subject(&self) -> &str {
        match self {
            RequestMode::Screen { statement }
            | RequestMode::Rhetoric { statement }
            | RequestMode::Verify { statement }
            | RequestMode::Debate { statement } => statement,
            RequestMode::Argue { topic, .. } | RequestMode::Chat { topic } => topic,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RequestMode::Screen { .. } => "screen",
            RequestMode::Rhetoric { .. } => "rhetoric",
            RequestMode::Verify { .. } => "verify",
            RequestMode::Debate { .. } => "debate",
            RequestMode::Argue { .. } => "argue",
            RequestMode::Chat { .. } => "chat",
        }
    }
}

/// Context surrounding the request
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequestContext {
    /// Source of the request (e.g., "cli", "cli-chat")
    pub source: String,

    /// Chat session identifier
    pub session_id: Option<String>,

    /// Custom metadata key-value pairs
    pub metadata: HashMap<String, String>,
}

/// Complete pipeline request - the primary input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRequest {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mode: RequestMode,
    pub context: RequestContext,
}

impl DebateRequest {
    pub fn new(mode: RequestMode) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            mode,
            context: RequestContext::default(),
        }
    }

    /// Builder: set request context
    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

// ============================================================================
// OUTPUTS - What the pipeline returns
// ============================================================================

/// Complete pipeline decision - the primary output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDecision {
    /// Original request ID for correlation
    pub request_id: Uuid,

    pub decision_id: Uuid,

    pub timestamp: DateTime<Utc>,

    pub verdict: Verdict,

    /// Refusal details (if verdict is not Allow)
    pub refusal: Option<Refusal>,

    /// Results from each stage that ran
    pub evaluations: EvaluationChain,

    /// Text shown to the user when the pipeline got far enough to produce one
    pub output: Option<String>,

    pub processing: ProcessingMetadata,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Verdict {
    /// Statement went through the whole pipeline
    Allow,

    /// Statement went through, but could not be fact-checked
    Warn,

    /// Statement was stopped by a gate
    Block,
}

impl Verdict {
    /// Convert to exit code for CLI usage
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Allow => 0,
            Verdict::Block => 1,
            Verdict::Warn => 2,
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow | Verdict::Warn)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Allow => "ALLOW",
            Verdict::Warn => "WARN",
            Verdict::Block => "BLOCK",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvaluationChain {
    /// Safety gate and fallacy detector
    pub oracle: Option<OracleEvaluation>,

    pub query: Option<Query>,

    /// Every fact check performed, in order
    pub fact_checks: Vec<FactCheck>,

    pub evidence: Option<EvidenceBundle>,

    /// Evidence sources that failed and were replaced by fallback text
    pub degraded_sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Processing duration in microseconds
    pub duration_us: u64,

    pub contract_version: String,

    pub policy_name: String,

    pub rules_checked: usize,

    pub stages_executed: Vec<String>,
}

// ============================================================================
// REFUSAL TAXONOMY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refusal {
    pub category: RefusalCategory,

    /// Specific refusal code for programmatic handling
    pub code: RefusalCode,

    /// Human-readable message
    pub message: String,

    pub remediation: Option<String>,

    /// Term or keyword that triggered the refusal
    pub matched: Option<String>,

    /// Whether the pipeline still produced output
    pub overridable: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RefusalCategory {
    // === Safety gate ===
    OffensiveLanguage,
    SensitiveTopic,

    // === Fallacy detector ===
    LogicalFallacy,

    // === Query normalizer ===
    /// Opinion marker found, nothing to fact-check
    SubjectiveClaim,

    // === System ===
    InvalidRequest,
}

impl RefusalCategory {
    pub fn display_name(&self) -> &'static str {
        match self {
            RefusalCategory::OffensiveLanguage => "Offensive Language",
            RefusalCategory::SensitiveTopic => "Sensitive Topic",
            RefusalCategory::LogicalFallacy => "Logical Fallacy",
            RefusalCategory::SubjectiveClaim => "Subjective Claim",
            RefusalCategory::InvalidRequest => "Invalid Request",
        }
    }

    /// Hard refusals block the statement; soft ones only warn
    pub fn is_hard(&self) -> bool {
        !matches!(self, RefusalCategory::SubjectiveClaim)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RefusalCode {
    // Safety codes (1xx)
    Safety100OffensiveLanguage,
    Safety101SensitiveTopic,

    // Fallacy codes (2xx), in detector table order
    Fallacy200Strawman,
    Fallacy201AdHominem,
    Fallacy202FalseCause,
    Fallacy203SlipperySlope,
    Fallacy204HastyGeneralization,
    Fallacy205AppealToEmotion,
    Fallacy206Bandwagon,
    Fallacy207Oversimplification,

    // Query codes (3xx)
    Query300OpinionMarker,

    // System codes (9xx)
    Sys900EmptyStatement,
}

impl RefusalCode {
    /// Numeric code for logging
    pub fn numeric(&self) -> u16 {
        match self {
            RefusalCode::Safety100OffensiveLanguage => 100,
            RefusalCode::Safety101SensitiveTopic => 101,
            RefusalCode::Fallacy200Strawman => 200,
            RefusalCode::Fallacy201AdHominem => 201,
            RefusalCode::Fallacy202FalseCause => 202,
            RefusalCode::Fallacy203SlipperySlope => 203,
            RefusalCode::Fallacy204HastyGeneralization => 204,
            RefusalCode::Fallacy205AppealToEmotion => 205,
            RefusalCode::Fallacy206Bandwagon => 206,
            RefusalCode::Fallacy207Oversimplification => 207,
            RefusalCode::Query300OpinionMarker => 300,
            RefusalCode::Sys900EmptyStatement => 900,
        }
    }

    pub fn for_block(reason: BlockReason) -> Self {
        match reason {
            BlockReason::OffensiveLanguage => RefusalCode::Safety100OffensiveLanguage,
            BlockReason::SensitiveTopic => RefusalCode::Safety101SensitiveTopic,
        }
    }

    pub fn for_fallacy(category: FallacyCategory) -> Self {
        match category {
            FallacyCategory::Strawman => RefusalCode::Fallacy200Strawman,
            FallacyCategory::AdHominem => RefusalCode::Fallacy201AdHominem,
            FallacyCategory::FalseCause => RefusalCode::Fallacy202FalseCause,
            FallacyCategory::SlipperySlope => RefusalCode::Fallacy203SlipperySlope,
            FallacyCategory::HastyGeneralization => RefusalCode::Fallacy204HastyGeneralization,
            FallacyCategory::AppealToEmotion => RefusalCode::Fallacy205AppealToEmotion,
            FallacyCategory::Bandwagon => RefusalCode::Fallacy206Bandwagon,
            FallacyCategory::Oversimplification => RefusalCode::Fallacy207Oversimplification,
        }
    }
}

impl Refusal {
    /// Refusal for a blocked or fallacious oracle evaluation
    pub fn from_oracle(eval: &OracleEvaluation) -> Option<Self> {
        if let SafetyVerdict::Blocked { reason, term } = &eval.safety {
            return Some(Self::safety(*reason, term));
        }
        eval.fallacy.as_ref().map(Self::fallacy)
    }

    fn safety(reason: BlockReason, term: &str) -> Self {
        let category = match reason {
            BlockReason::OffensiveLanguage => RefusalCategory::OffensiveLanguage,
            BlockReason::SensitiveTopic => RefusalCategory::SensitiveTopic,
        };
        Self {
            category,
            code: RefusalCode::for_block(reason),
            message: reason.message().to_string(),
            remediation: None,
            matched: Some(term.to_string()),
            overridable: false,
        }
    }

    fn fallacy(finding: &FallacyFinding) -> Self {
        Self {
            category: RefusalCategory::LogicalFallacy,
            code: RefusalCode::for_fallacy(finding.category),
            message: finding.warning(),
            remediation: Some("Please revise your argument.".to_string()),
            matched: Some(finding.keyword.clone()),
            overridable: false,
        }
    }

    pub fn subjective() -> Self {
        Self {
            category: RefusalCategory::SubjectiveClaim,
            code: RefusalCode::Query300OpinionMarker,
            message: OPINION_NOTICE.to_string(),
            remediation: Some("Rephrase as a factual claim to fact-check it.".to_string()),
            matched: None,
            overridable: true,
        }
    }

    fn empty_statement() -> Self {
        Self {
            category: RefusalCategory::InvalidRequest,
            code: RefusalCode::Sys900EmptyStatement,
            message: "Enter a debate statement or topic.".to_string(),
            remediation: None,
            matched: None,
            overridable: false,
        }
    }
}

// ============================================================================
// AUDIT LOG FORMAT
// ============================================================================

/// Audit log entry for every pipeline decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub schema: String,
    pub audit_id: Uuid,
    pub request_id: Uuid,
    pub decision_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub mode: String,
    pub verdict: Verdict,
    pub refusal_code: Option<u16>,
    pub refusal_category: Option<RefusalCategory>,
    pub source: String,
    pub session_id: Option<String>,
    pub rules_checked: Vec<String>,
    pub stages: Vec<String>,
    pub degraded_sources: Vec<String>,
    pub duration_us: u64,
    pub contract_version: String,

    /// Hash of the statement (for correlation without storing it)
    pub content_hash: String,
}

impl AuditEntry {
    pub fn from_decision(request: &DebateRequest, decision: &PipelineDecision) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        request.mode.subject().hash(&mut hasher);
        let content_hash = format!("{:016x}", hasher.finish());

        Self {
            schema: CONTRACT_SCHEMA.to_string(),
            audit_id: Uuid::new_v4(),
            request_id: request.request_id,
            decision_id: decision.decision_id,
            timestamp: Utc::now(),
            mode: request.mode.name().to_string(),
            verdict: decision.verdict,
            refusal_code: decision.refusal.as_ref().map(|r| r.code.numeric()),
            refusal_category: decision.refusal.as_ref().map(|r| r.category),
            source: request.context.source.clone(),
            session_id: request.context.session_id.clone(),
            rules_checked: decision
                .evaluations
                .oracle
                .as_ref()
                .map(|o| o.rules_checked.clone())
                .unwrap_or_default(),
            stages: decision.processing.stages_executed.clone(),
            degraded_sources: decision.evaluations.degraded_sources.clone(),
            duration_us: decision.processing.duration_us,
            contract_version: CONTRACT_VERSION.to_string(),
            content_hash,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// CONTRACT ERRORS
// ============================================================================

#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Oracle error: {0}")]
    OracleError(#[from] OracleError),

    #[error("Generation failed: {0}")]
    GenerationError(#[from] GenerationError),

    #[error("No {0} configured for this request")]
    MissingCapability(&'static str),
}

// ============================================================================
// ARGUMENT COMPOSER
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Appeal {
    Ethos,
    Pathos,
    Logos,
}

impl Appeal {
    pub const ALL: [Appeal; 3] = [Appeal::Ethos, Appeal::Pathos, Appeal::Logos];

    pub fn frame(&self, statement: &str) -> String {
        match self {
            Appeal::Ethos => format!("Ethos: As experts suggest, {}", statement),
            Appeal::Pathos => format!("Pathos: Imagine the impact\u{2014}{}", statement),
            Appeal::Logos => format!("Logos: Statistically, {}", statement),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RhetoricalFraming {
    pub appeal: Appeal,
    pub text: String,
}

pub struct ArgumentComposer;

impl ArgumentComposer {
    pub fn basic_prompt(topic: &str, position: Position, stage: Stage) -> String {
        format!(
            "Debate Topic: {}\nPosition: {}\nStage: {}\nArgument:\n",
            topic, position, stage
        )
    }

    pub fn chat_prompt(topic: &str, evidence: &EvidenceBundle) -> String {
        format!(
            "\nDebate Topic: {topic}\nCollected Evidence:\n{evidence}\n\n\
             Generate a compelling argument that:\n\
             1. Clearly presents the **position**\n\
             2. Uses **factual evidence** for support\n\
             3. Refutes **opposing arguments**\n\
             4. Ends with a **strong conclusion**\n\n\
             **Debate Response:**"
        )
    }

    pub fn framings(statement: &str) -> Vec<RhetoricalFraming> {
        Appeal::ALL
            .iter()
            .map(|appeal| RhetoricalFraming {
                appeal: *appeal,
                text: appeal.frame(statement),
            })
            .collect()
    }
}

// ============================================================================
// PIPELINE RUNNER
// ============================================================================

struct Outcome {
    verdict: Verdict,
    refusal: Option<Refusal>,
    output: Option<String>,
}

impl Outcome {
    fn allowed(output: String) -> Self {
        Self {
            verdict: Verdict::Allow,
            refusal: None,
            output: Some(output),
        }
    }

    fn refused(refusal: Refusal, output: Option<String>) -> Self {
        let verdict = if refusal.category.is_hard() {
            Verdict::Block
        } else {
            Verdict::Warn
        };
        Self {
            verdict,
            refusal: Some(refusal),
            output,
        }
    }
}

/// Runs requests through the pipeline stages in order
pub struct PipelineRunner<'g> {
    oracle: Oracle,
    gatherer: Option<EvidenceGatherer>,
    generator: Option<&'g dyn TextGenerator>,
}

impl<'g> PipelineRunner<'g> {
    /// Runner that can only screen and frame statements
    pub fn new(oracle: Oracle) -> Self {
        Self {
            oracle,
            gatherer: None,
            generator: None,
        }
    }

    /// Builder: add the evidence sources
    pub fn with_gatherer(mut self, gatherer: EvidenceGatherer) -> Self {
        self.gatherer = Some(gatherer);
        self
    }

    /// Builder: add the text generator
    pub fn with_generator(mut self, generator: &'g dyn TextGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn oracle(&self) -> &Oracle {
        &self.oracle
    }

    /// Evaluate a request and return a decision.
    ///
    /// Gate failures are decisions; only a generation failure or a missing
    /// capability is an error.
    pub fn evaluate(&self, request: &DebateRequest) -> Result<PipelineDecision, ContractError> {
        let start = Instant::now();
        let mut stages = Vec::new();
        let mut chain = EvaluationChain::default();

        let statement = Statement::new(request.mode.subject());
        if statement.is_blank() {
            let outcome = Outcome::refused(Refusal::empty_statement(), None);
            return Ok(self.decide(request, start, outcome, chain, stages));
        }

        // Stage 1: safety gate and fallacy detector
        stages.push("oracle".to_string());
        let oracle_eval = self.oracle.check_statement(&statement);
        let refusal = Refusal::from_oracle(&oracle_eval);
        chain.oracle = Some(oracle_eval);
        if let Some(refusal) = refusal {
            return Ok(self.decide(request, start, Outcome::refused(refusal, None), chain, stages));
        }

        let outcome = match &request.mode {
            RequestMode::Screen { .. } => {
                match self.normalize(&statement, &mut chain, &mut stages)? {
                    Some(query) => Outcome::allowed(query.text),
                    None => Outcome::refused(Refusal::subjective(), None),
                }
            }
            RequestMode::Rhetoric { .. } => {
                stages.push("composer".to_string());
                let framed = ArgumentComposer::framings(statement.text())
                    .into_iter()
                    .map(|f| f.text)
                    .collect::<Vec<_>>()
                    .join("\n");
                Outcome::allowed(framed)
            }
            RequestMode::Verify { .. } => self.verify(&statement, &mut chain, &mut stages)?,
            RequestMode::Debate { .. } => self.debate(&statement, &mut chain, &mut stages)?,
            RequestMode::Argue {
                topic,
                position,
                stage,
            } => {
                let generator = self.generator()?;
                stages.push("composer".to_string());
                let prompt = ArgumentComposer::basic_prompt(topic, *position, *stage);
                Outcome::allowed(generator.generate(&prompt, &DecodingConfig::basic())?)
            }
            RequestMode::Chat { topic } => {
                let gatherer = self.gatherer()?;
                let generator = self.generator()?;

                stages.push("evidence".to_string());
                let report = gatherer.gather(topic);
                chain.degraded_sources = report
                    .degraded_sources()
                    .into_iter()
                    .map(str::to_string)
                    .collect();
                let bundle = report.bundle();

                stages.push("composer".to_string());
                let prompt = ArgumentComposer::chat_prompt(topic, &bundle);
                chain.evidence = Some(bundle);
                Outcome::allowed(generator.generate(&prompt, &DecodingConfig::chat())?)
            }
        };

        Ok(self.decide(request, start, outcome, chain, stages))
    }

    /// Create an audit entry for a decision
    pub fn audit(&self, request: &DebateRequest, decision: &PipelineDecision) -> AuditEntry {
        AuditEntry::from_decision(request, decision)
    }

    fn gatherer(&self) -> Result<&EvidenceGatherer, ContractError> {
        self.gatherer
            .as_ref()
            .ok_or(ContractError::MissingCapability("evidence sources"))
    }

    fn generator(&self) -> Result<&'g dyn TextGenerator, ContractError> {
        self.generator
            .ok_or(ContractError::MissingCapability("text generator"))
    }

    fn normalize(
        &self,
        statement: &Statement,
        chain: &mut EvaluationChain,
        stages: &mut Vec<String>,
    ) -> Result<Option<Query>, ContractError> {
        stages.push("query".to_string());
        let query = self.oracle.normalize_query(statement)?;
        chain.query = query.clone();
        Ok(query)
    }

    fn verify(
        &self,
        statement: &Statement,
        chain: &mut EvaluationChain,
        stages: &mut Vec<String>,
    ) -> Result<Outcome, ContractError> {
        let Some(query) = self.normalize(statement, chain, stages)? else {
            let fact = FactCheck::NotCheckable;
            let output = format!("{}\n\nEvidence: {}", statement, fact.render());
            chain.fact_checks.push(fact);
            return Ok(Outcome::refused(Refusal::subjective(), Some(output)));
        };

        let gatherer = self.gatherer()?;
        stages.push("fact_check".to_string());
        let fact = gatherer.fact_check(Some(&query));
        let output = format!("{}\n\nEvidence: {}", statement, fact.render());
        chain.fact_checks.push(fact);
        Ok(Outcome::allowed(output))
    }

    fn debate(
        &self,
        statement: &Statement,
        chain: &mut EvaluationChain,
        stages: &mut Vec<String>,
    ) -> Result<Outcome, ContractError> {
        let verified = self.verify(statement, chain, stages)?;
        if verified.refusal.is_some() {
            return Ok(verified);
        }

        let gatherer = self.gatherer()?;
        let query = chain.query.clone();
        stages.push("composer".to_string());

        // Each framing runs its own fact check
        let mut sections = Vec::new();
        for framing in ArgumentComposer::framings(statement.text()) {
            let fact = gatherer.fact_check(query.as_ref());
            sections.push(format!("{}\nEvidence: {}", framing.text, fact.render()));
            chain.fact_checks.push(fact);
        }

        Ok(Outcome::allowed(format!(
            "Final Debate Argument:\n{}",
            sections.join("\n\n")
        )))
    }

    fn decide(
        &self,
        request: &DebateRequest,
        start: Instant,
        outcome: Outcome,
        evaluations: EvaluationChain,
        stages_executed: Vec<String>,
    ) -> PipelineDecision {
        let rules_checked = evaluations
            .oracle
            .as_ref()
            .map(|o| o.rules_checked.len())
            .unwrap_or(0);

        let decision = PipelineDecision {
            request_id: request.request_id,
            decision_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            verdict: outcome.verdict,
            refusal: outcome.refusal,
            evaluations,
            output: outcome.output,
            processing: ProcessingMetadata {
                duration_us: start.elapsed().as_micros() as u64,
                contract_version: CONTRACT_VERSION.to_string(),
                policy_name: self.oracle.policy().name.clone(),
                rules_checked,
                stages_executed,
            },
        };

        info!(
            request_id = %request.request_id,
            mode = request.mode.name(),
            verdict = decision.verdict.label(),
            "pipeline decision"
        );
        if let Ok(json) = self.audit(request, &decision).to_json() {
            debug!(audit = %json, "audit entry");
        }

        decision
    }
}

// ============================================================================
// CHAT TRANSCRIPT
// ============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Messages of one chat session, kept in memory only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTranscript {
    pub session_id: String,
    messages: Vec<ChatMessage>,
}

impl ChatTranscript {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }

    pub fn record(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Request context carrying this session's id
    pub fn context(&self) -> RequestContext {
        RequestContext {
            source: "cli-chat".to_string(),
            session_id: Some(self.session_id.clone()),
            metadata: HashMap::new(),
        }
    }
}

impl Default for ChatTranscript {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChatTranscript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, message) in self.messages.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            let speaker = match message.role {
                Role::User => "You",
                Role::Assistant => "Assistant",
            };
            write!(f, "{}: {}", speaker, message.content)?;
        }
        Ok(())
    }
}

// ============================================================================
// SCENARIO HARNESS
// ============================================================================

/// Offline scenario checked through `RequestMode::Screen`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub statement: String,
    pub expected_verdict: Verdict,
    pub expected_category: Option<RefusalCategory>,
}

impl Scenario {
    fn new(
        name: &str,
        statement: &str,
        expected_verdict: Verdict,
        expected_category: Option<RefusalCategory>,
        description: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            statement: statement.to_string(),
            expected_verdict,
            expected_category,
        }
    }

    /// Built-in suite for the standard policy
    pub fn builtin() -> Vec<Self> {
        use RefusalCategory::*;
        use Verdict::*;

        vec![
            Scenario::new("currency", "The currency of India is rupees", Allow, None, "Factual claim with a rewrite rule"),
            Scenario::new("prime_minister", "Narendra Modi is the Prime Minister of India", Allow, None, "Factual claim with a rewrite rule"),
            Scenario::new("ceo", "Elon Musk is the CEO of Tesla", Allow, None, "Factual claim with a rewrite rule"),
            Scenario::new("capital", "Paris is the capital of France", Allow, None, "Factual claim with a rewrite rule"),
            Scenario::new("nuclear_power", "India is a nuclear power", Allow, None, "Complete-question template"),
            Scenario::new("gravity", "Gravity on Mars", Allow, None, "Topic phrase, not a sentence"),
            Scenario::new("largest_ocean", "Largest ocean on Earth", Allow, None, "Slotless template with the remainder appended"),
            Scenario::new("age_of_universe", "Age of the universe", Allow, None, "Filler-word trigger falls back to the generic question"),
            Scenario::new("climate", "Climate change is accelerating global warming.", Allow, None, "Generic question fallback"),
            Scenario::new("slippery_ai", "If we allow AI to progress, it will destroy humanity", Block, Some(LogicalFallacy), "Substring keyword inside another word"),
            Scenario::new("hasty_rude", "People from city X are always rude", Block, Some(LogicalFallacy), "Hasty generalization keyword"),
            Scenario::new("banning_cars", "Banning cars will solve climate change", Block, Some(LogicalFallacy), "Oversimplification halts before fact checking"),
            Scenario::new("everyone_agrees", "Everyone agrees that this policy is the best.", Block, Some(LogicalFallacy), "Earlier category wins over Bandwagon"),
            Scenario::new("opinion_just", "People who want environmental protection just want to destroy the economy.", Warn, Some(SubjectiveClaim), "Opinion markers prevent a query"),
            Scenario::new("opinion_should", "Should AI replace human teachers?", Warn, Some(SubjectiveClaim), "Opinion markers prevent a query"),
            Scenario::new("offensive_priority", "I hate debates about religion", Block, Some(OffensiveLanguage), "Banned word wins over sensitive topic"),
            Scenario::new("sensitive", "Violence in video games", Block, Some(SensitiveTopic), "Sensitive topic"),
            Scenario::new("empty", "   ", Block, Some(InvalidRequest), "Blank input"),
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub actual_verdict: Verdict,
    pub expected_verdict: Verdict,
    pub actual_category: Option<RefusalCategory>,
    pub error: Option<String>,
    pub duration_us: u64,
}

pub struct ScenarioHarness<'g> {
    runner: PipelineRunner<'g>,
    results: Vec<ScenarioResult>,
}

impl ScenarioHarness<'static> {
    pub fn new() -> Self {
        Self::with_runner(PipelineRunner::new(Oracle::with_defaults()))
    }
}

impl Default for ScenarioHarness<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'g> ScenarioHarness<'g> {
    pub fn with_runner(runner: PipelineRunner<'g>) -> Self {
        Self {
            runner,
            results: Vec::new(),
        }
    }

    pub fn run(&mut self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        let request = DebateRequest::new(RequestMode::Screen {
            statement: scenario.statement.clone(),
        });

        let result = match self.runner.evaluate(&request) {
            Ok(decision) => {
                let actual_category = decision.refusal.as_ref().map(|r| r.category);
                let passed = decision.verdict == scenario.expected_verdict
                    && actual_category == scenario.expected_category;
                let error = (!passed).then(|| {
                    format!(
                        "Expected {:?} with {:?}, got {:?} with {:?}",
                        scenario.expected_verdict,
                        scenario.expected_category,
                        decision.verdict,
                        actual_category
                    )
                });

                ScenarioResult {
                    name: scenario.name.clone(),
                    passed,
                    actual_verdict: decision.verdict,
                    expected_verdict: scenario.expected_verdict,
                    actual_category,
                    error,
                    duration_us: start.elapsed().as_micros() as u64,
                }
            }
            Err(e) => ScenarioResult {
                name: scenario.name.clone(),
                passed: false,
                actual_verdict: Verdict::Block,
                expected_verdict: scenario.expected_verdict,
                actual_category: None,
                error: Some(e.to_string()),
                duration_us: start.elapsed().as_micros() as u64,
            },
        };

        self.results.push(result.clone());
        result
    }

    pub fn run_all(&mut self, scenarios: &[Scenario]) -> Vec<ScenarioResult> {
        scenarios.iter().map(|s| self.run(s)).collect()
    }

    pub fn summary(&self) -> ScenarioSummary {
        let passed = self.results.iter().filter(|r| r.passed).count();
        ScenarioSummary {
            total: self.results.len(),
            passed,
            failed: self.results.len() - passed,
            total_duration_us: self.results.iter().map(|r| r.duration_us).sum(),
            results: self.results.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub total_duration_us: u64,
    pub results: Vec<ScenarioResult>,
}

impl ScenarioSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failed_scenarios(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.name.as_str())
            .collect()
    }
}

// ============================================================================
// UNIT TESTS
// ============================================================================
