//! Debate Assistant CLI
//!
//! Command-line interface for the debate pipeline.
//!
//! # Overview
//!
//! Every statement passes the safety gate and the fallacy detector before
//! anything else happens. Statements that pass are rewritten into a query,
//! checked against Wolfram|Alpha, framed rhetorically or handed to the
//! fine-tuned debate model together with gathered evidence.
//!
//! # Dry Run Mode
//!
//! Commands that contact external services support `--dry-run`, which prints
//! the query or prompt that would be sent and contacts nothing.
//!
//! # Reversibility
//!
//! Only `init` writes to disk. Everything else is read-only.

use clap::{Args, Parser, Subcommand, ValueEnum};
use debate_contract::{
    ArgumentComposer, ChatTranscript, DebateRequest, PipelineDecision, PipelineRunner, Position,
    Refusal, RequestContext, RequestMode, Role, Scenario, ScenarioHarness, Stage, Verdict,
};
use evidence_gatherer::{EvidenceBundle, EvidenceGatherer, SourceConfig, OPINION_NOTICE};
use serde::Serialize;
use statement_oracle::{DebatePolicy, Oracle, OracleError, Statement};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use text_generator::{GenerationError, HttpGenerator, TextGenerator};
use tracing::{info, Level};

const LOCAL_POLICY: &str = ".debate/policy.json";

/// Output format for results
#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine processing
    Json,
    /// Compact single-line output
    Compact,
}

/// Verbosity level
#[derive(Debug, Clone, ValueEnum)]
enum Verbosity {
    /// Errors only
    Quiet,
    /// Warnings, including degraded evidence sources
    Normal,
    /// Pipeline decisions
    Verbose,
    /// Outbound queries and audit entries
    Debug,
}

impl Verbosity {
    fn level(&self) -> Level {
        match self {
            Verbosity::Quiet => Level::ERROR,
            Verbosity::Normal => Level::WARN,
            Verbosity::Verbose => Level::INFO,
            Verbosity::Debug => Level::DEBUG,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PositionArg {
    Pro,
    Con,
}

impl From<PositionArg> for Position {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Pro => Position::Pro,
            PositionArg::Con => Position::Con,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StageArg {
    Opening,
    Counterargument,
    Rebuttal,
}

impl From<StageArg> for Stage {
    fn from(arg: StageArg) -> Self {
        match arg {
            StageArg::Opening => Stage::Opening,
            StageArg::Counterargument => Stage::Counterargument,
            StageArg::Rebuttal => Stage::Rebuttal,
        }
    }
}

/// Credentials and endpoints of the external services
#[derive(Debug, Args)]
struct ServiceArgs {
    /// Wolfram|Alpha application id
    #[arg(long, env = "WOLFRAM_APP_ID", global = true, hide_env_values = true)]
    wolfram_app_id: Option<String>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", global = true, hide_env_values = true)]
    news_api_key: Option<String>,

    /// Base URL of the text-generation server
    #[arg(
        long,
        env = "DEBATE_GENERATOR_URL",
        global = true,
        default_value = text_generator::DEFAULT_ENDPOINT
    )]
    generator_url: String,

    /// Timeout for every HTTP request, in seconds
    #[arg(long, env = "DEBATE_HTTP_TIMEOUT", global = true, default_value = "10")]
    timeout_secs: u64,
}

impl ServiceArgs {
    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn source_config(&self) -> SourceConfig {
        SourceConfig {
            wolfram_app_id: self.wolfram_app_id.clone(),
            news_api_key: self.news_api_key.clone(),
            timeout: self.timeout(),
            ..SourceConfig::default()
        }
    }
}

#[derive(Parser)]
#[command(name = "debate")]
#[command(author = "Jonathan D.A. Jewell <j.d.a.jewell@open.ac.uk>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Evidence-and-safety pipeline for an AI debate assistant")]
#[command(long_about = r#"
Debate Assistant - Evidence-backed debate arguments with safety gating

OVERVIEW
  Every statement flows through the same pipeline:
  1. Safety gate: banned words, then sensitive topics
  2. Fallacy detector: eight keyword-matched fallacies
  3. Query normalizer: statement rewritten into a factual question
  4. Evidence: Wolfram|Alpha, Wikipedia and NewsAPI
  5. Composer: rhetorical framings or the fine-tuned debate model

EXAMPLES
  debate check "Paris is the capital of France"
  debate verify "The currency of India is rupees"
  debate debate "Gravity on Mars"
  debate evidence "Solar power"
  debate argue --topic "Remote work" --position pro --stage opening
  debate chat                                # interactive session
  debate scenarios --format compact

EXIT CODES
  0  Statement allowed
  1  Statement blocked (offensive, sensitive or fallacious)
  2  Subjective claim, could not be fact-checked
  3  Error during execution

MORE INFO
  https://github.com/hyperpolymath/debate-assistant
"#)]
#[command(after_help = r#"
CREDENTIALS
  WOLFRAM_APP_ID and NEWS_API_KEY are read from the environment.
  A missing credential degrades that source; it never aborts a run.

DRY RUN
  Use --dry-run to print the query or prompt that would be sent
  without contacting any service.

SHELL COMPLETIONS
  Generate completions with:
    debate completions bash > /etc/bash_completion.d/debate
    debate completions zsh > ~/.zfunc/_debate
    debate completions fish > ~/.config/fish/completions/debate.fish
"#)]
struct Cli {
    /// Output verbosity level
    #[arg(short, long, value_enum, default_value = "normal", global = true)]
    verbosity: Verbosity,

    /// Dry run mode - show what would be sent without sending it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Custom policy file (JSON); defaults to .debate/policy.json when present
    #[arg(short, long, global = true)]
    policy_file: Option<PathBuf>,

    #[command(flatten)]
    services: ServiceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a statement offline
    ///
    /// Runs the safety gate, the fallacy detector and the query normalizer.
    /// No external service is contacted.
    #[command(visible_alias = "c")]
    Check {
        statement: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Fact-check a statement against Wolfram|Alpha
    #[command(visible_alias = "v")]
    Verify {
        statement: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Build an ethos/pathos/logos argument with a fact check per appeal
    #[command(visible_alias = "d")]
    Debate {
        statement: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Frame a statement rhetorically, offline
    #[command(visible_alias = "r")]
    Rhetoric {
        statement: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the question a statement is rewritten into
    ///
    /// Exits with 2 when the statement is an opinion.
    #[command(visible_alias = "q")]
    Question { statement: String },

    /// Gather evidence for a term from all three sources
    #[command(visible_alias = "e")]
    Evidence {
        term: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Generate an argument with the debate model
    ///
    /// EXAMPLE
    ///   debate argue --topic "AI in schools" --position con --stage rebuttal
    #[command(visible_alias = "a")]
    Argue {
        #[arg(short, long)]
        topic: String,

        #[arg(long, value_enum, default_value = "pro")]
        position: PositionArg,

        #[arg(long, value_enum, default_value = "opening")]
        stage: StageArg,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Evidence-backed generation
    ///
    /// With a topic, answers once. Without one, reads a topic per line from
    /// stdin until an empty line or end of input.
    Chat {
        topic: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Display the active policy tables
    #[command(visible_alias = "p")]
    Policy {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Show only specific section (safety, fallacies, queries)
        #[arg(short, long)]
        section: Option<String>,
    },

    /// Run the built-in offline scenario suite
    Scenarios {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write the default policy to .debate/policy.json
    ///
    /// REVERSIBILITY
    ///   Remove with: rm -rf .debate/
    #[command(visible_alias = "i")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    /// Generate man page
    ///
    /// EXAMPLE
    ///   debate man > /usr/local/share/man/man1/debate.1
    Man,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.verbosity.level())
        .with_writer(io::stderr)
        .init();

    let exit_code = match cli.command {
        Commands::Completions { shell } => {
            generate_completions(shell);
            0
        }
        Commands::Man => generate_man_page(),
        Commands::Init { force } => {
            if cli.dry_run {
                println!("[dry-run] Would write {}", LOCAL_POLICY);
                println!("[dry-run] Force: {}", force);
                0
            } else {
                init_config(force)
            }
        }
        command => match load_oracle(cli.policy_file.as_deref()) {
            Ok(oracle) => run(command, oracle, &cli.services, cli.dry_run),
            Err(e) => {
                eprintln!("Failed to load policy: {}", e);
                3
            }
        },
    };

    std::process::exit(exit_code);
}

fn load_oracle(policy_file: Option<&Path>) -> Result<Oracle, OracleError> {
    let local = Path::new(LOCAL_POLICY);
    let path = match policy_file {
        Some(path) => path,
        None if local.exists() => local,
        None => return Ok(Oracle::with_defaults()),
    };

    info!(path = %path.display(), "loading policy file");
    Ok(Oracle::new(DebatePolicy::from_file(path)?))
}

fn run(command: Commands, oracle: Oracle, services: &ServiceArgs, dry_run: bool) -> i32 {
    match command {
        Commands::Check { statement, format } => {
            let runner = PipelineRunner::new(oracle);
            evaluate(&runner, RequestMode::Screen { statement }, &format)
        }
        Commands::Rhetoric { statement, format } => {
            let runner = PipelineRunner::new(oracle);
            evaluate(&runner, RequestMode::Rhetoric { statement }, &format)
        }
        Commands::Verify { statement, format } => {
            if dry_run {
                return dry_run_query(&oracle, &statement);
            }
            match with_sources(oracle, services) {
                Ok(runner) => evaluate(&runner, RequestMode::Verify { statement }, &format),
                Err(code) => code,
            }
        }
        Commands::Debate { statement, format } => {
            if dry_run {
                return dry_run_query(&oracle, &statement);
            }
            match with_sources(oracle, services) {
                Ok(runner) => evaluate(&runner, RequestMode::Debate { statement }, &format),
                Err(code) => code,
            }
        }
        Commands::Question { statement } => print_question(&oracle, &statement),
        Commands::Evidence { term, format } => {
            if dry_run {
                println!("[dry-run] Would gather evidence for: {}", term);
                return 0;
            }
            gather_evidence(services, &term, &format)
        }
        Commands::Argue {
            topic,
            position,
            stage,
            format,
        } => {
            let (position, stage) = (Position::from(position), Stage::from(stage));
            if dry_run {
                println!("[dry-run] Would send to {}:", services.generator_url);
                print!("{}", ArgumentComposer::basic_prompt(&topic, position, stage));
                return 0;
            }
            let generator = match connect_generator(services) {
                Ok(generator) => generator,
                Err(e) => {
                    eprintln!("Failed to set up text generator: {}", e);
                    return 3;
                }
            };
            let runner = PipelineRunner::new(oracle).with_generator(generator);
            evaluate(
                &runner,
                RequestMode::Argue {
                    topic,
                    position,
                    stage,
                },
                &format,
            )
        }
        Commands::Chat { topic, format } => {
            if dry_run {
                let mut stdout = io::stdout();
                return report_io(dry_run_chat(
                    &oracle,
                    topic.as_deref(),
                    &services.generator_url,
                    &mut stdout,
                ));
            }
            let runner = match with_sources(oracle, services) {
                Ok(runner) => runner,
                Err(code) => return code,
            };
            let generator = match connect_generator(services) {
                Ok(generator) => generator,
                Err(e) => {
                    eprintln!("Failed to set up text generator: {}", e);
                    return 3;
                }
            };
            let runner = runner.with_generator(generator);
            match topic {
                Some(topic) => evaluate(&runner, RequestMode::Chat { topic }, &format),
                None => report_io(chat_session(&runner, io::stdin().lock(), &mut io::stdout())),
            }
        }
        Commands::Policy { format, section } => {
            show_policy(oracle.policy(), &format, section.as_deref())
        }
        Commands::Scenarios { format } => run_scenarios(oracle, &format),
        Commands::Init { .. } | Commands::Completions { .. } | Commands::Man => 0,
    }
}

fn with_sources(oracle: Oracle, services: &ServiceArgs) -> Result<PipelineRunner<'static>, i32> {
    match EvidenceGatherer::from_config(&services.source_config()) {
        Ok(gatherer) => Ok(PipelineRunner::new(oracle).with_gatherer(gatherer)),
        Err(e) => {
            eprintln!("Failed to set up evidence sources: {}", e);
            Err(3)
        }
    }
}

fn connect_generator(services: &ServiceArgs) -> Result<&'static dyn TextGenerator, GenerationError> {
    let generator = HttpGenerator::new(services.generator_url.clone(), services.timeout())?;
    info!(
        endpoint = %services.generator_url,
        model = generator.model_name(),
        "text generator ready"
    );
    text_generator::install(Box::new(generator))
}

fn evaluate(runner: &PipelineRunner<'_>, mode: RequestMode, format: &OutputFormat) -> i32 {
    let request = DebateRequest::new(mode).with_context(RequestContext {
        source: "cli".to_string(),
        ..RequestContext::default()
    });

    match runner.evaluate(&request) {
        Ok(decision) => report_decision(&request, &decision, format),
        Err(e) => {
            eprintln!("Error: {}", e);
            3
        }
    }
}

fn report_decision(request: &DebateRequest, decision: &PipelineDecision, format: &OutputFormat) -> i32 {
    match format {
        OutputFormat::Json => {
            if let Err(code) = print_json(decision) {
                return code;
            }
        }
        OutputFormat::Compact => {
            println!(
                "{} mode={} code={} stages={}",
                decision.verdict.label(),
                request.mode.name(),
                decision
                    .refusal
                    .as_ref()
                    .map(|r| r.code.numeric().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                decision.processing.stages_executed.join(",")
            );
        }
        OutputFormat::Text => print_decision(request, decision),
    }

    decision.verdict.exit_code()
}

fn print_decision(request: &DebateRequest, decision: &PipelineDecision) {
    let screening = matches!(request.mode, RequestMode::Screen { .. });
    if screening {
        println!("Verdict: {}", decision.verdict.label());
    }

    match (&decision.output, &decision.refusal) {
        (Some(query), _) if screening => println!("Query: {}", query),
        (Some(output), _) => println!("{}", output),
        (None, Some(refusal)) => {
            println!("{}", refusal.message);
            if let Some(remediation) = &refusal.remediation {
                println!("{}", remediation);
            }
        }
        (None, None) => {}
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), i32> {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            Ok(())
        }
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            Err(3)
        }
    }
}

fn dry_run_query(oracle: &Oracle, statement: &str) -> i32 {
    match oracle.normalize_query(&Statement::new(statement)) {
        Ok(Some(query)) => {
            println!("[dry-run] Would send to Wolfram Alpha: {}", query.text);
            0
        }
        Ok(None) => {
            println!("[dry-run] Nothing to send: {}", OPINION_NOTICE);
            0
        }
        Err(e) => {
            eprintln!("Error normalizing statement: {}", e);
            3
        }
    }
}

fn print_question(oracle: &Oracle, statement: &str) -> i32 {
    match oracle.normalize_query(&Statement::new(statement)) {
        Ok(Some(query)) => {
            println!("{}", query.text);
            0
        }
        Ok(None) => {
            println!("{}", OPINION_NOTICE);
            2
        }
        Err(e) => {
            eprintln!("Error normalizing statement: {}", e);
            3
        }
    }
}

fn gather_evidence(services: &ServiceArgs, term: &str, format: &OutputFormat) -> i32 {
    let gatherer = match EvidenceGatherer::from_config(&services.source_config()) {
        Ok(gatherer) => gatherer,
        Err(e) => {
            eprintln!("Failed to set up evidence sources: {}", e);
            return 3;
        }
    };

    let report = gatherer.gather(term);
    let bundle = report.bundle();
    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "term": report.term,
                "evidence": bundle,
                "degraded_sources": report.degraded_sources(),
            });
            if let Err(code) = print_json(&value) {
                return code;
            }
        }
        OutputFormat::Compact => {
            println!(
                "evidence term={:?} facts={} articles={} degraded={}",
                report.term,
                bundle.facts.len(),
                bundle.articles.len(),
                report.degraded_sources().join(",")
            );
        }
        OutputFormat::Text => println!("{}", bundle),
    }
    0
}

fn report_io(result: io::Result<i32>) -> i32 {
    result.unwrap_or_else(|e| {
        eprintln!("I/O error: {}", e);
        3
    })
}

/// Screen the topic and print the chat prompt with placeholder evidence
fn dry_run_chat(
    oracle: &Oracle,
    topic: Option<&str>,
    endpoint: &str,
    out: &mut impl Write,
) -> io::Result<i32> {
    let Some(topic) = topic else {
        writeln!(out, "[dry-run] Would start a chat session on stdin")?;
        writeln!(out, "[dry-run] Would send chat prompts to {}", endpoint)?;
        return Ok(0);
    };

    let evaluation = oracle.check_statement(&Statement::new(topic));
    if let Some(refusal) = Refusal::from_oracle(&evaluation) {
        writeln!(out, "{}", refusal.message)?;
        return Ok(Verdict::Block.exit_code());
    }

    let placeholder = EvidenceBundle {
        summary: Some("[encyclopedia summary]".to_string()),
        facts: vec!["[knowledge engine facts]".to_string()],
        articles: vec!["[news articles]".to_string()],
    };
    writeln!(out, "[dry-run] Would gather evidence for: {}", topic)?;
    writeln!(out, "[dry-run] Would send to {}:", endpoint)?;
    writeln!(out, "{}", ArgumentComposer::chat_prompt(topic, &placeholder))?;
    Ok(0)
}

/// Line-based chat session. A generation failure ends the session with exit code 3.
fn chat_session(
    runner: &PipelineRunner<'_>,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<i32> {
    let mut transcript = ChatTranscript::new();
    let mut exit_code = 0;
    writeln!(out, "Debate chat. Enter a topic per line; an empty line ends the session.")?;

    let mut lines = input.lines();
    loop {
        write!(out, "You: ")?;
        out.flush()?;

        let topic = match lines.next() {
            Some(line) => line?.trim().to_string(),
            None => break,
        };
        if topic.is_empty() {
            break;
        }

        transcript.record(Role::User, topic.clone());
        let request =
            DebateRequest::new(RequestMode::Chat { topic }).with_context(transcript.context());

        match runner.evaluate(&request) {
            Ok(decision) => {
                let reply = decision
                    .output
                    .or_else(|| decision.refusal.map(|r| r.message))
                    .unwrap_or_default();
                writeln!(out, "Assistant: {}\n", reply)?;
                transcript.record(Role::Assistant, reply);
            }
            Err(e) => {
                let reply = format!("Error: {}", e);
                writeln!(out, "Assistant: {}\n", reply)?;
                transcript.record(Role::Assistant, reply);
                exit_code = 3;
                break;
            }
        }
    }

    info!(
        session_id = %transcript.session_id,
        messages = transcript.len(),
        exit_code,
        "chat session ended"
    );
    if !transcript.is_empty() {
        writeln!(out, "\n=== Transcript ===\n{}", transcript)?;
    }
    Ok(exit_code)
}

fn show_policy(policy: &DebatePolicy, format: &OutputFormat, section: Option<&str>) -> i32 {
    match format {
        OutputFormat::Json => {
            if let Err(code) = print_json(policy) {
                return code;
            }
        }
        OutputFormat::Compact => {
            println!(
                "policy banned={} sensitive={} fallacies={} opinion_markers={} rewrites={}",
                policy.safety.banned_words.len(),
                policy.safety.sensitive_topics.len(),
                policy.fallacies.rules.len(),
                policy.queries.opinion_markers.len(),
                policy.queries.rewrites.len()
            );
        }
        OutputFormat::Text => {
            println!("=== {} ===\n", policy.name);

            let show_all = section.is_none();
            let section = section.unwrap_or("");

            if show_all || section == "safety" {
                println!("BANNED WORDS:");
                println!("  {}", policy.safety.banned_words.join(", "));
                println!("\nSENSITIVE TOPICS:");
                println!("  {}", policy.safety.sensitive_topics.join(", "));
            }

            if show_all || section == "fallacies" {
                println!("\nFALLACIES (first match wins):");
                for (i, rule) in policy.fallacies.rules.iter().enumerate() {
                    println!("  {}. {} [{}]", i + 1, rule.category, rule.keywords.join(", "));
                    println!("     {}", rule.explanation);
                }
            }

            if show_all || section == "queries" {
                println!("\nOPINION MARKERS:");
                println!("  {}", policy.queries.opinion_markers.join(", "));
                println!("\nFILLER WORDS:");
                println!("  {}", policy.queries.filler_words.join(", "));
                println!("\nREWRITES:");
                for rule in &policy.queries.rewrites {
                    println!("  \"{}\" -> {}", rule.trigger, rule.template);
                }
            }
        }
    }
    0
}

fn run_scenarios(oracle: Oracle, format: &OutputFormat) -> i32 {
    let mut harness = ScenarioHarness::with_runner(PipelineRunner::new(oracle));
    harness.run_all(&Scenario::builtin());
    let summary = harness.summary();

    match format {
        OutputFormat::Json => {
            if let Err(code) = print_json(&summary) {
                return code;
            }
        }
        OutputFormat::Compact => {
            println!(
                "scenarios total={} passed={} failed={}",
                summary.total, summary.passed, summary.failed
            );
        }
        OutputFormat::Text => {
            println!("=== Scenario Results ===\n");
            for result in &summary.results {
                match &result.error {
                    None => println!("  PASS {}", result.name),
                    Some(error) => println!("  FAIL {} - {}", result.name, error),
                }
            }
            println!(
                "\n{} passed, {} failed ({} us)",
                summary.passed, summary.failed, summary.total_duration_us
            );
        }
    }

    if summary.all_passed() {
        0
    } else {
        1
    }
}

fn init_config(force: bool) -> i32 {
    let policy_path = PathBuf::from(LOCAL_POLICY);

    if policy_path.exists() && !force {
        eprintln!("{} already exists. Use --force to overwrite.", LOCAL_POLICY);
        return 1;
    }

    if let Some(dir) = policy_path.parent() {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create {}: {}", dir.display(), e);
            return 3;
        }
    }

    let content = match serde_json::to_string_pretty(&DebatePolicy::standard()) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to serialize default policy: {}", e);
            return 3;
        }
    };
    if let Err(e) = std::fs::write(&policy_path, content) {
        eprintln!("Failed to write {}: {}", LOCAL_POLICY, e);
        return 3;
    }

    println!("Initialized debate policy in {}", LOCAL_POLICY);
    println!("Edit the tables to change what is blocked or rewritten.");
    println!();
    println!("To revert: rm -rf .debate/");

    0
}

fn generate_completions(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    clap_complete::generate(shell, &mut Cli::command(), "debate", &mut io::stdout());
}

fn generate_man_page() -> i32 {
    use clap::CommandFactory;
    let man = clap_mangen::Man::new(Cli::command());
    let mut buffer: Vec<u8> = Vec::new();
    if let Err(e) = man.render(&mut buffer) {
        eprintln!("Failed to generate man page: {}", e);
        return 3;
    }
    print!("{}", String::from_utf8_lossy(&buffer));
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use evidence_gatherer::{
        Encyclopedia, EncyclopediaEntry, EvidenceError, KnowledgeEngine, NewsArticle, NewsSearch,
    };
    use std::io::Cursor;
    use text_generator::DecodingConfig;

    struct OfflineSources;

    impl KnowledgeEngine for OfflineSources {
        fn pods(&self, _query: &str) -> Result<Vec<String>, EvidenceError> {
            Err(EvidenceError::MissingCredentials("Wolfram Alpha"))
        }

        fn primary_answer(&self, _query: &str) -> Result<String, EvidenceError> {
            Err(EvidenceError::MissingCredentials("Wolfram Alpha"))
        }
    }

    impl Encyclopedia for OfflineSources {
        fn summary(&self, title: &str) -> Result<EncyclopediaEntry, EvidenceError> {
            Err(EvidenceError::NoResults(title.to_string()))
        }
    }

    impl NewsSearch for OfflineSources {
        fn search(&self, _query: &str) -> Result<Vec<NewsArticle>, EvidenceError> {
            Err(EvidenceError::MissingCredentials("NewsAPI"))
        }
    }

    struct BrokenGenerator;

    impl TextGenerator for BrokenGenerator {
        fn model_name(&self) -> &str {
            "broken"
        }

        fn generate(&self, _prompt: &str, _config: &DecodingConfig) -> Result<String, GenerationError> {
            Err(GenerationError::InferenceError("out of memory".to_string()))
        }
    }

    fn offline_gatherer() -> EvidenceGatherer {
        EvidenceGatherer::new(
            Box::new(OfflineSources),
            Box::new(OfflineSources),
            Box::new(OfflineSources),
        )
    }

    #[test]
    fn test_chat_session_stops_on_generation_failure() {
        let generator = BrokenGenerator;
        let runner = PipelineRunner::new(Oracle::with_defaults())
            .with_gatherer(offline_gatherer())
            .with_generator(&generator);

        let mut out = Vec::new();
        let code = chat_session(&runner, Cursor::new("Solar power\nWind power\n"), &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();

        assert_eq!(code, 3);
        assert!(printed.contains("Assistant: Error: Generation failed: Inference error: out of memory"));
        assert!(printed.contains("=== Transcript ===\nYou: Solar power\nAssistant: Error:"));
        assert!(!printed.contains("Wind power"));
    }

    #[test]
    fn test_chat_session_refusal_is_a_reply() {
        let generator = BrokenGenerator;
        let runner = PipelineRunner::new(Oracle::with_defaults())
            .with_gatherer(offline_gatherer())
            .with_generator(&generator);

        let mut out = Vec::new();
        let code = chat_session(&runner, Cursor::new("Violence in films\n\n"), &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();

        assert_eq!(code, 0);
        assert!(printed.contains(
            "Assistant: This topic is highly sensitive. Please rephrase to maintain neutrality."
        ));
    }

    #[test]
    fn test_chat_dry_run_prints_prompt() {
        let mut out = Vec::new();
        let code = dry_run_chat(
            &Oracle::with_defaults(),
            Some("Solar power"),
            "http://127.0.0.1:8080",
            &mut out,
        )
        .unwrap();
        let printed = String::from_utf8(out).unwrap();

        assert_eq!(code, 0);
        assert!(printed.contains("[dry-run] Would send to http://127.0.0.1:8080:"));
        assert!(printed.contains("Debate Topic: Solar power\nCollected Evidence:\n[encyclopedia summary]"));
        assert!(printed.contains("**Debate Response:**"));
    }

    #[test]
    fn test_chat_dry_run_screens_topic() {
        let mut out = Vec::new();
        let code = dry_run_chat(
            &Oracle::with_defaults(),
            Some("Everyone agrees on taxes"),
            "http://127.0.0.1:8080",
            &mut out,
        )
        .unwrap();
        let printed = String::from_utf8(out).unwrap();

        assert_eq!(code, 1);
        assert!(printed.starts_with("Logical Fallacy Detected: Hasty Generalization"));
        assert!(!printed.contains("Collected Evidence"));
    }
}
