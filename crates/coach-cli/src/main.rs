//! Interview Coach CLI — entry point.
//!
//! # Commands
//!
//! - `coach ask -m MESSAGE [--system TEXT]` — raw chat call
//! - `coach questions --role ROLE` — generate interview questions
//! - `coach resume FILE` — analyze a resume
//! - `coach code --question Q --language L FILE` — evaluate a code answer
//! - `coach feedback TRANSCRIPT.json` — grade a finished interview
//! - `coach interview --role ROLE` — mock interview REPL
//! - `coach onboard` — initialize config and data directories
//! - `coach status` — show configuration and credential pools
//! - `coach reset` — forget a session's credential choices

mod commands;
mod helpers;
mod onboard;
mod repl;
mod status;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::{debug, warn};

use coach_core::config::{load_config, Config};
use coach_core::{ChatMessage, SessionContext, SessionStore};
use coach_providers::{create_dispatcher, Dispatcher};
use coach_tasks::{prompts, InterviewCoach, QuestionRequest};

// ─────────────────────────────────────────────
// CLI definition
// ─────────────────────────────────────────────

/// Interview Coach — AI mock interviews, resume and code review
#[derive(Parser)]
#[command(name = "coach", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session identifier; keeps the same credential across invocations
    #[arg(short, long, global = true, default_value = "cli:default")]
    session: String,

    /// Enable debug logging
    #[arg(long, global = true, default_value_t = false)]
    logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one chat message and print the raw reply
    Ask {
        /// Message text
        #[arg(short, long)]
        message: String,

        /// Optional system instruction
        #[arg(long, conflicts_with = "role")]
        system: Option<String>,

        /// Answer as an interviewer for this role
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Generate interview questions for a role
    Questions {
        #[command(flatten)]
        target: InterviewTarget,

        /// Print the result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Analyze a plain-text resume
    Resume {
        /// Resume file (plain text or markdown)
        file: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Evaluate a code answer
    Code {
        /// The question the code answers
        #[arg(short, long)]
        question: String,

        /// Programming language of the answer
        #[arg(short, long)]
        language: String,

        /// Source file with the answer
        file: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Grade a transcript: a JSON array of `{"question", "answer"}`
    Feedback {
        transcript: PathBuf,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run an interactive mock interview
    Interview {
        #[command(flatten)]
        target: InterviewTarget,
    },

    /// Initialize configuration and data directories
    Onboard,

    /// Show configuration and credential pools
    Status,

    /// Forget the session's sticky credential choices
    Reset,
}

/// Shared options for anything that generates questions.
#[derive(Args, Clone, Debug)]
pub struct InterviewTarget {
    /// Role being interviewed for
    #[arg(short, long)]
    role: String,

    /// Seniority, e.g. "junior" or "senior"
    #[arg(short, long, default_value = "mid-level")]
    experience: String,

    /// Number of questions
    #[arg(short, long, default_value_t = 5)]
    count: usize,

    /// Topic to focus on
    #[arg(short, long)]
    focus: Option<String>,

    /// Resume file; its summary tailors the questions
    #[arg(long)]
    resume: Option<PathBuf>,
}

impl InterviewTarget {
    fn to_request(&self) -> QuestionRequest {
        let mut request = QuestionRequest::new(self.role.trim());
        request.experience = self.experience.clone();
        request.count = self.count;
        request.focus = self.focus.clone().filter(|f| !f.trim().is_empty());
        request
    }
}

// ─────────────────────────────────────────────
// Entrypoint
// ─────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Onboard => onboard::run(),
        Commands::Status => status::run(),
        Commands::Reset => reset_session(&cli.session),
        command => {
            init_logging(cli.logs);
            let mut runtime = CoachRuntime::open(&cli.session)?;
            let result = run_command(&mut runtime, command).await;
            runtime.persist();
            result
        }
    }
}

async fn run_command(runtime: &mut CoachRuntime, command: Commands) -> Result<()> {
    match command {
        Commands::Ask {
            message,
            system,
            role,
        } => {
            let system = match role {
                Some(role) => Some(prompts::interviewer_system(&role)),
                None => system.map(ChatMessage::system),
            };
            commands::ask(runtime, &message, system).await
        }
        Commands::Questions { target, json } => commands::questions(runtime, &target, json).await,
        Commands::Resume { file, json } => commands::resume(runtime, &file, json).await,
        Commands::Code {
            question,
            language,
            file,
            json,
        } => commands::code(runtime, question, language, &file, json).await,
        Commands::Feedback { transcript, json } => {
            commands::feedback(runtime, &transcript, json).await
        }
        Commands::Interview { target } => repl::run(runtime, &target).await,
        Commands::Onboard | Commands::Status | Commands::Reset => Ok(()),
    }
}

// ─────────────────────────────────────────────
// Runtime
// ─────────────────────────────────────────────

/// Everything one invocation needs: the coach, its dispatcher, and the
/// persisted session state.
pub struct CoachRuntime {
    pub coach: InterviewCoach,
    pub context: SessionContext,
    dispatcher: Arc<Dispatcher>,
    store: SessionStore,
    session: String,
}

impl CoachRuntime {
    /// Load config and session state, and build the dispatcher.
    pub fn open(session: &str) -> Result<Self> {
        let config = load_config(None);
        let store = SessionStore::new(None).context("failed to open the session store")?;
        Self::from_config(&config, store, session)
    }

    fn from_config(config: &Config, store: SessionStore, session: &str) -> Result<Self> {
        let dispatcher = create_dispatcher(config)
            .context("failed to build the dispatcher")?
            .with_ledger(&store.load_ledger());
        let dispatcher = Arc::new(dispatcher);
        let coach = InterviewCoach::from_config(dispatcher.clone(), &config.generation);
        let context = store.load_context(session);
        debug!(session, ?context, "opened session");

        Ok(Self {
            coach,
            context,
            dispatcher,
            store,
            session: session.to_string(),
        })
    }

    /// Write the session context and rotation ledger back to disk.
    ///
    /// Failures are logged, never fatal.
    pub fn persist(&self) {
        if let Err(e) = self.store.save_context(&self.session, &self.context) {
            warn!("Failed to save session {}: {}", self.session, e);
        }
        if let Err(e) = self.store.save_ledger(&self.dispatcher.ledger()) {
            warn!("Failed to save rotation ledger: {}", e);
        }
    }
}

fn reset_session(session: &str) -> Result<()> {
    let store = SessionStore::new(None).context("failed to open the session store")?;
    if store.delete(session) {
        println!("  {} session {} reset", "✓".green(), session.bold());
    } else {
        println!("  {} no saved state for session {}", "·".dimmed(), session);
    }
    Ok(())
}

/// Initialize tracing/logging.
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("coach=debug,info")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
