#![forbid(unsafe_code)]

use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

use culture_lens::questionnaire::{CVCQ_QUESTIONS, CVF_QUESTIONS};
use culture_lens::report::{
    alignment_title, build_alignment_report, build_consolidated_report, render_alignment_markdown,
    render_consolidated_markdown, summarize_responses, AlignmentInput, AnalysisOutcome,
};
use culture_lens::{
    decode_transfer_code, encode_transfer_code, Config, CvfAllocation, Error, Event,
    GatewayAnalyst, Identity, IdentityProvider, NarrativeAnalyst, ProfileDetails, ResponseStore,
    Role, Screen, Session, SqliteStore, UserId,
};

#[derive(Parser)]
#[command(name = "culture-lens", version, about = "CVF/CVCQ survey scoring and reports")]
struct Cli {
    /// SQLite database (overrides CULTURE_LENS_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print both questionnaires as JSON
    Questions,
    /// Provision a profile (prints its id)
    CreateProfile {
        #[arg(long)]
        email: String,
        #[arg(long, value_enum, default_value_t = CliRole::User)]
        role: CliRole,
    },
    /// Fill in name and position for a profile
    Register {
        #[arg(long = "as")]
        user: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        position: String,
    },
    /// Answer both questionnaires as a registered user and store the result
    Respond {
        #[arg(long = "as")]
        user: String,
        #[arg(long)]
        answers: PathBuf,
        /// Also write the respondent's own report (needs OPENROUTER_API_KEY)
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Score an answer sheet without any store and print a transfer code
    Score {
        #[arg(long)]
        answers: PathBuf,
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        position: String,
    },
    /// Import a transfer code (admin)
    Import {
        #[arg(long = "as")]
        admin: String,
        /// Transfer code; read from stdin when omitted
        #[arg(long)]
        code: Option<String>,
    },
    /// List stored responses (admin)
    List {
        #[arg(long = "as")]
        admin: String,
    },
    /// Delete one response (admin)
    Delete {
        #[arg(long = "as")]
        admin: String,
        #[arg(long)]
        user_id: String,
    },
    /// Consolidated culture report over all responses (admin)
    Consolidated {
        #[arg(long = "as")]
        admin: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Md)]
        format: Format,
        /// Skip the AI culture summary
        #[arg(long)]
        no_analysis: bool,
    },
    /// Alignment report of one respondent against the consolidated culture (admin)
    Report {
        #[arg(long = "as")]
        admin: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = Format::Md)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CliRole {
    Admin,
    User,
}

impl From<CliRole> for Role {
    fn from(r: CliRole) -> Self {
        match r {
            CliRole::Admin => Role::Admin,
            CliRole::User => Role::User,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Md,
    Json,
}

/// Raw answers: twelve CVF allocations and twelve CVCQ ratings (`null` for
/// an unanswered question).
#[derive(Debug, Deserialize)]
struct AnswerSheet {
    cvf: Vec<CvfAllocation>,
    cvcq: Vec<Option<u8>>,
}

#[derive(Serialize)]
struct QuestionnaireDump {
    cvf: &'static [culture_lens::questionnaire::CvfQuestion],
    cvcq: &'static [culture_lens::questionnaire::CvcqQuestion],
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    match run(cli.command, &config).await {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<Error>() {
            Some(e) => {
                eprintln!("{}", e.user_message());
                std::process::exit(match e.placement() {
                    culture_lens::Placement::FullScreen => 3,
                    culture_lens::Placement::Inline => 2,
                });
            }
            None => Err(err),
        },
    }
}

/// Lift a library error into the CLI error type, keeping it downcastable.
fn lib<E: Into<Error>>(e: E) -> Box<dyn std::error::Error> {
    let err: Error = e.into();
    Box::new(err)
}

async fn run(command: Commands, config: &Config) -> CliResult<()> {
    match command {
        Commands::Questions => {
            let dump = QuestionnaireDump {
                cvf: CVF_QUESTIONS,
                cvcq: CVCQ_QUESTIONS,
            };
            println!("{}", serde_json::to_string_pretty(&dump)?);
        }
        Commands::CreateProfile { email, role } => {
            let store = SqliteStore::new(&config.db_path).map_err(lib)?;
            let identity = store.create_profile(&email, role.into()).await.map_err(lib)?;
            println!("{}", identity.id);
        }
        Commands::Register {
            user,
            full_name,
            position,
        } => {
            let store = SqliteStore::new(&config.db_path).map_err(lib)?;
            let identity = lookup(&store, &user).await?;
            let provider = store.session(identity.id.clone());
            let details = ProfileDetails::new(full_name, position);
            let saved = provider
                .save_profile_details(&identity.id, &details)
                .await
                .map_err(lib)?;

            let mut session = Session::new();
            let mut screen = session
                .apply(Event::Authenticated(identity))
                .map_err(lib)?;
            if screen == Screen::AwaitingRegistration {
                screen = session
                    .apply(Event::ProfileCompleted(saved))
                    .map_err(lib)?;
            }
            info!(screen = screen.as_str(), "registration complete");
        }
        Commands::Respond {
            user,
            answers,
            report,
        } => {
            let store = SqliteStore::new(&config.db_path).map_err(lib)?;
            let identity = lookup(&store, &user).await?;
            let sheet: AnswerSheet = read_json(&answers)?;
            let response = walk_questionnaires(identity.clone(), &sheet)?;
            store
                .upsert_response_as(&identity, &response)
                .await
                .map_err(lib)?;
            println!("{}", encode_transfer_code(&response).map_err(lib)?);

            if let Some(out) = report {
                let analyst = GatewayAnalyst::from_config(config);
                let report = build_alignment_report(&analyst, AlignmentInput::own(&response))
                    .await
                    .map_err(lib)?;
                std::fs::write(out, render_alignment_markdown(&report))?;
            }
        }
        Commands::Score {
            answers,
            username,
            full_name,
            position,
        } => {
            let details = ProfileDetails::new(full_name, position)
                .validated()
                .map_err(lib)?;
            let identity =
                Identity::new(username.clone(), username, Role::User).with_profile(&details);
            let sheet: AnswerSheet = read_json(&answers)?;
            let response = walk_questionnaires(identity, &sheet)?;
            println!("{}", encode_transfer_code(&response).map_err(lib)?);
        }
        Commands::Import { admin, code } => {
            let code = match code {
                Some(code) => code,
                None => {
                    let mut buf = String::new();
                    io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            // Decode before touching the store so a bad code changes nothing.
            let response = decode_transfer_code(&code).map_err(lib)?;
            let store = SqliteStore::new(&config.db_path).map_err(lib)?;
            let (actor, _) = admin_session(&store, &admin).await?;
            store
                .upsert_response_as(&actor, &response)
                .await
                .map_err(lib)?;
            println!("imported {}", response.user_id);
        }
        Commands::List { admin } => {
            let store = SqliteStore::new(&config.db_path).map_err(lib)?;
            let (_, session) = admin_session(&store, &admin).await?;
            let rows = summarize_responses(&store.list_responses().await.map_err(lib)?);
            println!("{}", serde_json::to_string_pretty(&rows)?);
            info!(
                respondents = session.consolidated().respondents,
                "responses listed"
            );
        }
        Commands::Delete { admin, user_id } => {
            let store = SqliteStore::new(&config.db_path).map_err(lib)?;
            let (actor, _) = admin_session(&store, &admin).await?;
            store
                .delete_response_as(&actor, &UserId::new(user_id.clone()))
                .await
                .map_err(lib)?;
            println!("deleted {user_id}");
        }
        Commands::Consolidated {
            admin,
            out,
            format,
            no_analysis,
        } => {
            let store = SqliteStore::new(&config.db_path).map_err(lib)?;
            admin_session(&store, &admin).await?;
            let responses = store.list_responses().await.map_err(lib)?;
            let analyst = GatewayAnalyst::from_config(config);
            let analyst: Option<&dyn NarrativeAnalyst> =
                if no_analysis { None } else { Some(&analyst) };
            let report = build_consolidated_report(analyst, &responses)
                .await
                .map_err(lib)?;
            let rendered = match format {
                Format::Md => render_consolidated_markdown(&report),
                Format::Json => serde_json::to_string_pretty(&report)?,
            };
            emit(out, &rendered)?;
        }
        Commands::Report {
            admin,
            user_id,
            out,
            format,
        } => {
            let store = SqliteStore::new(&config.db_path).map_err(lib)?;
            let (_, mut session) = admin_session(&store, &admin).await?;
            let analyst = GatewayAnalyst::from_config(config);

            let wanted = UserId::new(user_id);
            let selected = store
                .get_response(&wanted)
                .await
                .map_err(lib)?
                .ok_or_else(|| lib(culture_lens::CollaboratorError::not_found(format!(
                    "no response for {wanted}"
                ))))?;

            let consolidated = session.consolidated().scores;
            if let Some(scores) = consolidated {
                let summary = analyst
                    .analyze(culture_lens::AnalysisRequest::CvfSummary(scores))
                    .await;
                let outcome = AnalysisOutcome::from_result(summary).map_err(lib)?;
                session
                    .apply(Event::ConsolidatedAnalysisReady(outcome.message().to_string()))
                    .map_err(lib)?;
            }
            session
                .apply(Event::SelectResponse(selected.clone()))
                .map_err(lib)?;

            let consolidated = consolidated
                .ok_or_else(|| lib(culture_lens::FlowError::NoConsolidatedData))?;
            let title = alignment_title(&selected);
            let report = build_alignment_report(
                &analyst,
                AlignmentInput::against_consolidated(
                    &title,
                    &consolidated,
                    &selected,
                    session.consolidated_analysis(),
                ),
            )
            .await
            .map_err(lib)?;
            let rendered = match format {
                Format::Md => render_alignment_markdown(&report),
                Format::Json => serde_json::to_string_pretty(&report)?,
            };
            emit(out, &rendered)?;
        }
    }
    Ok(())
}

/// Drive a respondent session from sign-in to completion.
fn walk_questionnaires(
    identity: Identity,
    sheet: &AnswerSheet,
) -> CliResult<culture_lens::Response> {
    let mut session = Session::new();
    let screen = session
        .apply(Event::Authenticated(identity))
        .map_err(lib)?;
    match screen {
        Screen::Intro => {}
        Screen::AwaitingRegistration => {
            return Err("profile incomplete; run `register` first".into());
        }
        _ => return Err("administrators do not answer the questionnaires".into()),
    }
    session.apply(Event::Start).map_err(lib)?;
    session.submit_culture(&sheet.cvf).map_err(lib)?;
    session.submit_leadership(&sheet.cvcq).map_err(lib)?;
    session
        .completed_response()
        .ok_or_else(|| "questionnaire did not complete".into())
}

/// Sign in an administrator and load the current responses into a session.
async fn admin_session(store: &SqliteStore, email: &str) -> CliResult<(Identity, Session)> {
    let identity = lookup(store, email).await?;
    let mut session = Session::new();
    let screen = session
        .apply(Event::Authenticated(identity.clone()))
        .map_err(lib)?;
    if screen != Screen::AdminReviewing {
        return Err(lib(culture_lens::CollaboratorError::permission_denied(
            format!("{email} is not a registered administrator"),
        )));
    }
    let responses = store.list_responses().await.map_err(lib)?;
    session
        .apply(Event::ResponsesChanged(responses))
        .map_err(lib)?;
    Ok((identity, session))
}

async fn lookup(store: &SqliteStore, email: &str) -> CliResult<Identity> {
    let identity = store.profile_by_email(email).await.map_err(lib)?;
    let identity = identity.ok_or_else(|| {
        lib(culture_lens::CollaboratorError::not_found(format!(
            "no profile for {email}"
        )))
    })?;
    // Re-read through the identity provider the flow would use.
    store
        .session(identity.id.clone())
        .current_identity()
        .await
        .ok_or_else(|| format!("profile for {email} could not be loaded").into())
}

fn emit(out: Option<PathBuf>, rendered: &str) -> Result<(), io::Error> {
    match out {
        Some(path) => std::fs::write(path, rendered),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &PathBuf) -> CliResult<T> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}
