mod display;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use matricula_core::{DEFAULT_PAGE_SIZE, FieldKey, ReviewContext, ReviewError};
use matricula_store::{BackendConfig, DEFAULT_OBJECT_KEY, DEFAULT_PROGRESS_FILE, ReviewSession, connect};

#[derive(Parser)]
#[command(name = "matricula", version, about = "Manual review of extracted matrícula records")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    /// Records shown per page
    #[arg(long, env = "MATRICULA_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE, global = true)]
    page_size: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendKind {
    Local,
    Remote,
}

#[derive(clap::Args)]
struct StoreArgs {
    /// Where progress is persisted
    #[arg(long, env = "MATRICULA_BACKEND", value_enum, default_value = "local", global = true)]
    backend: BackendKind,

    /// Progress file for the local backend
    #[arg(long, env = "MATRICULA_PROGRESS_FILE", default_value = DEFAULT_PROGRESS_FILE, global = true)]
    progress_file: PathBuf,

    /// Object store base URL for the remote backend
    #[arg(long, env = "MATRICULA_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Bucket holding the progress object
    #[arg(long, env = "MATRICULA_BUCKET", global = true)]
    bucket: Option<String>,

    /// Key of the progress object
    #[arg(long, env = "MATRICULA_OBJECT_KEY", default_value = DEFAULT_OBJECT_KEY, global = true)]
    object_key: String,

    /// Bearer token for the object store
    #[arg(long, env = "MATRICULA_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,
}

impl StoreArgs {
    fn config(&self) -> anyhow::Result<BackendConfig> {
        Ok(match self.backend {
            BackendKind::Local => BackendConfig::Local {
                path: self.progress_file.clone(),
            },
            BackendKind::Remote => BackendConfig::Remote {
                endpoint: self
                    .endpoint
                    .clone()
                    .context("--endpoint (or MATRICULA_ENDPOINT) is required for the remote backend")?,
                bucket: self
                    .bucket
                    .clone()
                    .context("--bucket (or MATRICULA_BUCKET) is required for the remote backend")?,
                key: self.object_key.clone(),
                token: self.token.clone(),
            },
        })
    }
}

#[derive(Subcommand)]
enum Command {
    /// Check uploads against the matrícula schema without touching progress
    Validate {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show all saved progress
    Status,
    /// Show one page of records with their review flags
    Review {
        file: PathBuf,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Set (or clear) a single field flag and save
    Mark {
        file: PathBuf,
        /// Record number, starting at 1
        #[arg(long)]
        record: usize,
        /// Field key: tipo, valor, doc_alienante_N, doc_adquirente_N
        #[arg(long)]
        field: FieldKey,
        /// Clear the flag instead of setting it
        #[arg(long)]
        unset: bool,
    },
    /// Confirm every field of a record and save
    MarkAll {
        file: PathBuf,
        /// Record number, starting at 1
        #[arg(long)]
        record: usize,
    },
    /// Mark a document as fully reviewed and save
    Finalize { file: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    tracing::debug!("matricula v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();

    match &cli.command {
        Command::Validate { files } => validate(files, cli.page_size).await,
        Command::Status => {
            let session = open_session(&cli).await?;
            display::print_progress(session.context().progress());
            Ok(())
        }
        Command::Review { file, page } => {
            let mut session = open_session(&cli).await?;
            let name = upload(session.context_mut(), file).await?;
            let ctx = session.context_mut();
            ctx.goto_page(&name, page.saturating_sub(1))?;
            let records: Vec<_> = ctx
                .visible_records(&name)?
                .into_iter()
                .map(|(i, r)| (i, r.clone()))
                .collect();
            for (index, record) in &records {
                display::print_record_card(&name, *index, record, ctx.progress());
            }
            if let Some(cursor) = ctx.cursor(&name) {
                display::print_page_footer(cursor);
            }
            if ctx.progress().is_finalized(&name) {
                println!("{name} is finalized.");
            }
            Ok(())
        }
        Command::Mark {
            file,
            record,
            field,
            unset,
        } => {
            let mut session = open_session(&cli).await?;
            let name = upload(session.context_mut(), file).await?;
            let index = record_index(*record)?;
            session.context_mut().set_field(&name, index, *field, !unset)?;
            save(&session).await?;
            println!("Registro {record} {field} = {}", !unset);
            Ok(())
        }
        Command::MarkAll { file, record } => {
            let mut session = open_session(&cli).await?;
            let name = upload(session.context_mut(), file).await?;
            let index = record_index(*record)?;
            session.context_mut().mark_all_correct(&name, index)?;
            save(&session).await?;
            println!("Registro {record}: all fields marked correct");
            Ok(())
        }
        Command::Finalize { file } => {
            let mut session = open_session(&cli).await?;
            let name = upload(session.context_mut(), file).await?;
            session.context_mut().finalize(&name);
            save(&session).await?;
            println!("{name} finalized");
            Ok(())
        }
    }
}

async fn open_session(cli: &Cli) -> anyhow::Result<ReviewSession> {
    let config = cli.store.config()?;
    let backend = connect(&config)?;
    let description = backend.describe();
    ReviewSession::open(backend, cli.page_size)
        .await
        .with_context(|| format!("loading progress from {description}"))
}

async fn save(session: &ReviewSession) -> anyhow::Result<()> {
    session
        .save()
        .await
        .with_context(|| format!("progress was NOT saved to {}", session.backend().describe()))?;
    println!("Progress saved to {}", session.backend().describe());
    Ok(())
}

/// Progress is keyed by the upload's base name, not its full path.
fn upload_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .with_context(|| format!("{} has no usable file name", path.display()))
}

async fn upload(ctx: &mut ReviewContext, path: &Path) -> anyhow::Result<String> {
    let name = upload_name(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    ctx.ingest_bytes(&name, &bytes)?;
    Ok(name)
}

fn record_index(record: usize) -> anyhow::Result<usize> {
    match record.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("record numbers start at 1"),
    }
}

/// Validate a batch of uploads. Every file is checked even after failures.
async fn validate(files: &[PathBuf], page_size: usize) -> anyhow::Result<()> {
    let mut unreadable = 0usize;
    let mut batch = Vec::with_capacity(files.len());
    for path in files {
        let read = match upload_name(path) {
            Ok(name) => tokio::fs::read(path)
                .await
                .map(|bytes| (name, bytes))
                .with_context(|| format!("reading {}", path.display())),
            Err(e) => Err(e),
        };
        match read {
            Ok(entry) => batch.push(entry),
            Err(e) => {
                unreadable += 1;
                println!("{}: {e:#}", path.display());
            }
        }
    }

    let mut ctx = ReviewContext::new(Default::default(), page_size);
    let report = ctx.ingest_batch(batch);
    for name in &report.accepted {
        let records = ctx.document(name).map_or(0, |m| m.records.len());
        println!("{name}: valid, {records} record(s)");
    }
    for error in &report.rejected {
        print_rejection(error);
    }

    let rejected = unreadable + report.rejected.len();
    if rejected > 0 {
        bail!("{rejected} of {} file(s) rejected", files.len());
    }
    Ok(())
}

fn print_rejection(error: &ReviewError) {
    match error {
        ReviewError::Schema { file_name, source } => {
            println!("{file_name}: invalid");
            for violation in &source.violations {
                println!("  {violation}");
            }
        }
        other => println!("{other}"),
    }
}
