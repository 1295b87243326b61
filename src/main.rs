//! chi-input: drive one declared form over stdin/stdout.
//!
//! ```bash
//! chi-input --form signup.yaml run
//! echo 'name=Ada age=36' | chi-input --preview run
//! chi-input spec
//! ```

use anyhow::Result;
use chi_input::config;
use chi_input::services::declare::load_form;
use chi_input::services::jsonl::JsonLines;
use chi_input::theme::{Theme, ThemeMode};
use chi_input::Session;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "chi-input")]
#[command(version)]
#[command(about = "Show a declared form and wait for a valid submission", long_about = None)]
struct Cli {
    /// Form declaration (YAML); discovered when omitted
    #[arg(long, env = "CHI_INPUT_FORM")]
    form: Option<PathBuf>,

    /// Draw each form shown on stderr (also CHI_INPUT_PREVIEW=1)
    #[arg(long)]
    preview: bool,

    /// Preview width in columns
    #[arg(long, env = "CHI_INPUT_WIDTH", default_value_t = 72)]
    width: u16,

    /// Preview palette: dark or light
    #[arg(long, env = "CHI_INPUT_THEME", default_value = "dark")]
    theme: ThemeMode,

    /// Log filter, e.g. `debug` or `chi_input=trace`
    #[arg(long, env = "CHI_INPUT_LOG", default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit the form and read submissions until one is accepted
    Run,
    /// Print the initial form as JSON and exit
    Spec,
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let path = config::discover_form(cli.form.as_deref())?;
    tracing::debug!(?path, "form declaration");
    let group = load_form(&path)?;

    let mut transport = JsonLines::new(io::stdin().lock(), io::stdout().lock());
    if cli.preview || config::env_flag("CHI_INPUT_PREVIEW") {
        transport = transport.with_preview(
            cli.width,
            Theme::from_mode(cli.theme),
            Box::new(io::stderr()),
        );
    }
    let mut session = Session::new(transport);
    match session.input_group(group) {
        Ok(data) => session.transport_mut().write_result(&data),
        Err(e) => {
            session.transport_mut().write_error(&e.to_string())?;
            Err(e.into())
        }
    }
}

fn spec(cli: &Cli) -> Result<()> {
    let path = config::discover_form(cli.form.as_deref())?;
    let group = load_form(&path)?;
    println!("{}", serde_json::to_string_pretty(group.spec())?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);
    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Run => run(&cli),
        Commands::Spec => spec(&cli),
    }
}
