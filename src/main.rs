mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use schedulify_core::Settings;

#[derive(Parser)]
#[command(name = "schedulify")]
#[command(about = "Turn class schedules into weekly recurring calendar files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Term window and timezone options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// IANA timezone (defaults to the configured default_timezone, then UTC)
    #[arg(long)]
    tz: Option<String>,

    /// First day of term (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of term (YYYY-MM-DD)
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an .ics file from reviewed events (JSON)
    Ics {
        /// Events file, or "-" for stdin
        input: PathBuf,

        /// Where to write the calendar
        #[arg(short, long, default_value = "schedule.ics")]
        output: PathBuf,

        /// Calendar name (X-WR-CALNAME)
        #[arg(short, long)]
        name: Option<String>,

        #[command(flatten)]
        window: WindowArgs,
    },
    /// Detect class blocks in OCR text and print a review report (JSON)
    Extract {
        /// Text file, or "-" for stdin
        input: PathBuf,

        #[command(flatten)]
        window: WindowArgs,
    },
    /// Detect the term label and date range in a text file
    Term {
        /// Text file, or "-" for stdin
        input: PathBuf,
    },
    /// List the concrete meetings an events file would produce
    Preview {
        /// Events file, or "-" for stdin
        input: PathBuf,

        /// Maximum meetings listed per weekday
        #[arg(short, long, default_value_t = 20)]
        limit: u16,

        #[command(flatten)]
        window: WindowArgs,
    },
    /// Print Google Calendar events.insert bodies for an events file
    Google {
        /// Events file, or "-" for stdin
        input: PathBuf,

        #[command(flatten)]
        window: WindowArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load()?;

    match cli.command {
        Commands::Ics {
            input,
            output,
            name,
            window,
        } => commands::ics::run(&input, &output, name.as_deref(), &window, &settings),
        Commands::Extract { input, window } => commands::extract::run(&input, &window, &settings),
        Commands::Term { input } => commands::term::run(&input),
        Commands::Preview {
            input,
            limit,
            window,
        } => commands::preview::run(&input, limit, &window, &settings),
        Commands::Google { input, window } => commands::google::run(&input, &window, &settings),
    }
}
