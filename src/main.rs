use clap::Parser;
use pdf_word_counter::{
    backend::Backends,
    batch,
    cli::{self, Cli},
    error,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("PDF_WORD_COUNTER_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        cli::generate_completions(shell);
        return Ok(());
    }

    init_tracing(cli.verbose, cli.quiet);

    let terms = cli.terms();
    if terms.is_empty() {
        warn!("no search terms given, only file columns will be reported");
    }

    batch::run(
        &cli.patterns(),
        &terms,
        cli.search_options()?,
        &cli.batch_options(),
        Backends::detect(),
    )?;
    Ok(())
}
