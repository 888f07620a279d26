//! Main entry point for the zipspace CLI application.
//!
//! Acts as the upload layer in front of the extractor: it opens a local or
//! remote archive, applies the upload checks, runs the extraction under a
//! timeout and prints the resulting project.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use zipspace::extract::with_timeout;
use zipspace::{
    ArchiveExtractor, Cli, DiagnosticSink, ExtractError, ExtractedArchive, HttpRangeReader,
    LocalFileReader, NullSink, ReadAt, TracingSink,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let project = if cli.is_http_url() {
        let reader = Arc::new(HttpRangeReader::new(&cli.archive).await?);
        let file_name = cli.name.clone().unwrap_or_else(|| reader.file_name());
        let project = load(reader.clone(), &file_name, &cli).await?;

        if !cli.quiet {
            tracing::info!(
                transferred = reader.transferred_bytes(),
                "remote archive read"
            );
        }
        project
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.archive))
            .with_context(|| format!("cannot open {}", cli.archive))?;
        let file_name = cli.name.clone().unwrap_or_else(|| reader.file_name());
        load(Arc::new(reader), &file_name, &cli).await?
    };

    print_project(&project, &cli)
}

/// Validate the upload, then extract it within the configured timeout.
async fn load<R: ReadAt + 'static>(
    reader: Arc<R>,
    file_name: &str,
    cli: &Cli,
) -> Result<ExtractedArchive> {
    cli.upload_policy().validate(file_name, reader.size())?;

    let sink: &dyn DiagnosticSink = if cli.quiet { &NullSink } else { &TracingSink };
    let extractor = ArchiveExtractor::new(cli.extract_options());
    let timeout = Duration::from_secs(cli.timeout);

    match with_timeout(timeout, extractor.extract_from(reader, file_name, sink)).await {
        Ok(project) => Ok(project),
        Err(ExtractError::Empty(_)) => bail!("{file_name}: no valid files found"),
        Err(err) => Err(err).with_context(|| format!("failed to extract {file_name}")),
    }
}

fn print_project(project: &ExtractedArchive, cli: &Cli) -> Result<()> {
    if cli.list {
        for path in project.files.keys() {
            println!("{}", path);
        }
        return Ok(());
    }

    if let Some(ref path) = cli.print {
        let file = project
            .files
            .get(path.trim_start_matches('/'))
            .with_context(|| format!("{path} is not a file of {}", project.project_name))?;
        print!("{}", file.content);
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(project)?);
    Ok(())
}
