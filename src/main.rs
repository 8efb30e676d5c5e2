use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use yt_captions::{
    Cli, Config, Extraction, ExtractionError, ExtractionPipeline, ExtractionRequest, YtDlp,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Usage errors exit 1; exit code 2 is reserved for "no captions"
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize tracing; stdout carries the result
    let filter = if cli.verbose {
        EnvFilter::new("yt_captions=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yt_captions=warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(extraction) => {
            println!("{}", extraction);
            ExitCode::SUCCESS
        }
        Err(err) => report(err),
    }
}

async fn run(cli: Cli) -> Result<Extraction> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(program) = cli.tool {
        config.tool.program = program;
    }
    if let Some(timeout) = cli.timeout {
        config.tool.timeout_secs = timeout;
    }
    config.validate()?;

    let request = ExtractionRequest {
        url: cli.url,
        language: cli.language.unwrap_or_else(|| config.defaults.language.clone()),
        format: cli.format.unwrap_or(config.defaults.format),
        output_dir: cli.output_dir,
    };

    let tool = YtDlp::with_program(config.tool.program.clone());
    let pipeline =
        ExtractionPipeline::new(Box::new(tool), config.tool_timeout()).with_progress(!cli.quiet);

    Ok(pipeline.extract(&request).await?)
}

fn report(err: anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ExtractionError>() {
        Some(ExtractionError::NoCaptions) => {
            println!("NO_CAPTIONS");
            ExitCode::from(2)
        }
        Some(extraction_err) => {
            tracing::debug!("extraction failed with {}", extraction_err.code());
            eprintln!("ERROR: {}", extraction_err);
            ExitCode::from(extraction_err.exit_code())
        }
        None => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::from(1)
        }
    }
}
