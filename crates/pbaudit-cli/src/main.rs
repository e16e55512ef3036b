use anyhow::Result;
use clap::Parser;

use pbaudit_core::pipeline::{AuditOptions, audit};
use pbaudit_core::report::{model::ToolInfo, render};

mod args;

fn main() -> Result<()> {
    let args = args::Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let tool = ToolInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: args.commit.clone(),
    };

    let opts = AuditOptions {
        out_dir: args.out.clone(),
        run_ai: args.ai,
    };
    let report = audit(&args.project, tool, &opts)?;

    let output = match args.format {
        args::OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        args::OutputFormat::Text => render::render_text(&report),
    };
    print!("{output}");

    std::process::exit(report.summary.exit_code);
}
