//! aider-mcp -- standalone MCP server for aider.
//!
//! Usage: aider-mcp [--aider-path <exe>] [--repo-path <dir>]
//!                  [--config-file <path>] [--env-file <path>] [--verbose]

use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let mut ctx = aider_mcp::ServerContext::default();
    let mut verbose = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--aider-path" => {
                if let Some(value) = args.next() {
                    ctx.aider_path = value;
                }
            }
            "--repo-path" => {
                if let Some(value) = args.next() {
                    ctx.repo_path = PathBuf::from(value);
                }
            }
            "--config-file" => ctx.config_file = args.next().map(PathBuf::from),
            "--env-file" => ctx.env_file = args.next().map(PathBuf::from),
            "--verbose" => verbose = true,
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    // Tracing goes to stderr so it does not interfere with MCP stdio.
    let default_filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    ctx.repo_path = ctx.repo_path.canonicalize()?;

    aider_mcp::run_mcp_server(ctx)
}
