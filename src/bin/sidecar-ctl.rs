use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sidecar-ctl")]
#[command(about = "Control CLI for the admin sidecar", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:9000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Kill the supervised process immediately
    Kill,
    /// Ask the supervised process to shut down gracefully
    Quit,
    /// Ask the supervised process to reload its configuration
    Reload,
}

impl Commands {
    fn path(&self) -> &'static str {
        match self {
            Commands::Kill => "/admin/kill",
            Commands::Quit => "/admin/quit",
            Commands::Reload => "/admin/reload",
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let url = format!("{}{}", cli.url.trim_end_matches('/'), cli.command.path());
    let res = client.get(url).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;

    if !status.is_success() {
        eprintln!("Error: admin server returned status {}", status);
        eprint!("{}", text);
        return Ok(ExitCode::FAILURE);
    }

    print!("{}", text);
    Ok(ExitCode::SUCCESS)
}
