use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Operator CLI for the edge gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show aggregate backend health
    Health,
    /// Dump Prometheus metrics, optionally filtered by name prefix
    Metrics {
        #[arg(short, long)]
        filter: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: gateway returned status {}", status);
                return Ok(());
            }
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
            if let Some(map) = json.as_object() {
                let down = map.values().filter(|v| v.as_str() == Some("unavailable")).count();
                if down > 0 {
                    eprintln!("{} service(s) unavailable", down);
                }
            }
        }
        Commands::Metrics { filter } => {
            let res = client.get(format!("{}/metrics", base)).send().await?;
            let status = res.status();
            if !status.is_success() {
                eprintln!("Error: gateway returned status {} (metrics disabled?)", status);
                return Ok(());
            }
            let text = res.text().await?;
            for line in text.lines() {
                match &filter {
                    Some(prefix) if !line.starts_with(prefix.as_str()) => {}
                    _ => println!("{}", line),
                }
            }
        }
    }

    Ok(())
}
