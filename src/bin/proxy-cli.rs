use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "proxy-cli")]
#[command(about = "Management CLI for the round-robin proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8081")]
    url: String,

    #[arg(short, long, default_value = "admin-secret-key")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check proxy status and live backend count
    Status,
    /// List backends and their liveness
    Backends,
    /// Mark a backend alive
    Enable { index: usize },
    /// Mark a backend dead
    Disable { index: usize },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let client = reqwest::Client::builder().default_headers(headers).build()?;

    let res = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", cli.url)).send().await?,
        Commands::Backends => client.get(format!("{}/admin/backends", cli.url)).send().await?,
        Commands::Enable { index } => set_liveness(&client, &cli.url, index, true).await?,
        Commands::Disable { index } => set_liveness(&client, &cli.url, index, false).await?,
    };
    print_response(res).await?;

    Ok(())
}

async fn set_liveness(
    client: &reqwest::Client,
    url: &str,
    index: usize,
    alive: bool,
) -> Result<reqwest::Response, reqwest::Error> {
    client
        .put(format!("{}/admin/backends/{}/liveness", url, index))
        .json(&json!({ "alive": alive }))
        .send()
        .await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
