use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Command-line client for the generation relay", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5001")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a prompt (and optional images) and print the generated text
    Generate {
        /// Upstream API key, sent as X-API-Key
        #[arg(short, long, env = "GEMINI_API_KEY")]
        key: String,

        #[arg(short, long)]
        prompt: String,

        /// Image files to attach, in order
        #[arg(short, long = "image")]
        images: Vec<PathBuf>,
    },
    /// Check relay liveness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Generate {
            key,
            prompt,
            images,
        } => {
            let mut encoded = Vec::with_capacity(images.len());
            for path in &images {
                let bytes = tokio::fs::read(path).await?;
                encoded.push(STANDARD.encode(bytes));
            }

            let res = client
                .post(format!("{}/api/ai/generate", cli.url))
                .header("X-API-Key", key)
                .json(&json!({ "prompt": prompt, "images": encoded }))
                .send()
                .await?;
            print_generation(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}

async fn print_generation(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let json: Value = res.json().await?;

    if !status.is_success() {
        let message = json["error"].as_str().unwrap_or("unknown error");
        eprintln!("Error ({}): {}", status, message);
        std::process::exit(1);
    }

    println!("{}", json["text"].as_str().unwrap_or_default());
    Ok(())
}
