use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use event_gate::auth::{Principal, Role, TokenAuthenticator};

#[derive(Parser)]
#[command(name = "gate-cli")]
#[command(about = "Operator CLI for the event gate", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a signed token for a principal
    Issue {
        #[arg(long)]
        sub: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        /// admin, judge, supervisor, participant, master or expert
        #[arg(long)]
        role: Role,
        #[arg(long, default_value_t = 86_400)]
        ttl_secs: u64,
        /// Signing secret; read from JWT_SECRET when omitted
        #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Show the principal a token resolves to
    Whoami {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
        #[arg(short, long)]
        token: String,
    },
    /// Check gate liveness
    Health {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Issue { sub, email, name, role, ttl_secs, secret } => {
            let authenticator = TokenAuthenticator::new(Some(&secret));
            let principal = Principal::new(sub, email, name, role);
            let token = authenticator.issue(&principal, Duration::from_secs(ttl_secs))?;
            println!("{token}");
        }
        Commands::Whoami { url, token } => {
            let mut headers = HeaderMap::new();
            headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
            let res = reqwest::Client::new()
                .get(format!("{url}/api/auth/me"))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health { url } => {
            let res = reqwest::get(format!("{url}/health")).await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gate returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
