use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "bughuntr-cli")]
#[command(about = "Command line client for the BugHuntr gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "BUGHUNTR_URL", default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a new bug report
    Submit {
        #[arg(short, long)]
        description: String,
        #[arg(short, long)]
        proof_of_concept: String,
    },
    /// List the reports submitted by an address
    List { address: String },
    /// Show a single report
    Report { id: String },
    /// Approve a report with a severity between 1 and 5
    Approve {
        id: String,
        #[arg(short, long)]
        severity: i64,
    },
    /// Reject a pending report
    Reject { id: String },
    /// Claim the reward of an approved report
    Claim { id: String },
    /// Look up a transaction by hash
    Tx { hash: String },
    /// Check gateway and node health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Submit {
            description,
            proof_of_concept,
        } => client
            .post(format!("{}/api/reports", base))
            .json(&json!({ "description": description, "proofOfConcept": proof_of_concept })),
        Commands::List { address } => client.get(format!("{}/api/reports/{}", base, address)),
        Commands::Report { id } => client.get(format!("{}/api/report/{}", base, id)),
        Commands::Approve { id, severity } => client
            .post(format!("{}/api/reports/{}/approve", base, id))
            .json(&json!({ "severity": severity })),
        Commands::Reject { id } => client.post(format!("{}/api/reports/{}/reject", base, id)),
        Commands::Claim { id } => client.post(format!("{}/api/reports/{}/claim", base, id)),
        Commands::Tx { hash } => client.get(format!("{}/api/transactions/{}", base, hash)),
        Commands::Health => client.get(format!("{}/health", base)),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("{}", body);
        std::process::exit(1);
    }
    Ok(())
}
