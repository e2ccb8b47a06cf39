use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Query a running appointment router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Preferred node id
    #[arg(short, long)]
    node: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Node availability
    Status,
    /// Number of appointments across shards
    Size,
    /// Fetch one appointment
    Get { apptid: String },
    /// List a page of appointments
    List {
        #[arg(long, default_value_t = 10)]
        items_per_page: usize,
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        "x-request-id",
        HeaderValue::from_str(&Uuid::new_v4().to_string())?,
    );

    let mut query: Vec<(&str, String)> = Vec::new();
    if let Some(node) = cli.node {
        query.push(("node", node.to_string()));
    }

    let request = match &cli.command {
        Commands::Status => client.get(format!("{}/status", cli.url)),
        Commands::Size => client
            .get(format!("{}/appointments/size", cli.url))
            .query(&query),
        Commands::Get { apptid } => client
            .get(format!("{}/appointments/{}", cli.url, apptid))
            .query(&query),
        Commands::List {
            items_per_page,
            page,
        } => {
            query.push(("itemsPerPage", items_per_page.to_string()));
            query.push(("page", page.to_string()));
            client.get(format!("{}/appointments", cli.url)).query(&query)
        }
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: router returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
