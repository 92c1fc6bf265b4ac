use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use url::Url;

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Management CLI for the MQTT-HTTP bridge", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check connection status
    Status,
    /// List active routes
    Routes,
    /// Route a topic to an HTTP endpoint
    AddRoute {
        topic: String,
        url: String,
        #[arg(short, long, default_value = "GET")]
        method: String,
        #[arg(short, long)]
        response_topic: Option<String>,
        /// Read method, url and data from each message
        #[arg(short, long)]
        dynamic: bool,
    },
    /// Remove the route for a topic
    RemoveRoute { topic: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = Url::parse(&cli.url)?;

    match cli.command {
        Commands::Status => {
            let res = client.get(base.join("admin/status")?).send().await?;
            print_response(res).await?;
        }
        Commands::Routes => {
            let res = client.get(base.join("admin/routes")?).send().await?;
            print_response(res).await?;
        }
        Commands::AddRoute { topic, url, method, response_topic, dynamic } => {
            let body = json!({
                "topic": topic,
                "url": url,
                "method": method,
                "responseTopic": response_topic,
                "dynamic": dynamic,
            });
            let res = client.post(base.join("admin/routes")?).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::RemoveRoute { topic } => {
            let res = client.delete(route_url(&base, &topic)?).send().await?;
            if res.status().is_success() {
                println!("Removed route for {}", topic);
            } else {
                eprintln!("Error: Admin API returned status {}", res.status());
            }
        }
    }

    Ok(())
}

/// `/admin/routes/<topic>`, keeping the topic's `/` levels as path segments.
fn route_url(base: &Url, topic: &str) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| "admin URL cannot be a base")?
        .pop_if_empty()
        .extend(["admin", "routes"])
        .extend(topic.split('/'));
    Ok(url)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
