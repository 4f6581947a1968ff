//! platebook-cli — operator CLI for the Platebook HTTP API
//!
//! Drives the same operations a chat bridge does, from a terminal:
//!
//! # Subcommands
//! - `open`                              — open a new session
//! - `close`                             — close the active session, print totals
//! - `order --user U <plate> <quantity>` — save an order line
//! - `say --user U <text>`               — send raw chat text (commands or orders)
//! - `search <session_id>`               — totals of any session
//! - `list [-n <limit>]`                 — recent sessions
//! - `status`                            — server health

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8787";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(name = "platebook-cli", version, about = "Platebook group order CLI")]
struct Cli {
    /// Platebook HTTP server URL (overrides PLATEBOOK_HTTP_URL env var)
    #[arg(long, env = "PLATEBOOK_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// Print the raw JSON response instead of the reply text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Open a new ordering session
    Open,

    /// Close the active session and print the consolidated totals
    Close,

    /// Save an order line for a user
    Order {
        /// Chat username the order belongs to
        #[arg(short, long)]
        user: String,

        /// Plate number
        plate: String,

        /// Quantity to add
        quantity: String,
    },

    /// Send raw chat text as a user
    Say {
        #[arg(short, long)]
        user: String,

        /// Message text, e.g. "/close-session" or "3 2"
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },

    /// Show the totals of a session
    Search {
        /// Session ID
        session_id: String,
    },

    /// List recent sessions
    List {
        /// Maximum number of sessions
        #[arg(short = 'n', long)]
        limit: Option<u32>,
    },

    /// Show Platebook server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

/// Body returned by every order endpoint.
#[derive(Debug, Deserialize)]
pub struct PlatebookReply {
    pub status: String,
    pub reply: Option<String>,
    pub error: Option<String>,
}

/// Text to show the operator for a response body.
pub fn render_reply(body: &serde_json::Value) -> String {
    match serde_json::from_value::<PlatebookReply>(body.clone()) {
        Ok(PlatebookReply { reply: Some(reply), .. }) => reply,
        Ok(PlatebookReply { error: Some(error), .. }) => format!("error: {}", error),
        Ok(PlatebookReply { status, .. }) => status,
        Err(_) => body.to_string(),
    }
}

/// Join the plate and quantity the way a chat user would type them.
pub fn order_text(plate: &str, quantity: &str) -> String {
    format!("{} {}", plate.trim(), quantity.trim())
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

struct Client {
    http: reqwest::blocking::Client,
    server: String,
}

impl Client {
    fn new(server: &str) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            server: server.trim_end_matches('/').to_string(),
        })
    }

    fn get(&self, path: &str) -> anyhow::Result<(reqwest::StatusCode, serde_json::Value)> {
        let url = format!("{}{}", self.server, path);
        let resp = self.http.get(&url).send().map_err(|e| {
            anyhow::anyhow!("connection failed to {}: {}", url, e)
        })?;
        let status = resp.status();
        Ok((status, resp.json().unwrap_or_default()))
    }

    fn post(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> anyhow::Result<(reqwest::StatusCode, serde_json::Value)> {
        let url = format!("{}{}", self.server, path);
        let mut req = self.http.post(&url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req
            .send()
            .map_err(|e| anyhow::anyhow!("connection failed to {}: {}", url, e))?;
        let status = resp.status();
        Ok((status, resp.json().unwrap_or_default()))
    }
}

/// Print a response; non-2xx statuses still print the reply but fail the process.
fn print_response(
    (status, body): (reqwest::StatusCode, serde_json::Value),
    json_output: bool,
) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", render_reply(&body));
    }

    if status.is_server_error() {
        anyhow::bail!("server returned {}", status);
    }
    if !status.is_success() {
        std::process::exit(2);
    }
    Ok(())
}

fn do_status(client: &Client) -> anyhow::Result<()> {
    let (status, body) = client.get("/health")?;
    if !status.is_success() {
        anyhow::bail!("server unhealthy (HTTP {})", status);
    }
    println!("Platebook server: {}", body["status"].as_str().unwrap_or("unknown"));
    println!("Version:          {}", body["version"].as_str().unwrap_or("?"));
    println!("SQLite:           {}", body["sqlite"].as_str().unwrap_or("?"));
    println!(
        "Active session:   {}",
        body["active_session"].as_str().unwrap_or("none")
    );
    println!("Socket:           {}", body["socket"].as_str().unwrap_or("?"));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn run(cli: Cli) -> anyhow::Result<()> {
    let client = Client::new(&cli.server)?;
    let json = cli.json;

    match cli.command {
        Commands::Open => print_response(client.post("/sessions", None)?, json),
        Commands::Close => print_response(client.post("/sessions/close", None)?, json),
        Commands::Order { user, plate, quantity } => {
            let body = serde_json::json!({ "user": user, "text": order_text(&plate, &quantity) });
            print_response(client.post("/orders", Some(body))?, json)
        }
        Commands::Say { user, text } => {
            let body = serde_json::json!({ "user": user, "text": text.join(" ") });
            print_response(client.post("/message", Some(body))?, json)
        }
        Commands::Search { session_id } => {
            let path = format!("/sessions/{}/totals", session_id.trim());
            print_response(client.get(&path)?, json)
        }
        Commands::List { limit } => {
            let path = match limit {
                Some(n) => format!("/sessions?limit={}", n),
                None => "/sessions".to_string(),
            };
            print_response(client.get(&path)?, json)
        }
        Commands::Status => do_status(&client),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("platebook-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================
