//! rqlite-cli
//!
//! Command-line client for rqlite clusters.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

use rqlite_client::prelude::*;

/// Command-line client for rqlite.
#[derive(Parser, Debug)]
#[command(name = "rqlite-cli")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Connection URL, e.g. `rqlite://localhost:4001?level=strong`.
    #[arg(short, long, env = "RQLITE_URL", conflicts_with_all = ["peers", "host"])]
    url: Option<String>,

    /// Peer list file with one `scheme,host,port` per line.
    #[arg(short, long, env = "RQLITE_PEERS", conflicts_with = "host")]
    peers: Option<PathBuf>,

    /// Node host.
    #[arg(long, env = "RQLITE_HOST", default_value = "localhost")]
    host: String,

    /// Node port.
    #[arg(long, default_value_t = 4001)]
    port: u16,

    /// Use HTTPS.
    #[arg(long)]
    https: bool,

    /// HTTP request timeout in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run statements that change data.
    Execute {
        /// SQL statements, run in order.
        #[arg(required = true)]
        sql: Vec<String>,

        /// Run all statements in one transaction.
        #[arg(short, long)]
        transaction: bool,

        /// Queue the write.
        #[arg(long)]
        queue: bool,

        /// With --queue, wait until the write is applied.
        #[arg(long, requires = "queue")]
        wait: bool,
    },

    /// Run statements that return rows.
    Query {
        /// SQL statements, run in order.
        #[arg(required = true)]
        sql: Vec<String>,

        /// Read consistency: none, weak or strong.
        #[arg(short, long)]
        level: Option<ConsistencyLevel>,

        /// Freshness bound in milliseconds for `none` reads.
        #[arg(long)]
        freshness_ms: Option<u64>,

        /// Run all statements in one transaction.
        #[arg(short, long)]
        transaction: bool,
    },

    /// Check that the cluster answers.
    Ping,
}

impl Cli {
    fn config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = if let Some(url) = &self.url {
            ClientConfig::from_url(url)?
        } else if let Some(peers) = &self.peers {
            ClientConfig::from_peer_file(peers)
                .with_context(|| format!("loading peers from {}", peers.display()))?
        } else {
            let scheme = if self.https { Scheme::Https } else { Scheme::Http };
            ClientConfig::for_node(scheme, &self.host, self.port)
        };
        if let Some(secs) = self.timeout {
            config = config.timeout(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.config()?;
    debug!(nodes = config.registry.len(), "Client configured");
    let client = Client::connect(config)?;

    match cli.command {
        Commands::Execute {
            sql,
            transaction,
            queue,
            wait,
        } => {
            let request = ExecuteRequest::new()
                .statements(sql)
                .transaction(transaction)
                .timings(true)
                .queue(queue)
                .wait(wait);
            let results = client.execute(&request)?;
            print_execute(&results);
        }

        Commands::Query {
            sql,
            level,
            freshness_ms,
            transaction,
        } => {
            let mut request = QueryRequest::new()
                .statements(sql)
                .transaction(transaction)
                .level(level.unwrap_or_else(|| client.default_level()));
            if let Some(ms) = freshness_ms {
                request = request.freshness(Duration::from_millis(ms));
            }
            let results = client.query(&request)?;
            print_query(&results);
        }

        Commands::Ping => {
            let pong = client.ping()?;
            println!(
                "PONG (version {})",
                pong.version.as_deref().unwrap_or("unknown")
            );
            println!("{}", serde_json::to_string_pretty(&pong.status)?);
        }
    }

    Ok(())
}

fn print_execute(results: &ExecuteResults) {
    if let Some(err) = &results.error {
        println!("ERROR: {err}");
    }
    if let Some(seq) = results.sequence_number {
        println!("queued (sequence number {seq})");
    }
    for (i, result) in results.results.iter().enumerate() {
        match &result.error {
            Some(err) => println!("[{i}] ERROR: {err}"),
            None => println!(
                "[{i}] {} row(s) affected, last insert id {} ({:.6}s)",
                result.rows_affected, result.last_insert_id, result.time
            ),
        }
    }
}

fn print_query(results: &QueryResults) {
    if let Some(err) = &results.error {
        println!("ERROR: {err}");
    }
    for (i, result) in results.results.iter().enumerate() {
        if let Some(err) = &result.error {
            println!("[{i}] ERROR: {err}");
            continue;
        }
        println!("{}", result.columns.join(" | "));
        println!("{:-<60}", "");
        for row in result.rows() {
            let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
            println!("{}", cells.join(" | "));
        }
        println!();
    }
}
