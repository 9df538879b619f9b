use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use colored::*;
use query_api_bench::benchmark::progress_bar;
use query_api_bench::config::{
    DEFAULT_MAX_WORKERS, DEFAULT_NETWORK_TIMEOUT_SECS, DEFAULT_NUM_REQUESTS,
};
use query_api_bench::report::{render_table, write_chart};
use query_api_bench::{BenchConfig, BenchmarkKind, BenchmarkResults, BenchmarkRunner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "query-api-bench")]
#[command(about = "Benchmark the Neo4j Query API under different transaction strategies", long_about = None)]
struct Args {
    /// Benchmarks to run, in order (repeatable)
    #[arg(short, long = "tests", value_enum, required = true)]
    tests: Vec<BenchmarkKind>,

    /// Times to execute the statement per benchmark
    #[arg(short, long, env = "NUM_REQUESTS", default_value_t = DEFAULT_NUM_REQUESTS)]
    num_requests: usize,

    /// Query API base url, e.g. https://xxxx.databases.neo4j.io
    #[arg(long, env = "NEO4J_URL")]
    neo4j_url: String,

    #[arg(long, env = "NEO4J_USERNAME")]
    neo4j_usr: String,

    #[arg(long, env = "NEO4J_PASSWORD", hide_env_values = true)]
    neo4j_pwd: String,

    #[arg(long, env = "NEO4J_DATABASE")]
    neo4j_db: String,

    /// Cypher statement to execute
    #[arg(long, env = "NEO4J_CYPHER")]
    neo4j_cypher: String,

    /// Save a bar chart of the results as an SVG file
    #[arg(long, env = "OUTPUT_GRAPH", default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    output_graph: bool,

    /// Print a results table
    #[arg(long, env = "OUTPUT_TABLE", default_value_t = true, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    output_table: bool,

    /// Per-request timeout in seconds
    #[arg(long, env = "NETWORK_TIMEOUT", default_value_t = DEFAULT_NETWORK_TIMEOUT_SECS)]
    network_timeout: u64,

    /// Worker pool size for the Threads benchmarks
    #[arg(long, env = "MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Use HTTP/2 so concurrent requests share connections
    #[arg(long, env = "NETWORK_HTTP2", default_value_t = false, action = ArgAction::Set, value_parser = BoolishValueParser::new())]
    network_http2: bool,

    /// Directory the results chart is written to
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,
}

impl Args {
    fn into_config(self) -> (Vec<BenchmarkKind>, BenchConfig) {
        let config = BenchConfig {
            url: self.neo4j_url,
            username: self.neo4j_usr,
            password: self.neo4j_pwd,
            database: self.neo4j_db,
            statement: self.neo4j_cypher,
            repetitions: self.num_requests,
            timeout: Duration::from_secs(self.network_timeout),
            workers: self.max_workers,
            multiplexed: self.network_http2,
            output_table: self.output_table,
            output_graph: self.output_graph,
            output_dir: self.output_dir,
        };
        (self.tests, config)
    }
}

#[tokio::main]
async fn main() {
    // Values from .env act as defaults for the env-backed flags
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "query_api_bench=warn,query_api_client=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(Args::parse()).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let (tests, config) = args.into_config();
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");

    let runner = BenchmarkRunner::new(config);
    let mut results = BenchmarkResults::new();

    for kind in tests {
        let pb = progress_bar(&kind.progress_label(), runner.config().repetitions as u64);
        let elapsed = runner
            .run(kind, Arc::new(pb))
            .await
            .with_context(|| {
                format!(
                    "{} benchmark against {} failed",
                    kind,
                    runner.config().url
                )
            })?;
        results.record(kind.label(), elapsed);
    }

    let config = runner.config();

    if config.output_graph {
        let path = write_chart(&results, &config.output_dir)?;
        println!(
            "\n {} {}\n",
            "Results graph saved as".green(),
            path.display().to_string().cyan()
        );
    }

    if config.output_table {
        println!("{}", render_table(&results, config.repetitions));
    }

    Ok(())
}
