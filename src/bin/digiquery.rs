//! digiquery - compile a search from the command line.
//!
//! Reads a serialized search (or a legacy `digikamsearch:` URL) and prints
//! the compiled SQL fragment, its bound values and the number of
//! post-filters as JSON. With `--database` the search is also run against
//! an item database and the matching ids are printed.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use digiquery::db;
use digiquery::query::SqlParam;
use digiquery::searchxml::{keyword, KeywordSearchWriter};
use digiquery::{BuilderConfig, ImageQueryBuilder};

#[derive(Parser, Debug)]
#[command(name = "digiquery", version, about = "Compile photo library searches to SQL")]
struct Cli {
    /// Search document or legacy search URL; read from stdin when absent
    query: Option<String>,

    /// TOML file with builder settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the search document converted from a legacy URL instead of compiling
    #[arg(long)]
    convert: bool,

    /// Build a keyword search from free text instead of reading a query
    #[arg(short, long, conflicts_with = "query")]
    keywords: Option<String>,

    /// Run the search against this item database
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[derive(Serialize)]
struct Output<'a> {
    sql: &'a str,
    bound_values: &'a [SqlParam],
    post_filters: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    matches: Option<Vec<i64>>,
}

fn main() -> anyhow::Result<()> {
    // logs go to stderr, stdout carries the result
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "digiquery=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => BuilderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BuilderConfig::default(),
    };
    let builder = ImageQueryBuilder::with_config(Arc::new(config));

    let query = match (&cli.keywords, &cli.query) {
        (Some(text), _) => {
            let keywords = keyword::split(text);
            debug!("Keywords: {:?}", keywords);
            KeywordSearchWriter::new().xml(keywords.as_slice())
        }
        (None, Some(query)) => query.clone(),
        (None, None) => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read search from stdin")?;
            input.trim().to_string()
        }
    };

    if cli.convert {
        match builder.convert_from_url_to_xml(&query)? {
            Some(xml) => println!("{}", xml),
            None => bail!("Search URL declares no rules"),
        }
        return Ok(());
    }

    let database = cli
        .database
        .as_deref()
        .map(db::open_database)
        .transpose()
        .context("Failed to open item database")?;

    let compiled = match &database {
        Some(database) => builder.build_query_with(&query, database.conn()),
        None => builder.build_query(&query),
    };

    let matches = match &database {
        Some(database) => {
            let ids = db::search_image_ids(database.conn(), &compiled)?;
            info!("Search matched {} items", ids.len());
            Some(ids)
        }
        None => None,
    };

    let output = Output {
        sql: &compiled.sql,
        bound_values: &compiled.bound_values,
        post_filters: compiled.hooks.len(),
        matches,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
