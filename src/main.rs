//! `Reformed Chapter` - browse Bible study resources from the command line.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reformed_chapter::browse::{BrowseSession, Selection};
use reformed_chapter::catalog;
use reformed_chapter::config::Config;
use reformed_chapter::constants::payment::PRESET_AMOUNTS;
use reformed_chapter::filter::Filters;
use reformed_chapter::matching::{MatchResult, TypeBuckets};
use reformed_chapter::payment::{self, DonationRequest, StripeClient};
use reformed_chapter::reference::{parse_fields, parse_reference};
use reformed_chapter::store;
use reformed_chapter::submission::{self, SubmissionForm};
use reformed_chapter::types::{PriceBucket, ResourceType, SortOrder};

#[derive(Parser)]
#[command(name = "reformed-chapter", version, about = "Chapter-by-chapter Bible study resources")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a scripture citation and print its fields
    Parse {
        /// Citation, e.g. "Romans 8:28-9:5"
        citation: String,
    },
    /// Resources for one chapter
    Chapter {
        /// Book name, abbreviation or slug ("Romans", "1 Cor", "song-of-solomon")
        book: String,
        /// Chapter number
        chapter: u32,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Resources by author, across all books
    Author {
        /// Author names
        #[arg(required = true)]
        names: Vec<String>,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// List the books of the Bible
    Books,
    /// Submit a resource for review from a JSON form
    Submit {
        /// Path to a JSON object with the form fields
        form: PathBuf,
    },
    /// Create a donation payment intent
    Donate {
        /// Amount in dollars; omit to list the preset amounts
        amount: Option<String>,
        /// Currency code (defaults to DONATION_CURRENCY)
        #[arg(long)]
        currency: Option<String>,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// Only these types (sermons, commentaries, devotionals, books, videos)
    #[arg(long = "type", value_name = "TYPE")]
    types: Vec<String>,
    /// Only these authors
    #[arg(long = "author", value_name = "AUTHOR")]
    authors: Vec<String>,
    /// Only free or paid resources
    #[arg(long, value_name = "free|paid")]
    price: Vec<PriceBucket>,
    /// default, scripture, alphabetical, newest, oldest
    #[arg(long, default_value = "default")]
    sort: SortOrder,
}

impl ViewArgs {
    fn filters(&self) -> anyhow::Result<Filters> {
        let mut filters = Filters::default();
        if !self.types.is_empty() {
            filters.types = self
                .types
                .iter()
                .map(|t| match ResourceType::from_raw(t) {
                    ResourceType::Unknown => bail!("unknown resource type {t:?}"),
                    known => Ok(known),
                })
                .collect::<anyhow::Result<BTreeSet<_>>>()?;
        }
        filters.authors = self
            .authors
            .iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();
        filters.price = self.price.iter().copied().collect();
        Ok(filters)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "reformed_chapter=debug"
    } else {
        "reformed_chapter=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Parse { citation } => {
            let fields = parse_fields(&citation);
            println!("{}", serde_json::to_string_pretty(&fields)?);
            parse_reference(&citation)?;
        }
        Commands::Chapter { book, chapter, view } => {
            let selection = Selection::from_slug(&book, chapter)
                .or_else(|| catalog::resolve_book(&book).map(|b| Selection::chapter(b.name, chapter)))
                .with_context(|| format!("unknown book {book:?}"))?;
            let name = selection.book.clone().unwrap_or_default();
            if !catalog::find(&name).is_some_and(|b| b.has_chapter(chapter)) {
                bail!("{name} has no chapter {chapter}");
            }
            browse(&selection, &view, &format!("{name} {chapter}")).await?;

            match catalog::adjacent_chapters(&name, chapter) {
                (Some(prev), Some(next)) => println!("\n< {name} {prev} | {name} {next} >"),
                (Some(prev), None) => println!("\n< {name} {prev}"),
                (None, Some(next)) => println!("\n{name} {next} >"),
                (None, None) => {}
            }
        }
        Commands::Author { names, view } => {
            let selection = Selection::authors(&names);
            let heading = selection.authors.iter().cloned().collect::<Vec<_>>().join(", ");
            browse(&selection, &view, &heading).await?;
        }
        Commands::Books => {
            for book in catalog::books() {
                println!("{:<18} {:>3}  /{}", book.name, book.chapters, book.slug());
            }
        }
        Commands::Submit { form } => {
            let content = fs_err::read_to_string(&form)?;
            let form: SubmissionForm = serde_json::from_str(&content)
                .with_context(|| format!("invalid submission form {}", form.display()))?;
            let config = Config::load()?;
            let store = store::from_config(&config)?;
            let pending = submission::submit(store.as_ref(), form).await?;
            println!(
                "Submitted \"{}\" ({} {}) for review",
                pending.title, pending.kind, pending.book
            );
        }
        Commands::Donate { amount, currency } => {
            let Some(amount) = amount else {
                let presets: Vec<String> = PRESET_AMOUNTS.iter().map(|a| format!("${a}")).collect();
                println!("Preset amounts: {}", presets.join(", "));
                return Ok(());
            };
            let config = Config::load()?;
            let currency = currency.unwrap_or_else(|| config.currency.clone());
            let request = DonationRequest::from_dollars(&amount, currency)?;
            let intent = payment::donate(&StripeClient::new(&config), request).await?;
            println!("payment_intent: {}", intent.payment_intent_id);
            println!("client_secret:  {}", intent.client_secret);
        }
    }

    Ok(())
}

/// Fetch, match and print one selection.
async fn browse(selection: &Selection, view: &ViewArgs, heading: &str) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = store::from_config(&config)?;
    let mut session = BrowseSession::new(store);
    session.filters = view.filters()?;
    session.sort = view.sort;

    session.select(selection);
    session.settle().await;
    if let Some(message) = session.error_message.take() {
        bail!(message);
    }

    let Some(results) = session.view() else {
        return Ok(());
    };
    print_results(heading, &results);
    Ok(())
}

fn print_results(heading: &str, results: &MatchResult<'_>) {
    println!("{heading}");
    if results.is_empty() {
        println!("  No resources found.");
        return;
    }
    print_buckets("Primary", &results.primary);
    print_buckets("Also referenced", &results.secondary);
    print_buckets("By author", &results.author_only);
}

fn print_buckets(section: &str, buckets: &TypeBuckets<'_>) {
    if buckets.is_empty() {
        return;
    }
    println!("\n{section}");
    for (kind, list) in buckets.iter().filter(|(_, list)| !list.is_empty()) {
        println!("  {} ({})", kind.label(), list.len());
        for resource in list {
            let author = resource.author_name().map(|a| format!(" by {a}")).unwrap_or_default();
            let price = match resource.price_bucket() {
                PriceBucket::Free => "free",
                PriceBucket::Paid => "paid",
            };
            println!(
                "    {}{author} [{}] ({price})",
                resource.title,
                resource.reference_label()
            );
        }
    }
}
