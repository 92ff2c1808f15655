//! Billing CLI
//!
//! Command-line front end for the billing payments layer. Talks to the
//! database directly and prints results as JSON.

mod config;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use billing_hex::{PaymentService, build_service};
use billing_types::{
    AccountContext, BulkAction, Page, PaymentInput, PaymentStore, PaymentTypeId, PublicId,
};

use config::{Config, LogFormat};

const DEFAULT_LOG_FILTER: &str = "info,billing_hex=debug,billing_repo=debug";

#[derive(Parser)]
#[command(name = "billing")]
#[command(author, version, about = "Billing payments CLI", long_about = None)]
struct Cli {
    /// Database URL
    #[arg(long, global = true, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Account id
    #[arg(long, global = true, env = "BILLING_ACCOUNT_ID")]
    account: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// Builds the configuration; flag or env values clap already resolved
    /// win, everything else comes from `lookup`.
    fn config(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
        Config::from_vars(|key| match key {
            "DATABASE_URL" => self.database_url.clone(),
            "BILLING_ACCOUNT_ID" => self.account.clone(),
            _ => lookup(key),
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List payments
    List {
        /// Only payments of this client (public id)
        #[arg(long)]
        client: Option<i64>,
        /// Case-insensitive client name filter
        #[arg(long)]
        filter: Option<String>,
        /// Include archived payments
        #[arg(long)]
        trash: bool,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long, default_value_t = 0)]
        offset: i64,
    },
    /// Record a new payment
    Create(PaymentArgs),
    /// Update an existing payment
    Update {
        /// Payment public id
        id: i64,
        #[command(flatten)]
        payment: PaymentArgs,
    },
    /// Flag payments as deleted and move them to the trash
    Delete {
        /// Payment public ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Move payments to the trash
    Archive {
        /// Payment public ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Show a client's unused credit
    Credit {
        /// Client public id
        #[arg(long)]
        client: i64,
    },
}

#[derive(Args)]
struct PaymentArgs {
    /// Client public id
    #[arg(long)]
    client: Option<String>,
    /// Invoice public id (-1 for none)
    #[arg(long)]
    invoice: Option<String>,
    /// Amount, e.g. "1,250.00"
    #[arg(long)]
    amount: Option<String>,
    /// Payment type id (1 applies client credit)
    #[arg(long)]
    payment_type: Option<i64>,
    /// Payment date in the account date format
    #[arg(long)]
    date: Option<String>,
    #[arg(long)]
    reference: Option<String>,
}

impl From<PaymentArgs> for PaymentInput {
    fn from(args: PaymentArgs) -> Self {
        PaymentInput {
            client: args.client,
            invoice: args.invoice,
            amount: args.amount,
            payment_type_id: args.payment_type.map(PaymentTypeId::from_raw),
            payment_date: args.date,
            transaction_reference: args.reference,
        }
    }
}

fn parse_public_id(v: i64) -> Result<PublicId> {
    PublicId::new(v).map_err(|e| anyhow::anyhow!("{}", e))
}

fn parse_public_ids(ids: &[i64]) -> Result<Vec<PublicId>> {
    ids.iter().copied().map(parse_public_id).collect()
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout stays valid JSON
    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = cli.config(|key| std::env::var(key).ok())?;

    init_tracing(config.log_format);
    tracing::debug!(account_id = %config.account_id, "configuration loaded");

    let service = build_service(&config.database_url).await?;
    let ctx = AccountContext::new(config.account_id).with_date_format(config.date_format);

    run(&service, ctx, cli.command).await
}

async fn run<S: PaymentStore>(
    service: &PaymentService<S>,
    ctx: AccountContext,
    command: Commands,
) -> Result<()> {
    match command {
        Commands::List {
            client,
            filter,
            trash,
            limit,
            offset,
        } => {
            let ctx = ctx.with_trash(trash);
            let client = client.map(parse_public_id).transpose()?;
            let query = service.find(&ctx, client, filter.as_deref());
            let page = limit.map(|limit| Page::new(limit, offset));

            let total = service.count(&query).await?;
            let payments = service.list(&query, page).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "total": total,
                    "payments": payments,
                }))?
            );
        }

        Commands::Create(args) => {
            let payment = service.submit(&ctx, None, args.into()).await?;
            println!("{}", serde_json::to_string_pretty(&payment)?);
        }

        Commands::Update { id, payment } => {
            let id = parse_public_id(id)?;
            let payment = service.submit(&ctx, Some(id), payment.into()).await?;
            println!("{}", serde_json::to_string_pretty(&payment)?);
        }

        Commands::Delete { ids } => {
            let ids = parse_public_ids(&ids)?;
            let processed = service.bulk(&ctx, &ids, BulkAction::Delete).await?;
            println!("{}", serde_json::json!({ "processed": processed }));
        }

        Commands::Archive { ids } => {
            let ids = parse_public_ids(&ids)?;
            let processed = service.bulk(&ctx, &ids, BulkAction::Archive).await?;
            println!("{}", serde_json::json!({ "processed": processed }));
        }

        Commands::Credit { client } => {
            let client = parse_public_id(client)?;
            let credit = service.available_credit(&ctx, client).await?;
            println!(
                "{}",
                serde_json::json!({
                    "client": client,
                    "available_credit": credit,
                    "display": credit.to_string(),
                })
            );
        }
    }

    Ok(())
}
