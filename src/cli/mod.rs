use std::fs::File;
use std::io::{self, Write};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::application::{CreditService, NewLend, ShopUpdate};
use crate::domain::{
    AggregateSummary, LendKind, Mobile, Shop, TransactionKind, User, format_cents,
    parse_amount,
};
use crate::io::Exporter;

/// CreditKeep - track credit with shops and money lent between people
#[derive(Parser)]
#[command(name = "creditkeep")]
#[command(about = "A local-first ledger for informal borrowing and lending")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "CREDITKEEP_DATABASE", default_value = "creditkeep.db")]
    pub database: String,

    /// Mobile number of the user acting on the ledger
    #[arg(short, long, env = "CREDITKEEP_USER", global = true)]
    pub user: Option<String>,

    /// Output format for read commands
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Check the database and show row counts
    Health,

    /// Account management
    #[command(subcommand)]
    User(UserCommands),

    /// Shop management
    #[command(subcommand)]
    Shop(ShopCommands),

    /// Record goods taken on credit at one of your shops
    Borrow {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Shop name or ID
        #[arg(long)]
        shop: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a payment at one of your shops
    Pay {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// Shop name or ID
        #[arg(long)]
        shop: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List your recent shop transactions
    Transactions {
        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Record a payment a customer made at your shop
    MarkPayment {
        amount: String,

        /// Customer mobile number
        #[arg(long)]
        borrower: String,

        /// Shop name or ID
        #[arg(long)]
        shop: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// Total balance, monthly activity and top shops
    Analytics,

    /// Record money lent to someone
    Lend {
        amount: String,

        /// Borrower name
        #[arg(long)]
        to: String,

        /// Borrower mobile number
        #[arg(long)]
        mobile: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// Record a repayment from someone you lent to
    Repay {
        amount: String,

        /// Borrower name
        #[arg(long)]
        from: String,

        /// Borrower mobile number
        #[arg(long)]
        mobile: String,

        #[arg(short, long)]
        description: Option<String>,

        /// Date (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,
    },

    /// List your recent lend/repayment records
    Lendings {
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// People who owe you money
    Borrowers,

    /// People you owe money to
    Borrowing,

    /// Look up balances by mobile number
    #[command(subcommand)]
    Lookup(LookupCommands),

    /// Customers of your shops
    Customers,

    /// Export data to CSV or JSON
    Export {
        /// What to export
        #[arg(value_enum)]
        export_type: ExportType,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Create an account
    Register {
        name: String,

        #[arg(long)]
        email: String,

        /// Ten-digit mobile number
        #[arg(long)]
        mobile: Option<String>,
    },

    /// Show the acting user
    Show,

    /// Change name, email or mobile of the acting user
    Update {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        mobile: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ShopCommands {
    /// Create a shop
    Create {
        name: String,

        #[arg(short, long)]
        description: Option<String>,
    },

    /// List your shops with balances
    List,

    /// Show one shop with its balance
    Show {
        /// Shop name or ID
        shop: String,
    },

    /// Edit a shop
    Update {
        /// Shop name or ID
        shop: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        mobile: Option<String>,

        #[arg(long)]
        address: Option<String>,
    },

    /// Delete a shop and its transactions
    Delete {
        /// Shop name or ID
        shop: String,
    },

    /// Your transactions at one shop
    Transactions {
        /// Shop name or ID
        shop: String,
    },
}

#[derive(Subcommand)]
pub enum LookupCommands {
    /// Everything lent to a mobile number (no account needed)
    Borrower { mobile: String },

    /// What a customer owes at each of your shops
    Customer { mobile: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportType {
    Transactions,
    Lendings,
    Borrowers,
    Full,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if matches!(self.command, Commands::Init) {
            let service = CreditService::init(&self.database).await?;
            service.close().await;
            println!("Database initialized: {}", self.database);
            return Ok(());
        }

        let service = CreditService::connect(&self.database).await?;
        let result = self.dispatch(&service).await;
        service.close().await;
        result
    }

    async fn dispatch(&self, service: &CreditService) -> Result<()> {
        let format = self.format;

        match &self.command {
            Commands::Init => unreachable!("handled before connecting"),

            Commands::Health => {
                let report = service.health().await?;
                if format == OutputFormat::Json {
                    return print_json(&report);
                }
                println!("Status:            {}", report.status);
                println!("Users:             {}", report.users);
                println!("Shops:             {}", report.shops);
                println!("Transactions:      {}", report.transactions);
                println!("Lend transactions: {}", report.lend_transactions);
            }

            Commands::User(cmd) => run_user_command(self, service, cmd).await?,

            Commands::Shop(cmd) => {
                let user = self.acting_user(service).await?;
                run_shop_command(service, &user, cmd, format).await?;
            }

            Commands::Borrow {
                amount,
                shop,
                description,
                date,
            }
            | Commands::Pay {
                amount,
                shop,
                description,
                date,
            } => {
                let kind = if matches!(self.command, Commands::Borrow { .. }) {
                    TransactionKind::Borrow
                } else {
                    TransactionKind::Payment
                };
                let user = self.acting_user(service).await?;
                let shop = resolve_shop(service, &user, shop).await?;
                let amount_cents = parse_amount(amount)
                    .with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", amount))?;
                let date = date.as_deref().map(parse_date).transpose()?;

                let result = service
                    .record_transaction(&user, shop.id, amount_cents, kind, description.clone(), date)
                    .await?;
                println!(
                    "Recorded {}: {} at {} ({})",
                    kind,
                    format_cents(result.transaction.amount_cents),
                    result.shop_name,
                    result.transaction.id
                );
            }

            Commands::Transactions { limit } => {
                let user = self.acting_user(service).await?;
                let rows = service.list_transactions(&user, *limit).await?;
                if format == OutputFormat::Json {
                    return print_json(&rows);
                }
                if rows.is_empty() {
                    println!("No transactions found.");
                    return Ok(());
                }
                println!(
                    "{:<12} {:<20} {:<8} {:>12}  {}",
                    "DATE", "SHOP", "TYPE", "AMOUNT", "DESCRIPTION"
                );
                println!("{}", "-".repeat(70));
                for row in rows {
                    let tx = row.transaction;
                    println!(
                        "{:<12} {:<20} {:<8} {:>12}  {}",
                        tx.transaction_date.format("%Y-%m-%d"),
                        truncate(&row.shop_name, 20),
                        tx.kind,
                        format_cents(tx.amount_cents),
                        tx.description
                    );
                }
            }

            Commands::MarkPayment {
                amount,
                borrower,
                shop,
                description,
            } => {
                let user = self.acting_user(service).await?;
                let shop = resolve_shop(service, &user, shop).await?;
                let customer = service.get_user_by_mobile(borrower).await?;
                let amount_cents = parse_amount(amount)
                    .with_context(|| format!("Invalid amount '{}'", amount))?;

                let tx = service
                    .mark_payment(&user, customer.id, shop.id, amount_cents, description.clone())
                    .await?;
                println!(
                    "Marked payment of {} from {} at {} ({})",
                    format_cents(tx.amount_cents),
                    customer.name,
                    shop.name,
                    tx.id
                );
            }

            Commands::Analytics => {
                let user = self.acting_user(service).await?;
                let report = service.analytics(&user, Utc::now()).await?;
                if format == OutputFormat::Json {
                    return print_json(&report);
                }
                println!("Total balance: {}", format_cents(report.total_balance));
                println!();
                println!("{:<10} {:>12} {:>12}", "MONTH", "BORROWED", "PAID");
                println!("{}", "-".repeat(36));
                for month in &report.monthly_spending {
                    println!(
                        "{:<10} {:>12} {:>12}",
                        month.month,
                        format_cents(month.increase),
                        format_cents(month.decrease)
                    );
                }
                if !report.top_shops.is_empty() {
                    println!();
                    println!("Top shops:");
                    for shop in &report.top_shops {
                        println!("  {:<24} {:>12}", truncate(&shop.name, 24), format_cents(shop.balance));
                    }
                }
            }

            Commands::Lend {
                amount,
                to,
                mobile,
                description,
                date,
            } => {
                let user = self.acting_user(service).await?;
                record_lend(service, &user, LendKind::Lend, amount, to, mobile, description, date)
                    .await?;
            }

            Commands::Repay {
                amount,
                from,
                mobile,
                description,
                date,
            } => {
                let user = self.acting_user(service).await?;
                record_lend(
                    service,
                    &user,
                    LendKind::Repayment,
                    amount,
                    from,
                    mobile,
                    description,
                    date,
                )
                .await?;
            }

            Commands::Lendings { limit } => {
                let user = self.acting_user(service).await?;
                let rows = service.list_lend_transactions(&user, *limit).await?;
                if format == OutputFormat::Json {
                    return print_json(&rows);
                }
                if rows.is_empty() {
                    println!("No lending records found.");
                    return Ok(());
                }
                println!(
                    "{:<12} {:<20} {:<12} {:<10} {:>12}",
                    "DATE", "BORROWER", "MOBILE", "TYPE", "AMOUNT"
                );
                println!("{}", "-".repeat(70));
                for lend in rows {
                    println!(
                        "{:<12} {:<20} {:<12} {:<10} {:>12}",
                        lend.transaction_date.format("%Y-%m-%d"),
                        truncate(&lend.borrower_name, 20),
                        lend.borrower_mobile,
                        lend.kind,
                        format_cents(lend.amount_cents)
                    );
                }
            }

            Commands::Borrowers => {
                let user = self.acting_user(service).await?;
                let report = service.my_borrowers(&user).await?;
                if format == OutputFormat::Json {
                    return print_json(&report);
                }
                println!(
                    "{:<20} {:<12} {:>12} {:>12} {:>12}",
                    "BORROWER", "MOBILE", "LENT", "REPAID", "OUTSTANDING"
                );
                println!("{}", "-".repeat(72));
                for b in &report.borrowers {
                    println!(
                        "{:<20} {:<12} {:>12} {:>12} {:>12}",
                        truncate(&b.display_name, 20),
                        b.counterparty,
                        format_cents(b.total_increase),
                        format_cents(b.total_decrease),
                        format_cents(b.outstanding)
                    );
                }
                print_summary(&report.summary, "borrowers");
            }

            Commands::Borrowing => {
                let user = self.acting_user(service).await?;
                let report = service.my_borrowing(&user).await?;
                print_borrowing(&report, format)?;
            }

            Commands::Lookup(LookupCommands::Borrower { mobile }) => {
                let report = service.borrower_details(mobile).await?;
                print_borrowing(&report, format)?;
            }

            Commands::Lookup(LookupCommands::Customer { mobile }) => {
                let user = self.acting_user(service).await?;
                let report = service.shop_borrower_lookup(&user, mobile).await?;
                if format == OutputFormat::Json {
                    return print_json(&report);
                }
                println!(
                    "Customer: {} ({})",
                    report.borrower.name,
                    report
                        .borrower
                        .mobile
                        .as_ref()
                        .map_or("-", Mobile::as_str)
                );
                println!();
                println!(
                    "{:<24} {:>12} {:>12} {:>12} {:<12}",
                    "SHOP", "BORROWED", "PAID", "OUTSTANDING", "LAST"
                );
                println!("{}", "-".repeat(76));
                for s in &report.shop_balances {
                    println!(
                        "{:<24} {:>12} {:>12} {:>12} {:<12}",
                        truncate(&s.display_name, 24),
                        format_cents(s.total_increase),
                        format_cents(s.total_decrease),
                        format_cents(s.outstanding),
                        s.last_activity_at.format("%Y-%m-%d")
                    );
                }
                print_summary(&report.summary, "shops");
            }

            Commands::Customers => {
                let user = self.acting_user(service).await?;
                let report = service.my_customers(&user).await?;
                if format == OutputFormat::Json {
                    return print_json(&report);
                }
                println!(
                    "{:<20} {:<12} {:>12} {:>12} {:>12}",
                    "CUSTOMER", "MOBILE", "BORROWED", "PAID", "OUTSTANDING"
                );
                println!("{}", "-".repeat(72));
                for c in &report.customers {
                    println!(
                        "{:<20} {:<12} {:>12} {:>12} {:>12}",
                        truncate(&c.balance.display_name, 20),
                        c.customer_mobile.as_ref().map_or("-", Mobile::as_str),
                        format_cents(c.balance.total_increase),
                        format_cents(c.balance.total_decrease),
                        format_cents(c.balance.outstanding)
                    );
                }
                print_summary(&report.summary, "customers");
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let user = self.acting_user(service).await?;
                run_export_command(service, &user, *export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }

    async fn acting_user(&self, service: &CreditService) -> Result<User> {
        let mobile = self
            .user
            .as_deref()
            .ok_or_else(|| anyhow!("No user selected. Pass --user <mobile> or set CREDITKEEP_USER"))?;
        let user = service.get_user_by_mobile(mobile).await?;
        debug!(user_id = %user.id, "acting user resolved");
        Ok(user)
    }
}

async fn run_user_command(cli: &Cli, service: &CreditService, cmd: &UserCommands) -> Result<()> {
    match cmd {
        UserCommands::Register {
            name,
            email,
            mobile,
        } => {
            let user = service
                .register_user(name.clone(), email.clone(), mobile.as_deref())
                .await?;
            println!("Registered {} <{}> ({})", user.name, user.email, user.id);
        }

        UserCommands::Show => {
            let user = cli.acting_user(service).await?;
            if cli.format == OutputFormat::Json {
                return print_json(&user);
            }
            println!("User: {}", user.name);
            println!("  ID:      {}", user.id);
            println!("  Email:   {}", user.email);
            println!("  Mobile:  {}", user.mobile.as_ref().map_or("-", Mobile::as_str));
            println!("  Joined:  {}", user.created_at.format("%Y-%m-%d"));
        }

        UserCommands::Update {
            name,
            email,
            mobile,
        } => {
            let user = cli.acting_user(service).await?;
            let mobile = mobile
                .as_deref()
                .or_else(|| user.mobile.as_ref().map(Mobile::as_str))
                .map(str::to_string);
            let updated = service
                .update_profile(
                    &user,
                    name.clone().unwrap_or_else(|| user.name.clone()),
                    email.clone().unwrap_or_else(|| user.email.clone()),
                    mobile.as_deref(),
                )
                .await?;
            println!("Updated profile: {} <{}>", updated.name, updated.email);
        }
    }

    Ok(())
}

async fn run_shop_command(
    service: &CreditService,
    user: &User,
    cmd: &ShopCommands,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        ShopCommands::Create { name, description } => {
            let shop = service
                .create_shop(user, name.clone(), description.clone())
                .await?;
            println!("Created shop: {} ({})", shop.name, shop.id);
        }

        ShopCommands::List => {
            let shops = service.list_shops(user).await?;
            if format == OutputFormat::Json {
                return print_json(&shops);
            }
            if shops.is_empty() {
                println!("No shops found.");
                return Ok(());
            }
            println!("{:<24} {:>12}  {}", "NAME", "BALANCE", "ID");
            println!("{}", "-".repeat(76));
            for entry in shops {
                println!(
                    "{:<24} {:>12}  {}",
                    truncate(&entry.shop.name, 24),
                    format_cents(entry.total_balance),
                    entry.shop.id
                );
            }
        }

        ShopCommands::Show { shop } => {
            let shop = resolve_shop(service, user, shop).await?;
            let info = service.get_shop(user, shop.id).await?;
            if format == OutputFormat::Json {
                return print_json(&info);
            }
            println!("Shop: {}", info.shop.name);
            println!("  ID:          {}", info.shop.id);
            if let Some(desc) = &info.shop.description {
                println!("  Description: {}", desc);
            }
            if let Some(mobile) = &info.shop.mobile {
                println!("  Mobile:      {}", mobile);
            }
            if let Some(address) = &info.shop.address {
                println!("  Address:     {}", address);
            }
            println!("  Created:     {}", info.shop.created_at.format("%Y-%m-%d"));
            println!("  Balance:     {}", format_cents(info.total_balance));
        }

        ShopCommands::Update {
            shop,
            name,
            description,
            mobile,
            address,
        } => {
            let shop = resolve_shop(service, user, shop).await?;
            let update = ShopUpdate {
                name: name.clone().unwrap_or_else(|| shop.name.clone()),
                description: description.clone().or_else(|| shop.description.clone()),
                mobile: mobile
                    .clone()
                    .or_else(|| shop.mobile.as_ref().map(Mobile::to_string)),
                address: address.clone().or_else(|| shop.address.clone()),
            };
            let updated = service.update_shop(user, shop.id, update).await?;
            println!("Updated shop: {}", updated.name);
        }

        ShopCommands::Delete { shop } => {
            let shop = resolve_shop(service, user, shop).await?;
            service.delete_shop(user, shop.id).await?;
            println!("Deleted shop: {}", shop.name);
        }

        ShopCommands::Transactions { shop } => {
            let shop = resolve_shop(service, user, shop).await?;
            let transactions = service.shop_transactions(user, shop.id).await?;
            if format == OutputFormat::Json {
                return print_json(&transactions);
            }
            if transactions.is_empty() {
                println!("No transactions at {}.", shop.name);
                return Ok(());
            }
            println!("{:<12} {:<8} {:>12}  {}", "DATE", "TYPE", "AMOUNT", "DESCRIPTION");
            println!("{}", "-".repeat(60));
            for tx in transactions {
                println!(
                    "{:<12} {:<8} {:>12}  {}",
                    tx.transaction_date.format("%Y-%m-%d"),
                    tx.kind,
                    format_cents(tx.amount_cents),
                    tx.description
                );
            }
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn record_lend(
    service: &CreditService,
    user: &User,
    kind: LendKind,
    amount: &str,
    borrower_name: &str,
    borrower_mobile: &str,
    description: &Option<String>,
    date: &Option<String>,
) -> Result<()> {
    let amount_cents =
        parse_amount(amount).with_context(|| format!("Invalid amount '{}'", amount))?;
    let date = date.as_deref().map(parse_date).transpose()?;

    let lend = service
        .record_lend(
            user,
            NewLend {
                borrower_name: borrower_name.to_string(),
                borrower_mobile: borrower_mobile.to_string(),
                amount_cents,
                kind,
                description: description.clone(),
                date,
            },
        )
        .await?;

    println!(
        "Recorded {}: {} with {} ({})",
        lend.kind,
        format_cents(lend.amount_cents),
        lend.borrower_name,
        lend.id
    );
    Ok(())
}

async fn run_export_command(
    service: &CreditService,
    user: &User,
    export_type: ExportType,
    output: Option<&str>,
) -> Result<()> {
    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("Failed to create file: {}", path))?,
        ),
        None => Box::new(io::stdout()),
    };

    let exporter = Exporter::new(service, user);
    match export_type {
        ExportType::Transactions => {
            let count = exporter.export_transactions_csv(writer).await?;
            eprintln!("Exported {} transactions", count);
        }
        ExportType::Lendings => {
            let count = exporter.export_lend_transactions_csv(writer).await?;
            eprintln!("Exported {} lending records", count);
        }
        ExportType::Borrowers => {
            let count = exporter.export_borrowers_csv(writer).await?;
            eprintln!("Exported {} borrower balances", count);
        }
        ExportType::Full => {
            let snapshot = exporter.export_snapshot_json(writer).await?;
            eprintln!(
                "Exported {} shops, {} transactions, {} lending records",
                snapshot.shops.len(),
                snapshot.transactions.len(),
                snapshot.lend_transactions.len()
            );
        }
    }

    Ok(())
}

fn print_borrowing(report: &crate::application::BorrowingReport, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(report);
    }
    println!("Borrower: {} ({})", report.borrower_name, report.borrower_mobile);
    println!();
    println!(
        "{:<20} {:<12} {:>12} {:>12} {:>12}",
        "LENDER", "MOBILE", "BORROWED", "REPAID", "OUTSTANDING"
    );
    println!("{}", "-".repeat(72));
    for lender in &report.lenders {
        let b = &lender.balance;
        println!(
            "{:<20} {:<12} {:>12} {:>12} {:>12}",
            truncate(&b.display_name, 20),
            lender.lender_mobile.as_ref().map_or("-", Mobile::as_str),
            format_cents(b.total_increase),
            format_cents(b.total_decrease),
            format_cents(b.outstanding)
        );
    }
    print_summary(&report.summary, "lenders");
    Ok(())
}

fn print_summary(summary: &AggregateSummary, noun: &str) {
    println!("{}", "-".repeat(72));
    println!(
        "{} {}, {} transactions, outstanding {} (in {} / out {})",
        summary.counterparty_count,
        noun,
        summary.transaction_count,
        format_cents(summary.total_outstanding),
        format_cents(summary.total_increase),
        format_cents(summary.total_decrease)
    );
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accept either a shop ID or the (case-insensitive) name of an owned shop.
async fn resolve_shop(service: &CreditService, user: &User, shop: &str) -> Result<Shop> {
    if let Ok(id) = Uuid::parse_str(shop) {
        return Ok(service.get_shop(user, id).await?.shop);
    }

    let mut matches: Vec<Shop> = service
        .list_owned_shops(user)
        .await?
        .into_iter()
        .filter(|s| s.name.eq_ignore_ascii_case(shop))
        .collect();

    match matches.len() {
        0 => Err(anyhow!("Shop not found: {}", shop)),
        1 => Ok(matches.remove(0)),
        n => Err(anyhow!(
            "{} shops are named '{}'; use the shop ID instead",
            n,
            shop
        )),
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'. Use YYYY-MM-DD", date_str))?;

    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid date"))?;

    Ok(DateTime::from_naive_utc_and_offset(naive_datetime, Utc))
}
