use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use rowhook::{
    Callback, DialectKind, Field, MemoryDriver, OperationKind, Record, Session, SessionConfig,
    UpdateAttrs, Value,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rowhook")]
#[command(about = "Inspect callback chains and trace the SQL they generate")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the compiled default chains
    Chains {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Create, update and delete a sample record against the memory driver
    Demo {
        #[arg(long, default_value = "generic")]
        dialect: DialectKind,
        /// Write the title with update_column instead of a filtered update
        #[arg(long)]
        column: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Create,
    Update,
    Delete,
    Query,
    RowQuery,
}

impl From<KindArg> for OperationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Create => OperationKind::Create,
            KindArg::Update => OperationKind::Update,
            KindArg::Delete => OperationKind::Delete,
            KindArg::Query => OperationKind::Query,
            KindArg::RowQuery => OperationKind::RowQuery,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rowhook=info,warn")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Chains { kind } => print_chains(kind.map(Into::into)),
        Command::Demo { dialect, column } => run_demo(dialect, column),
    }
}

fn print_chains(kind: Option<OperationKind>) -> Result<()> {
    let callback = Callback::with_defaults();
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => OperationKind::ALL.to_vec(),
    };

    for kind in kinds {
        let chain = callback
            .compile(kind)
            .with_context(|| format!("compiling {} chain", kind))?;
        println!("{} ({} stages)", kind, chain.len());
        for (i, name) in chain.names().iter().enumerate() {
            println!("  {:>2}. {}", i + 1, name);
        }
    }
    Ok(())
}

struct Article {
    id: i64,
    title: String,
    views: i64,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Record for Article {
    fn table_name(&self) -> String {
        "articles".to_string()
    }

    fn fields(&self) -> Vec<Field> {
        vec![
            Field::new("ID", self.id).primary_key(),
            Field::new("Title", self.title.as_str()),
            Field::new("Views", self.views),
            Field::new("CreatedAt", self.created_at),
            Field::new("UpdatedAt", self.updated_at),
            Field::new("DeletedAt", self.deleted_at),
        ]
    }

    fn set_field(&mut self, name: &str, value: Value) -> rowhook::Result<()> {
        match name {
            "ID" => self.id = value.as_i64().unwrap_or_default(),
            "Title" => self.title = value.to_string(),
            "Views" => self.views = value.as_i64().unwrap_or_default(),
            "CreatedAt" => self.created_at = value.as_timestamp(),
            "UpdatedAt" => self.updated_at = value.as_timestamp(),
            "DeletedAt" => self.deleted_at = value.as_timestamp(),
            other => {
                return Err(rowhook::DbError::FieldNotFound(other.to_string(), self.table_name()));
            }
        }
        Ok(())
    }
}

fn run_demo(dialect: DialectKind, column: bool) -> Result<()> {
    let driver = MemoryDriver::new();
    let config = SessionConfig::new().dialect(dialect).log_sql(true);
    let mut session = Session::with_config(driver.clone(), config);

    let mut article = Article {
        id: 0,
        title: "draft".to_string(),
        views: 0,
        created_at: None,
        updated_at: None,
        deleted_at: None,
    };

    session.create(&mut article).context("create")?;
    if column {
        session
            .update_column(&mut article, "Title", "published")
            .context("update_column")?;
    } else {
        session
            .updates(&mut article, UpdateAttrs::new().set("Title", "published").set("Views", 10))
            .context("updates")?;
    }
    session.delete(&mut article).context("delete")?;

    for statement in driver.committed() {
        let vars: Vec<String> = statement.vars.iter().map(Value::to_string).collect();
        println!("{}  [{}]", statement.sql, vars.join(", "));
    }
    Ok(())
}
