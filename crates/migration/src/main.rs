use sea_orm::Database;
use sea_orm_migration::prelude::*;

const DEFAULT_LEDGER_URL: &str = "sqlite:./ledger.db?mode=rwc";
const USAGE: &str = "Usage: cargo run -p migration -- [up [N]|down [N]|fresh|refresh|status]";

/// Migration step requested on the command line; `Up`/`Down` take an
/// optional number of migrations to apply or roll back.
enum Command {
    Up(Option<u32>),
    Down(Option<u32>),
    Fresh,
    Refresh,
    Status,
}

impl Command {
    fn parse(mut args: impl Iterator<Item = String>) -> Option<Self> {
        let name = args.next().unwrap_or_else(|| "up".to_string());
        let steps = match args.next() {
            Some(steps) => Some(steps.parse().ok()?),
            None => None,
        };
        match (name.as_str(), steps) {
            ("up", steps) => Some(Self::Up(steps)),
            ("down", steps) => Some(Self::Down(steps)),
            ("fresh", None) => Some(Self::Fresh),
            ("refresh", None) => Some(Self::Refresh),
            ("status", None) => Some(Self::Status),
            _ => None,
        }
    }
}

/// The ledger database, as configured for the engine (`ENGINE_DATABASE_URL`)
/// or through the usual `DATABASE_URL`.
fn ledger_url() -> String {
    std::env::var("ENGINE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .unwrap_or_else(|_| DEFAULT_LEDGER_URL.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let Some(command) = Command::parse(std::env::args().skip(1)) else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let db = Database::connect(&ledger_url()).await?;
    match command {
        Command::Up(steps) => migration::Migrator::up(&db, steps).await?,
        Command::Down(steps) => migration::Migrator::down(&db, steps).await?,
        Command::Fresh => migration::Migrator::fresh(&db).await?,
        Command::Refresh => migration::Migrator::refresh(&db).await?,
        Command::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}
