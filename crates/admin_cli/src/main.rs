use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{
    Engine, EngineError, NewUser, Settlement,
    settlement::{self, LedgerEntry},
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "tracktally_admin")]
#[command(about = "Admin utilities for TrackTally (bootstrap users, inspect settlements)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./tracktally.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Group(Group),
    /// Settle a roster and payments given on the command line. Nothing is
    /// stored and no database is opened.
    Settle(SettleArgs),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    full_name: String,
    /// Mark the email as already verified.
    #[arg(long)]
    verified: bool,
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    List {
        #[arg(long)]
        owner: String,
    },
    Settle {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        group: Uuid,
    },
}

#[derive(Args, Debug)]
struct SettleArgs {
    /// Roster entry, repeat for every member.
    #[arg(long = "member", required = true)]
    members: Vec<String>,
    /// Payment as `NAME=AMOUNT`, repeat for every expense.
    #[arg(long = "payment", value_parser = parse_payment)]
    payments: Vec<LedgerEntry>,
}

fn parse_payment(raw: &str) -> Result<LedgerEntry, String> {
    let (payer, amount) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=AMOUNT, got {raw}"))?;
    let payer = payer.trim();
    if payer.is_empty() {
        return Err(format!("missing payer in {raw}"));
    }
    let amount: f64 = amount
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| format!("invalid amount in {raw}"))?;
    Ok(LedgerEntry::new(payer, amount))
}

fn print_plan(plan: &Settlement) {
    for diagnostic in &plan.diagnostics {
        eprintln!("warning: {diagnostic}");
    }
    if plan.is_settled() {
        println!("All settled up, nobody owes anything.");
        return;
    }
    for instruction in plan.instructions() {
        println!("{instruction}");
    }
}

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Keeps the terminal in raw mode for as long as it lives.
struct RawTerminal;

impl RawTerminal {
    fn enable() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn notice(out: &mut impl Write, line: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(line),
        Print("\r\n")
    )?;
    Ok(())
}

/// Reads one line without echoing it, printing `*` per character.
/// Esc or Ctrl-C aborts.
fn read_secret(label: &str) -> CliResult<String> {
    let _raw = RawTerminal::enable()?;
    let mut out = std::io::stderr();
    execute!(out, cursor::MoveToColumn(0), Print(label))?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        match code {
            KeyCode::Enter => break,
            KeyCode::Esc => return Err("aborted".into()),
            KeyCode::Char('c') if ctrl => return Err("aborted".into()),
            KeyCode::Backspace if secret.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char(ch) if !ctrl => {
                secret.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => continue,
        }
        out.flush()?;
    }

    execute!(out, Print("\r\n"))?;
    Ok(secret)
}

/// Asks for a new password and its confirmation, three attempts.
fn read_new_password() -> CliResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let password = read_secret("New password: ")?;
        if password.is_empty() {
            notice(&mut out, "The password cannot be empty.")?;
        } else if read_secret("Repeat password: ")? != password {
            notice(&mut out, "The two passwords differ.")?;
        } else {
            return Ok(password);
        }
    }
    Err("no matching password after three attempts".into())
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn connect_engine(database_url: &str) -> CliResult<Engine> {
    let db = connect_db(database_url).await?;
    Ok(Engine::builder().database(db).build().await?)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let engine = connect_engine(&cli.database_url).await?;
            let password = read_new_password()?;

            let profile = match engine
                .create_user(NewUser {
                    username: args.username,
                    password,
                    email: args.email,
                    full_name: args.full_name,
                })
                .await
            {
                Ok(profile) => profile,
                Err(EngineError::ExistingKey(key)) => {
                    eprintln!("already exists: {key}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };
            if args.verified {
                engine.mark_email_verified(&profile.email).await?;
            }

            println!("created user: {}", profile.username);
        }
        Command::Group(Group {
            command: GroupCommand::List { owner },
        }) => {
            let engine = connect_engine(&cli.database_url).await?;
            for group in engine.groups(&owner).await? {
                let members = if group.has_members() {
                    group.members.join(", ")
                } else {
                    "<no members yet>".to_string()
                };
                println!(
                    "{}  {} ({} members): {}",
                    group.id, group.name, group.member_count, members
                );
            }
        }
        Command::Group(Group {
            command: GroupCommand::Settle { owner, group },
        }) => {
            let engine = connect_engine(&cli.database_url).await?;
            let result = match engine.settle_group(&owner, group).await {
                Ok(result) => result,
                Err(EngineError::KeyNotFound(_)) => {
                    eprintln!("group not found: {group}");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            };

            println!(
                "{}: {} expenses, total {}",
                result.group.name, result.expense_count, result.total
            );
            print_plan(&result.settlement);
        }
        Command::Settle(args) => {
            let plan = settlement::settle(&args.members, &args.payments);
            print_plan(&plan);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_parses_name_and_amount() {
        assert_eq!(
            parse_payment("Alice=12,50").unwrap(),
            LedgerEntry::new("Alice", 12.5)
        );
        assert_eq!(
            parse_payment(" Mary Ann = 3").unwrap(),
            LedgerEntry::new("Mary Ann", 3.0)
        );
    }

    #[test]
    fn payment_rejects_garbage() {
        assert!(parse_payment("Alice").is_err());
        assert!(parse_payment("=10").is_err());
        assert!(parse_payment("Alice=ten").is_err());
    }

    #[test]
    fn cli_accepts_adhoc_settlement() {
        let cli = Cli::try_parse_from([
            "tracktally_admin",
            "settle",
            "--member",
            "Alice",
            "--member",
            "Bob",
            "--payment",
            "Alice=100",
        ])
        .unwrap();
        let Command::Settle(args) = cli.command else {
            panic!("expected settle command");
        };
        let plan = settlement::settle(&args.members, &args.payments);
        assert_eq!(plan.instructions(), vec!["Bob will pay €50.00 to Alice"]);
    }
}
