//! Notebook command-line entry point.

use clap::{ArgGroup, Parser, Subcommand};
use notebook_client::config::ClientConfig;
use notebook_client::error::ClientError;
use notebook_client::state::App;
use notebook_client::telemetry;
use notebook_core::{Note, NoteId, SortOption, UpdateNoteRequest};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "notebook", version, about = "Personal notes from the terminal")]
struct Cli {
    /// TOML config file. Built-in defaults apply without one.
    #[arg(long, global = true, env = "NOTEBOOK_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Sign in and store the session.
    Login { email: String, password: String },
    /// Create an account and sign in.
    Register {
        email: String,
        name: String,
        password: String,
    },
    Logout,
    #[command(name = "whoami")]
    WhoAmI,
    /// List notes, filtered and sorted.
    List {
        #[arg(long)]
        search: Option<String>,
        /// created-desc, created-asc, updated-desc, updated-asc, title-asc or title-desc
        #[arg(long, value_name = "KEY")]
        sort: Option<SortOption>,
    },
    Show { id: String },
    Create {
        title: String,
        content: Option<String>,
    },
    #[command(group(ArgGroup::new("changes").required(true).multiple(true).args(["title", "content"])))]
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
    },
    Delete { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), ClientError> {
    let cli = Cli::parse();
    let config = ClientConfig::load(cli.config.as_deref())?;
    telemetry::init_tracing(&config.log)?;
    let app = App::new(config)?;
    execute(&app, cli.command).await
}

async fn execute(app: &App, command: Command) -> Result<(), ClientError> {
    match command {
        Command::Login { email, password } => {
            let session = app.auth.login(&email, &password).await?;
            println!("Signed in as {} <{}>", session.user.name, session.user.email);
        }
        Command::Register {
            email,
            name,
            password,
        } => {
            let session = app.auth.register(&email, &name, &password).await?;
            println!(
                "Registered {} <{}> (id {})",
                session.user.name, session.user.email, session.user.id
            );
        }
        Command::Logout => {
            app.auth.logout();
            app.notes.clear();
            println!("Signed out");
        }
        Command::WhoAmI => match app.auth.current_user() {
            Some(user) => println!("{} <{}> (id {})", user.name, user.email, user.id),
            None => println!("Not signed in"),
        },
        Command::List { search, sort } => {
            app.notes.fetch_all().await?;
            if let Some(query) = search {
                app.notes.set_search_query(query);
            }
            if let Some(sort) = sort {
                app.notes.set_sort_option(sort);
            }
            let notes = app.notes.view();
            if notes.is_empty() {
                println!("No notes");
            }
            for note in &notes {
                println!("{}", summary_line(note));
            }
        }
        Command::Show { id } => match app.notes.fetch_one(&NoteId::new(id.clone())).await? {
            Some(note) => print_note(&note),
            None => println!("Note {} not found", id),
        },
        Command::Create { title, content } => {
            let note = app.notes.create(&title, content.as_deref()).await?;
            println!("Created {}", note.id);
        }
        Command::Update { id, title, content } => {
            app.notes.fetch_all().await?;
            let changes = UpdateNoteRequest { title, content };
            let note = app.notes.update(&NoteId::new(id), changes).await?;
            print_note(&note);
        }
        Command::Delete { id } => {
            app.notes.delete(&NoteId::new(id.clone())).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

fn summary_line(note: &Note) -> String {
    format!(
        "{}  {}  (updated {})",
        note.id,
        note.title,
        note.updated_at.format("%Y-%m-%d %H:%M")
    )
}

fn print_note(note: &Note) {
    println!("{}", note.title);
    println!("id:      {}", note.id);
    println!("created: {}", note.created_at.to_rfc3339());
    println!("updated: {}", note.updated_at.to_rfc3339());
    if !note.content.is_empty() {
        println!();
        println!("{}", note.content);
    }
}
