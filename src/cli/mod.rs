pub mod output;
pub mod shell;
pub mod watch;

use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::{print_stats, print_tags, print_tasks, short_id, ListFilter};
use shell::{run_shell, ShellExit};
use tracing::{info, level_filters::LevelFilter};
use watch::run_watch;

use crate::{
    session::Session,
    storage::{file_store::FileStore, kv::KeyValueStore},
    tasks::{
        entities::TaskId,
        stats::{tag_breakdown, tracked_time},
        tracker::TaskTracker,
    },
    utils::{
        clock::DefaultClock,
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "tasktick", version, long_about = None)]
#[command(about = "Personal task tracker with automatic priorities, tags and timers")]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default uses $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging to stdout")]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Log in, registering the username on first use")]
    Login { username: String },
    #[command(about = "Log out the current user. Their tasks are kept")]
    Logout {},
    #[command(about = "Show the current user")]
    Whoami {},
    #[command(about = "Interactive session. Running timers tick while it is open")]
    Shell {},
    #[command(about = "Print running timers every second until Ctrl-C")]
    Watch {},
    #[command(flatten)]
    Task(TaskCommands),
}

/// One-shot commands on the current user's tasks.
#[derive(Subcommand, Debug)]
enum TaskCommands {
    #[command(about = "Add a task. Priority and tags are picked from the text")]
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    #[command(about = "Toggle completion of a task")]
    Done { id: String },
    #[command(about = "Start or stop the timer of a task")]
    Timer { id: String },
    #[command(about = "Replace the text of a task")]
    Edit {
        id: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    #[command(about = "Delete a task")]
    Rm { id: String },
    #[command(about = "Delete all completed tasks")]
    Clear {},
    #[command(about = "List tasks, most recent first")]
    List {
        #[arg(long, conflicts_with = "completed", help = "Only pending tasks")]
        pending: bool,
        #[arg(long, help = "Only completed tasks")]
        completed: bool,
    },
    #[command(about = "Show today's and the last 30 days' counts")]
    Stats {},
    #[command(about = "Show how many tasks carry each tag")]
    Tags {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;
    enable_logging(
        CLI_PREFIX,
        &app_dir.join("logs"),
        args.log.then_some(LevelFilter::TRACE),
        args.log,
    )?;
    info!("Using application directory {}", app_dir.display());

    let store = Arc::new(FileStore::new(app_dir.join("store"))?);
    let mut session = Session::restore(store)?;

    match args.commands {
        Commands::Login { username } => {
            let user = session.login(&username)?;
            println!("Logged in as {}", user.username());
        }
        Commands::Logout {} => match session.current_user() {
            Some(user) => {
                let username = user.username().to_string();
                session.logout()?;
                println!("Logged out {username}");
            }
            None => println!("Nobody is logged in"),
        },
        Commands::Whoami {} => match session.current_user() {
            Some(user) => println!("{} ({})", user.username(), user.id()),
            None => println!("Nobody is logged in"),
        },
        Commands::Shell {} => {
            let tracker = session.open_tracker(Box::new(DefaultClock))?;
            if run_shell(tracker).await? == ShellExit::Logout {
                session.logout()?;
                println!("Logged out");
            }
        }
        Commands::Watch {} => run_watch(session.open_tracker(Box::new(DefaultClock))?).await?,
        Commands::Task(command) => {
            let tracker = session.open_tracker(Box::new(DefaultClock))?;
            run_task_command(tracker, command);
        }
    }
    Ok(())
}

fn run_task_command<S: KeyValueStore>(mut tracker: TaskTracker<S>, command: TaskCommands) {
    match command {
        TaskCommands::Add { text } => match tracker.create(&text.join(" ")) {
            Ok(task) => println!(
                "Added {} ({}) {}",
                short_id(task.id),
                task.priority,
                task.text
            ),
            Err(e) => println!("{e}"),
        },
        TaskCommands::Done { id } => {
            if let Some(id) = resolve(&tracker, &id) {
                tracker.toggle_complete(id);
                report_state(&tracker, id);
            }
        }
        TaskCommands::Timer { id } => {
            if let Some(id) = resolve(&tracker, &id) {
                tracker.toggle_timer(id);
                report_state(&tracker, id);
            }
        }
        TaskCommands::Edit { id, text } => {
            if let Some(id) = resolve(&tracker, &id) {
                match tracker.edit(id, &text.join(" ")) {
                    Ok(_) => report_state(&tracker, id),
                    Err(e) => println!("{e}"),
                }
            }
        }
        TaskCommands::Rm { id } => {
            if let Some(id) = resolve(&tracker, &id) {
                tracker.delete(id);
                println!("Deleted {}", short_id(id));
            }
        }
        TaskCommands::Clear {} => {
            println!("Removed {} completed tasks", tracker.clear_completed());
        }
        TaskCommands::List { pending, completed } => {
            let filter = match (pending, completed) {
                (true, _) => ListFilter::Pending,
                (_, true) => ListFilter::Completed,
                _ => ListFilter::All,
            };
            print_tasks(tracker.tasks(), filter);
        }
        TaskCommands::Stats {} => print_stats(
            &tracker.daily_stats(),
            &tracker.monthly_stats(),
            tracked_time(tracker.tasks()),
        ),
        TaskCommands::Tags {} => print_tags(&tag_breakdown(tracker.tasks())),
    }
}

fn resolve<S: KeyValueStore>(tracker: &TaskTracker<S>, prefix: &str) -> Option<TaskId> {
    let id = tracker.resolve_prefix(prefix);
    if id.is_none() {
        println!("No single task matches `{prefix}`");
    }
    id
}

fn report_state<S: KeyValueStore>(tracker: &TaskTracker<S>, id: TaskId) {
    if let Some(task) = tracker.get(id) {
        println!("{}", output::format_task_line(task, true));
    }
}
