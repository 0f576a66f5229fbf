use std::io::Write;

use anyhow::Result;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::output::{print_stats, print_tags, print_tasks, short_id, ListFilter};
use crate::{
    session::{
        event_loop::{SessionHandle, SessionLoop},
        notice::NoticeBoard,
        shutdown::detect_shutdown,
    },
    storage::kv::KeyValueStore,
    tasks::{
        stats::{tag_breakdown, tracked_time},
        tracker::TaskTracker,
    },
    timer::TimerEngine,
    utils::clock::DefaultClock,
};

const PROMPT: &str = "tasktick> ";

const HELP: &str = "\
add <text>          create a task
done <id>           toggle completion
timer <id>          start or stop the timer
edit <id> <text>    change the text
rm <id>             delete a task
clear               delete completed tasks
list [pending|completed]
stats               today and last 30 days
tags                tasks per tag
logout              end the session and log out
quit                end the session";

/// How the shell ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    Quit,
    Logout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Add(String),
    Done(String),
    Timer(String),
    Edit(String, String),
    Remove(String),
    Clear,
    List(ListFilter),
    Stats,
    Tags,
    Help,
    Logout,
    Quit,
    Nothing,
}

impl ShellCommand {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let id = || -> Result<String, String> {
            match rest.split_whitespace().next() {
                Some(id) => Ok(id.to_string()),
                None => Err(format!("`{verb}` needs a task id")),
            }
        };
        Ok(match verb.to_ascii_lowercase().as_str() {
            "" => ShellCommand::Nothing,
            "add" | "a" => ShellCommand::Add(rest.to_string()),
            "done" | "d" => ShellCommand::Done(id()?),
            "timer" | "t" => ShellCommand::Timer(id()?),
            "edit" | "e" => {
                let id = id()?;
                let text = rest[id.len()..].trim().to_string();
                ShellCommand::Edit(id, text)
            }
            "rm" | "delete" => ShellCommand::Remove(id()?),
            "clear" => ShellCommand::Clear,
            "list" | "ls" => ShellCommand::List(match rest {
                "" | "all" => ListFilter::All,
                "pending" => ListFilter::Pending,
                "completed" | "done" => ListFilter::Completed,
                other => return Err(format!("Unknown list filter `{other}`")),
            }),
            "stats" => ShellCommand::Stats,
            "tags" => ShellCommand::Tags,
            "help" | "?" => ShellCommand::Help,
            "logout" => ShellCommand::Logout,
            "quit" | "exit" | "q" => ShellCommand::Quit,
            other => return Err(format!("Unknown command `{other}`, try `help`")),
        })
    }
}

/// Runs an interactive session on stdin. Timers keep ticking between commands until the user
/// quits, logs out, closes stdin or presses Ctrl-C.
pub async fn run_shell<S: KeyValueStore>(tracker: TaskTracker<S>) -> Result<ShellExit> {
    let (sender, receiver) = mpsc::channel(16);
    let shutdown = CancellationToken::new();
    let service = SessionLoop::new(
        tracker,
        receiver,
        shutdown.clone(),
        TimerEngine::default(),
        Box::new(DefaultClock),
    );

    println!("{HELP}");
    let (_, _, exit) = tokio::join!(
        detect_shutdown(shutdown.clone()),
        service.run(),
        read_commands(SessionHandle::new(sender), shutdown.clone()),
    );
    info!("Shell finished with {exit:?}");
    exit
}

async fn read_commands(handle: SessionHandle, shutdown: CancellationToken) -> Result<ShellExit> {
    let result = read_commands_inner(&handle, &shutdown).await;
    // Whatever happened, the session loop and the signal listener must end with us.
    shutdown.cancel();
    result.inspect_err(|e| error!("Shell input failed {e:?}"))
}

async fn read_commands_inner(
    handle: &SessionHandle,
    shutdown: &CancellationToken,
) -> Result<ShellExit> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut notices = NoticeBoard::default();

    loop {
        if let Some(notice) = notices.visible(Instant::now()) {
            println!("! {}", notice.message());
        }
        print!("{PROMPT}");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = shutdown.cancelled() => None,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else {
            println!();
            return Ok(ShellExit::Quit);
        };

        let command = match ShellCommand::parse(&line) {
            Ok(command) => command,
            Err(message) => {
                notices.raise(message, Instant::now());
                continue;
            }
        };

        match execute(handle, command).await? {
            Outcome::Done => (),
            Outcome::Notice(message) => notices.raise(message, Instant::now()),
            Outcome::Exit(exit) => return Ok(exit),
        }
    }
}

enum Outcome {
    Done,
    Notice(String),
    Exit(ShellExit),
}

async fn execute(handle: &SessionHandle, command: ShellCommand) -> Result<Outcome> {
    let outcome = match command {
        ShellCommand::Nothing => Outcome::Done,
        ShellCommand::Help => {
            println!("{HELP}");
            Outcome::Done
        }
        ShellCommand::Quit => Outcome::Exit(ShellExit::Quit),
        ShellCommand::Logout => Outcome::Exit(ShellExit::Logout),
        ShellCommand::Add(text) => match handle.create(&text).await? {
            Ok(task) => {
                println!("Added {} ({}) {}", short_id(task.id), task.priority, task.text);
                Outcome::Done
            }
            Err(e) => Outcome::Notice(e.to_string()),
        },
        ShellCommand::Done(prefix) => match handle.resolve(&prefix).await? {
            Some(id) => {
                handle.toggle_complete(id).await?;
                Outcome::Done
            }
            None => no_match(&prefix),
        },
        ShellCommand::Timer(prefix) => match handle.resolve(&prefix).await? {
            Some(id) => {
                handle.toggle_timer(id).await?;
                Outcome::Done
            }
            None => no_match(&prefix),
        },
        ShellCommand::Edit(prefix, text) => match handle.resolve(&prefix).await? {
            Some(id) => match handle.edit(id, &text).await? {
                Ok(_) => Outcome::Done,
                Err(e) => Outcome::Notice(e.to_string()),
            },
            None => no_match(&prefix),
        },
        ShellCommand::Remove(prefix) => match handle.resolve(&prefix).await? {
            Some(id) => {
                handle.delete(id).await?;
                Outcome::Done
            }
            None => no_match(&prefix),
        },
        ShellCommand::Clear => {
            let removed = handle.clear_completed().await?;
            println!("Removed {removed} completed tasks");
            Outcome::Done
        }
        ShellCommand::List(filter) => {
            print_tasks(&handle.view().await?.tasks, filter);
            Outcome::Done
        }
        ShellCommand::Stats => {
            let view = handle.view().await?;
            print_stats(&view.daily, &view.monthly, tracked_time(&view.tasks));
            Outcome::Done
        }
        ShellCommand::Tags => {
            print_tags(&tag_breakdown(&handle.view().await?.tasks));
            Outcome::Done
        }
    };
    Ok(outcome)
}

fn no_match(prefix: &str) -> Outcome {
    Outcome::Notice(format!("No single task matches `{prefix}`"))
}
