use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::output::format_task_line;
use crate::{
    session::{event_loop::SessionLoop, shutdown::detect_shutdown},
    storage::kv::KeyValueStore,
    tasks::tracker::{TaskTracker, TrackerView},
    timer::TimerEngine,
    utils::clock::DefaultClock,
};

/// Keeps the running timers ticking and prints them after every tick until Ctrl-C.
pub async fn run_watch<S: KeyValueStore>(tracker: TaskTracker<S>) -> Result<()> {
    if tracker.running_count() == 0 {
        println!("No timers are running, start one with `timer <id>`");
        return Ok(());
    }

    // Nobody sends commands, but the loop ends as soon as every sender is gone.
    let (sender, receiver) = mpsc::channel(1);
    let shutdown = CancellationToken::new();
    let service = SessionLoop::new(
        tracker,
        receiver,
        shutdown.clone(),
        TimerEngine::default(),
        Box::new(DefaultClock),
    );
    let updates = service.subscribe();

    println!("Watching running timers, press Ctrl-C to stop");
    tokio::join!(
        detect_shutdown(shutdown.clone()),
        service.run(),
        print_updates(updates, shutdown.clone()),
    );
    drop(sender);
    Ok(())
}

async fn print_updates(mut updates: watch::Receiver<TrackerView>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    debug!("Session loop is gone");
                    break;
                }
            }
        }
        let view = updates.borrow_and_update().clone();
        print_running(&view);
    }
}

fn print_running(view: &TrackerView) {
    for task in view.tasks.iter().filter(|task| task.timer_running) {
        println!("{}", format_task_line(task, true));
    }
}
