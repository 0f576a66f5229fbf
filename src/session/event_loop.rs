use tokio::{
    sync::{mpsc, oneshot, watch},
    time::Instant,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::{
    storage::kv::KeyValueStore,
    tasks::{
        entities::{TaskId, TaskRecord},
        tracker::{TaskTracker, TrackerError, TrackerView},
    },
    timer::{TimerEngine, Transition},
    utils::clock::Clock,
};

/// Everything a front end can ask of a running session. Each command carries the channel its
/// answer goes back on.
#[derive(Debug)]
pub enum TaskCommand {
    Create {
        text: String,
        reply: oneshot::Sender<Result<TaskRecord, TrackerError>>,
    },
    ToggleComplete {
        id: TaskId,
        reply: oneshot::Sender<bool>,
    },
    ToggleTimer {
        id: TaskId,
        reply: oneshot::Sender<bool>,
    },
    Edit {
        id: TaskId,
        text: String,
        reply: oneshot::Sender<Result<bool, TrackerError>>,
    },
    Delete {
        id: TaskId,
        reply: oneshot::Sender<bool>,
    },
    ClearCompleted {
        reply: oneshot::Sender<usize>,
    },
    Resolve {
        prefix: String,
        reply: oneshot::Sender<Option<TaskId>>,
    },
    View {
        reply: oneshot::Sender<TrackerView>,
    },
}

enum LoopEvent {
    Shutdown,
    Command(Option<TaskCommand>),
    Tick,
}

/// Drives one user session: applies commands one at a time and advances running timers. This is
/// the only place that touches the tracker while it runs, so commands and ticks never interleave.
pub struct SessionLoop<S> {
    tracker: TaskTracker<S>,
    commands: mpsc::Receiver<TaskCommand>,
    shutdown: CancellationToken,
    engine: TimerEngine,
    clock: Box<dyn Clock>,
    updates: watch::Sender<TrackerView>,
}

impl<S: KeyValueStore> SessionLoop<S> {
    pub fn new(
        tracker: TaskTracker<S>,
        commands: mpsc::Receiver<TaskCommand>,
        shutdown: CancellationToken,
        engine: TimerEngine,
        clock: Box<dyn Clock>,
    ) -> Self {
        let (updates, _) = watch::channel(tracker.view());
        Self {
            tracker,
            commands,
            shutdown,
            engine,
            clock,
            updates,
        }
    }

    /// Latest state after every change, for front ends that redraw on their own.
    pub fn subscribe(&self) -> watch::Receiver<TrackerView> {
        self.updates.subscribe()
    }

    /// Executes the session event loop. Ends when `shutdown` is cancelled or every command sender
    /// is gone, stops the timer and hands the tracker back.
    pub async fn run(mut self) -> TaskTracker<S> {
        loop {
            let now = self.clock.instant();
            match self.engine.observe(self.tracker.running_count(), now) {
                Some(Transition::Started) => info!("Timer started"),
                Some(Transition::Stopped) => info!("Timer stopped"),
                None => (),
            }

            let deadline = self.engine.deadline();
            let event = tokio::select! {
                _ = self.shutdown.cancelled() => LoopEvent::Shutdown,
                command = self.commands.recv() => LoopEvent::Command(command),
                _ = wait_for(&*self.clock, deadline) => LoopEvent::Tick,
            };

            match event {
                LoopEvent::Shutdown => {
                    debug!("Session cancelled");
                    break;
                }
                LoopEvent::Command(None) => {
                    debug!("All command senders dropped");
                    break;
                }
                LoopEvent::Command(Some(command)) => {
                    if self.apply(command) {
                        self.publish();
                    }
                }
                LoopEvent::Tick => {
                    let advanced = self.tracker.tick();
                    self.engine.complete_tick();
                    trace!("Tick advanced {advanced} tasks");
                    self.publish();
                }
            }
        }

        self.engine.stop();
        self.commands.close();
        self.tracker
    }

    /// Returns whether the command could have changed the tracker.
    fn apply(&mut self, command: TaskCommand) -> bool {
        debug!("Applying {command:?}");
        match command {
            TaskCommand::Create { text, reply } => {
                let result = self.tracker.create(&text).cloned();
                respond(reply, result);
            }
            TaskCommand::ToggleComplete { id, reply } => {
                respond(reply, self.tracker.toggle_complete(id));
            }
            TaskCommand::ToggleTimer { id, reply } => {
                respond(reply, self.tracker.toggle_timer(id));
            }
            TaskCommand::Edit { id, text, reply } => {
                respond(reply, self.tracker.edit(id, &text));
            }
            TaskCommand::Delete { id, reply } => {
                respond(reply, self.tracker.delete(id));
            }
            TaskCommand::ClearCompleted { reply } => {
                respond(reply, self.tracker.clear_completed());
            }
            TaskCommand::Resolve { prefix, reply } => {
                respond(reply, self.tracker.resolve_prefix(&prefix));
                return false;
            }
            TaskCommand::View { reply } => {
                respond(reply, self.tracker.view());
                return false;
            }
        }
        true
    }

    fn publish(&self) {
        self.updates.send_replace(self.tracker.view());
    }
}

fn respond<T>(reply: oneshot::Sender<T>, value: T) {
    if reply.send(value).is_err() {
        debug!("Requester went away before the reply");
    }
}

/// Sleeps until `deadline`. Without a deadline nothing is armed and this never completes.
async fn wait_for(clock: &dyn Clock, deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => clock.sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Sending half used by front ends. Every call waits for the session to answer.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<TaskCommand>,
}

impl SessionHandle {
    pub fn new(commands: mpsc::Sender<TaskCommand>) -> Self {
        Self { commands }
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> TaskCommand,
    ) -> anyhow::Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| anyhow::anyhow!("Session has ended"))?;
        Ok(response.await?)
    }

    pub async fn create(&self, text: &str) -> anyhow::Result<Result<TaskRecord, TrackerError>> {
        let text = text.to_owned();
        self.request(|reply| TaskCommand::Create { text, reply }).await
    }

    pub async fn toggle_complete(&self, id: TaskId) -> anyhow::Result<bool> {
        self.request(|reply| TaskCommand::ToggleComplete { id, reply })
            .await
    }

    pub async fn toggle_timer(&self, id: TaskId) -> anyhow::Result<bool> {
        self.request(|reply| TaskCommand::ToggleTimer { id, reply }).await
    }

    pub async fn edit(&self, id: TaskId, text: &str) -> anyhow::Result<Result<bool, TrackerError>> {
        let text = text.to_owned();
        self.request(|reply| TaskCommand::Edit { id, text, reply })
            .await
    }

    pub async fn delete(&self, id: TaskId) -> anyhow::Result<bool> {
        self.request(|reply| TaskCommand::Delete { id, reply }).await
    }

    pub async fn clear_completed(&self) -> anyhow::Result<usize> {
        self.request(|reply| TaskCommand::ClearCompleted { reply })
            .await
    }

    pub async fn resolve(&self, prefix: &str) -> anyhow::Result<Option<TaskId>> {
        let prefix = prefix.to_owned();
        self.request(|reply| TaskCommand::Resolve { prefix, reply })
            .await
    }

    pub async fn view(&self) -> anyhow::Result<TrackerView> {
        self.request(|reply| TaskCommand::View { reply }).await
    }
}
