use anyhow::Result;
use tasktick::{cli::run_cli, utils::runtime::single_thread_runtime};
use tracing::error;

fn main() -> Result<()> {
    let runtime = single_thread_runtime()?;
    let result = runtime.block_on(run_cli()).inspect_err(|e| {
        error!("Error running cli {e:?}");
    });
    // A pending stdin read would otherwise keep the process alive.
    runtime.shutdown_background();
    result
}
