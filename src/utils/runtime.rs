use anyhow::Result;

/// Everything in tasktick runs cooperatively on one thread; the timer and the command handling
/// share the same task collection without locks.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
