use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Cancels `cancelation` on Ctrl-C, or returns once somebody else cancelled it, so the waiting
/// side never outlives the session it guards.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => {
                info!("Received Ctrl-C, shutting down");
                cancelation.cancel();
            }
            Err(e) => {
                // Without a signal handler the session can still end through its own input.
                error!("Failed to listen for Ctrl-C {e:?}");
                cancelation.cancelled().await;
            }
        },
        _ = cancelation.cancelled() => (),
    };
}
