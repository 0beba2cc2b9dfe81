use tokio::sync::watch;

/// Resolves once `true` is published on the shutdown channel or its sender
/// is dropped. Publishing `false` is not a stop request.
pub async fn requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
