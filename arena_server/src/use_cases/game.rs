use super::match_controller::MatchController;
use super::types::{MatchCommand, MatchUpdate};
use crate::domain::MatchSnapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tracing::{Instrument, debug, info, info_span};

/// Authoritative loop for one match.
///
/// Commands are drained once per tick in arrival order, then the controller
/// advances by the fixed tick interval and the resulting diff is broadcast.
pub async fn match_task(
    match_id: Arc<str>,
    mut command_rx: mpsc::Receiver<MatchCommand>,
    update_tx: broadcast::Sender<MatchUpdate>,
    snapshot_tx: watch::Sender<Arc<MatchSnapshot>>,
    mut controller: MatchController,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let span = info_span!("match", match_id = %match_id);
    async move {
        info!("match loop started");
        let mut interval = tokio::time::interval(tick_interval);
        let dt = tick_interval.as_secs_f32();

        loop {
            tokio::select! {
                _ = shutdown.notified() => {
                    // Exit cleanly when the match is removed.
                    break;
                }
                _ = interval.tick() => {}
            }

            while let Ok(command) = command_rx.try_recv() {
                if let Err(reason) = controller.handle_command(command.clone()) {
                    debug!(?command, ?reason, "command dropped");
                }
            }

            let update = controller.advance(dt);
            snapshot_tx.send_replace(Arc::new(controller.snapshot()));
            // No subscribers is fine; clients come and go.
            let _ = update_tx.send(update);
        }

        info!(tick = controller.tick(), "match loop stopped");
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Phase;
    use crate::domain::tuning::MatchTuning;

    #[tokio::test]
    async fn loop_applies_commands_and_stops_on_shutdown() {
        let (command_tx, command_rx) = mpsc::channel(16);
        let (update_tx, mut update_rx) = broadcast::channel(64);
        let controller = MatchController::new(MatchTuning::default(), 1);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(controller.snapshot()));
        let shutdown = Arc::new(Notify::new());

        let task = tokio::spawn(match_task(
            Arc::from("unit"),
            command_rx,
            update_tx,
            snapshot_tx,
            controller,
            Duration::from_millis(5),
            shutdown.clone(),
        ));

        command_tx.send(MatchCommand::StartMatch).await.unwrap();
        let started = loop {
            match update_rx.recv().await {
                Ok(update) if update.phase == Phase::Active => break update,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("match loop exited early"),
            }
        };
        assert!(started.tick >= 1);
        assert!(started.clock < 120.0);

        shutdown.notify_one();
        task.await.unwrap();
        assert_eq!(snapshot_rx.borrow().phase, Phase::Active);
    }
}
