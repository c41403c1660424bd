use super::controller::RunController;
use super::protocol::{Command, Event};
use crate::consts::WORKER_THREAD_NAME;
use crate::error::{BfResult, BorderForgeError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, trace};

/// Caller's side of a run living on its own thread.
pub struct RunHandle {
    commands: Sender<Command>,
    events: Receiver<Event>,
    dropped: Arc<AtomicU64>,
    join: JoinHandle<RunController>,
}

/// Moves `controller` onto a dedicated worker thread.
///
/// Events travel through a queue of `capacity` slots. Generation updates are
/// dropped when it is full; lifecycle events always arrive.
pub fn spawn(controller: RunController, capacity: usize) -> BfResult<RunHandle> {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (evt_tx, evt_rx) = mpsc::sync_channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    let worker_dropped = dropped.clone();

    let join = thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run_worker(controller, cmd_rx, evt_tx, worker_dropped))?;

    Ok(RunHandle {
        commands: cmd_tx,
        events: evt_rx,
        dropped,
        join,
    })
}

impl RunHandle {
    pub fn send(&self, cmd: Command) -> BfResult<()> {
        self.commands
            .send(cmd)
            .map_err(|_| BorderForgeError::InvalidCommand("run worker has shut down".into()))
    }

    pub fn events(&self) -> &Receiver<Event> {
        &self.events
    }

    /// Generation updates discarded because the consumer fell behind.
    pub fn dropped_updates(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Closes the command queue, drains pending events and joins the worker.
    /// Returns the controller so the final state can be inspected.
    pub fn shutdown(self) -> RunController {
        let RunHandle {
            commands,
            events,
            join,
            ..
        } = self;
        drop(commands);
        // Unblocks a worker waiting on a full queue.
        while events.recv().is_ok() {}
        match join.join() {
            Ok(controller) => controller,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

fn run_worker(
    mut controller: RunController,
    commands: Receiver<Command>,
    events: SyncSender<Event>,
    dropped: Arc<AtomicU64>,
) -> RunController {
    debug!("worker started");
    loop {
        if controller.is_active() {
            let batch = controller.advance();
            if !publish(&events, batch, &dropped) {
                break;
            }
            // Commands only take effect between generations.
            loop {
                match commands.try_recv() {
                    Ok(cmd) => {
                        let batch = controller.handle(cmd);
                        if !publish(&events, batch, &dropped) {
                            return controller;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return controller,
                }
            }
        } else {
            match commands.recv() {
                Ok(cmd) => {
                    let batch = controller.handle(cmd);
                    if !publish(&events, batch, &dropped) {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    }
    debug!(status = %controller.status(), "worker exiting");
    controller
}

/// Returns false once the consumer is gone.
fn publish(events: &SyncSender<Event>, batch: Vec<Event>, dropped: &AtomicU64) -> bool {
    if batch.iter().all(Event::is_droppable) {
        for event in batch {
            match events.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    let n = dropped.fetch_add(1, Ordering::Relaxed) + 1;
                    trace!(dropped = n, "consumer lagging, generation update dropped");
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
        true
    } else {
        batch.into_iter().all(|event| events.send(event).is_ok())
    }
}
