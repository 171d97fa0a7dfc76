//! Async host for the ride reducer.
//!
//! One task owns the [`RideState`] and applies events strictly in arrival
//! order. Backend calls and arrival timers run as child tasks that report
//! back through an internal channel; their handles are aborted on teardown.

use std::sync::Arc;

use shared::{
    domain::{Coordinate, RideAssignment, RideId},
    error::AssignmentError,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    backend::RideBackend,
    reducer::{reduce, Effect, Rejection, RideEvent, RideState},
};

const COMMAND_QUEUE_CAPACITY: usize = 64;
const UPDATE_BROADCAST_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("ride controller has shut down")]
pub struct ControllerClosed;

#[derive(Debug, Clone, PartialEq)]
pub struct Ack {
    pub state: RideState,
    pub rejection: Option<Rejection>,
}

enum Command {
    SelectPin {
        pin: Coordinate,
        reply: oneshot::Sender<Ack>,
    },
    RequestRide {
        reply: oneshot::Sender<Ack>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

enum Completion {
    Assignment {
        ride_id: RideId,
        result: Result<RideAssignment, AssignmentError>,
    },
    Arrival {
        ride_id: RideId,
    },
}

#[derive(Clone)]
pub struct RideRequestController {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<RideState>,
    updates: broadcast::Sender<String>,
}

impl RideRequestController {
    pub fn spawn(backend: Arc<dyn RideBackend>) -> Self {
        let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (completions, completion_rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(RideState::default());
        let (updates, _) = broadcast::channel(UPDATE_BROADCAST_CAPACITY);

        let worker = ControllerLoop {
            backend,
            state: RideState::default(),
            state_tx,
            updates: updates.clone(),
            completions,
            backend_task: None,
            arrival_task: None,
        };
        tokio::spawn(worker.run(command_rx, completion_rx));

        Self {
            commands,
            state,
            updates,
        }
    }

    pub async fn select_pin(&self, pin: Coordinate) -> Result<Ack, ControllerClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::SelectPin { pin, reply }).await?;
        rx.await.map_err(|_| ControllerClosed)
    }

    pub async fn request_ride(&self) -> Result<Ack, ControllerClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::RequestRide { reply }).await?;
        rx.await.map_err(|_| ControllerClosed)
    }

    /// Stops the controller, cancelling any pending backend call or arrival.
    pub async fn shutdown(&self) -> Result<(), ControllerClosed> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Shutdown { reply }).await?;
        rx.await.map_err(|_| ControllerClosed)
    }

    pub fn snapshot(&self) -> RideState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<RideState> {
        self.state.clone()
    }

    /// Every update-log line appended after subscribing, in order.
    pub fn subscribe_updates(&self) -> broadcast::Receiver<String> {
        self.updates.subscribe()
    }

    async fn send(&self, cmd: Command) -> Result<(), ControllerClosed> {
        self.commands.send(cmd).await.map_err(|_| ControllerClosed)
    }
}

struct ControllerLoop {
    backend: Arc<dyn RideBackend>,
    state: RideState,
    state_tx: watch::Sender<RideState>,
    updates: broadcast::Sender<String>,
    completions: mpsc::UnboundedSender<Completion>,
    backend_task: Option<JoinHandle<()>>,
    arrival_task: Option<JoinHandle<()>>,
}

impl ControllerLoop {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
    ) {
        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::SelectPin { pin, reply }) => {
                        info!(%pin, "pickup pin selected");
                        let _ = reply.send(self.apply(RideEvent::PinSelected(pin)));
                    }
                    Some(Command::RequestRide { reply }) => {
                        let ride_id = RideId::new();
                        let _ = reply.send(self.apply(RideEvent::RequestSubmitted { ride_id }));
                    }
                    Some(Command::Shutdown { reply }) => {
                        self.teardown();
                        let _ = reply.send(());
                        return;
                    }
                    None => {
                        self.teardown();
                        return;
                    }
                },
                Some(done) = completions.recv() => self.complete(done),
            }
        }
    }

    fn complete(&mut self, done: Completion) {
        match done {
            Completion::Assignment { ride_id, result } => {
                self.backend_task = None;
                let event = match result {
                    Ok(assignment) => RideEvent::AssignmentReceived {
                        ride_id,
                        assignment,
                    },
                    Err(err) => {
                        warn!(%ride_id, error = %err, "ride assignment failed");
                        RideEvent::AssignmentFailed { ride_id }
                    }
                };
                self.apply(event);
            }
            Completion::Arrival { ride_id } => {
                self.arrival_task = None;
                info!(%ride_id, "ride complete");
                self.apply(RideEvent::Arrived { ride_id });
            }
        }
    }

    fn apply(&mut self, event: RideEvent) -> Ack {
        let transition = reduce(&self.state, event);
        match transition.rejection {
            Some(Rejection::NoPin) => warn!("no pin present - skipping ride request"),
            Some(Rejection::RideInFlight) => {
                warn!("a ride is already in flight - ignoring action")
            }
            Some(Rejection::StaleRide(ride_id)) => {
                debug!(%ride_id, "dropping event for a ride that is no longer active")
            }
            None => {}
        }

        let previous_len = self.state.updates().entries().len();
        self.state = transition.state;
        for line in &self.state.updates().entries()[previous_len..] {
            info!(update = %line, "ride update");
            let _ = self.updates.send(line.clone());
        }
        self.state_tx.send_replace(self.state.clone());

        if let Some(effect) = transition.effect {
            self.run_effect(effect);
        }

        Ack {
            state: self.state.clone(),
            rejection: transition.rejection,
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::CallBackend { ride_id, pin } => {
                debug!(%ride_id, %pin, "requesting unicorn from backend");
                let backend = Arc::clone(&self.backend);
                let completions = self.completions.clone();
                let task = tokio::spawn(async move {
                    let result = backend.assign(pin).await;
                    let _ = completions.send(Completion::Assignment { ride_id, result });
                });
                if let Some(previous) = self.backend_task.replace(task) {
                    previous.abort();
                }
            }
            Effect::ScheduleArrival { ride_id, after } => {
                debug!(%ride_id, after_secs = after.as_secs(), "scheduling simulated arrival");
                let completions = self.completions.clone();
                let task = tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    let _ = completions.send(Completion::Arrival { ride_id });
                });
                if let Some(previous) = self.arrival_task.replace(task) {
                    previous.abort();
                }
            }
        }
    }

    fn teardown(&mut self) {
        let pending_backend = self.backend_task.take();
        let pending_arrival = self.arrival_task.take();
        if pending_backend.is_some() || pending_arrival.is_some() {
            info!("cancelling in-flight ride on controller shutdown");
        }
        for task in pending_backend.into_iter().chain(pending_arrival) {
            task.abort();
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
