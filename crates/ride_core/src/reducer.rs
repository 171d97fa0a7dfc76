//! Pure ride-request state transitions.
//!
//! Every event produces a fresh [`RideState`] snapshot plus at most one
//! [`Effect`] for the controller to run. Nothing in here touches the network
//! or the clock.

use std::time::Duration;

use shared::domain::{Coordinate, RideAssignment, RideId};

pub const WELCOME_MESSAGE: &str = "Welcome! Click the map to set your pickup location.";
pub const REQUESTING_MESSAGE: &str = "Requesting Unicorn";
pub const ASSIGNMENT_ERROR_MESSAGE: &str = "Error finding unicorn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RidePhase {
    #[default]
    Idle,
    Requesting,
    Completed,
    Failed,
}

/// Append-only, user-facing status history. Oldest entry first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateLog {
    entries: Vec<String>,
}

impl UpdateLog {
    pub fn with_greeting() -> Self {
        Self {
            entries: vec![WELCOME_MESSAGE.to_string()],
        }
    }

    fn append(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveRide {
    pub ride_id: RideId,
    pub pin: Coordinate,
    pub assignment: Option<RideAssignment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RideState {
    pin: Option<Coordinate>,
    phase: RidePhase,
    updates: UpdateLog,
    active_ride: Option<ActiveRide>,
}

impl Default for RideState {
    fn default() -> Self {
        Self {
            pin: None,
            phase: RidePhase::Idle,
            updates: UpdateLog::with_greeting(),
            active_ride: None,
        }
    }
}

impl RideState {
    pub fn pin(&self) -> Option<Coordinate> {
        self.pin
    }

    pub fn phase(&self) -> RidePhase {
        self.phase
    }

    pub fn updates(&self) -> &UpdateLog {
        &self.updates
    }

    pub fn active_ride(&self) -> Option<&ActiveRide> {
        self.active_ride.as_ref()
    }

    /// The request action is available iff a pin is set and no ride is in flight.
    pub fn request_enabled(&self) -> bool {
        self.pin.is_some() && self.phase != RidePhase::Requesting
    }

    fn is_current_ride(&self, ride_id: RideId) -> bool {
        self.active_ride
            .as_ref()
            .is_some_and(|ride| ride.ride_id == ride_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RideEvent {
    PinSelected(Coordinate),
    RequestSubmitted {
        ride_id: RideId,
    },
    AssignmentReceived {
        ride_id: RideId,
        assignment: RideAssignment,
    },
    AssignmentFailed {
        ride_id: RideId,
    },
    Arrived {
        ride_id: RideId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    CallBackend { ride_id: RideId, pin: Coordinate },
    ScheduleArrival { ride_id: RideId, after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoPin,
    RideInFlight,
    StaleRide(RideId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: RideState,
    pub effect: Option<Effect>,
    pub rejection: Option<Rejection>,
}

impl Transition {
    fn applied(state: RideState, effect: Option<Effect>) -> Self {
        Self {
            state,
            effect,
            rejection: None,
        }
    }

    fn rejected(state: &RideState, rejection: Rejection) -> Self {
        Self {
            state: state.clone(),
            effect: None,
            rejection: Some(rejection),
        }
    }
}

pub fn reduce(state: &RideState, event: RideEvent) -> Transition {
    match event {
        RideEvent::PinSelected(pin) => {
            if state.phase == RidePhase::Requesting {
                return Transition::rejected(state, Rejection::RideInFlight);
            }
            let mut next = state.clone();
            next.pin = Some(pin);
            next.phase = RidePhase::Idle;
            next.active_ride = None;
            Transition::applied(next, None)
        }
        RideEvent::RequestSubmitted { ride_id } => {
            let Some(pin) = state.pin else {
                return Transition::rejected(state, Rejection::NoPin);
            };
            if state.phase == RidePhase::Requesting {
                return Transition::rejected(state, Rejection::RideInFlight);
            }
            let mut next = state.clone();
            next.updates.append(REQUESTING_MESSAGE);
            next.phase = RidePhase::Requesting;
            next.active_ride = Some(ActiveRide {
                ride_id,
                pin,
                assignment: None,
            });
            Transition::applied(next, Some(Effect::CallBackend { ride_id, pin }))
        }
        RideEvent::AssignmentReceived {
            ride_id,
            assignment,
        } => {
            if !state.is_current_ride(ride_id) {
                return Transition::rejected(state, Rejection::StaleRide(ride_id));
            }
            let mut next = state.clone();
            next.updates.append(format!(
                "Your unicorn, {} will be with you in {} seconds",
                assignment.unicorn_name, assignment.eta_seconds
            ));
            let after = Duration::from_secs(assignment.eta_seconds);
            if let Some(ride) = next.active_ride.as_mut() {
                ride.assignment = Some(assignment);
            }
            Transition::applied(next, Some(Effect::ScheduleArrival { ride_id, after }))
        }
        RideEvent::AssignmentFailed { ride_id } => {
            if !state.is_current_ride(ride_id) {
                return Transition::rejected(state, Rejection::StaleRide(ride_id));
            }
            let mut next = state.clone();
            next.updates.append(ASSIGNMENT_ERROR_MESSAGE);
            next.phase = RidePhase::Failed;
            next.active_ride = None;
            Transition::applied(next, None)
        }
        RideEvent::Arrived { ride_id } => {
            let unicorn_name = match state.active_ride.as_ref() {
                Some(ActiveRide {
                    ride_id: current,
                    assignment: Some(assignment),
                    ..
                }) if *current == ride_id => assignment.unicorn_name.clone(),
                _ => return Transition::rejected(state, Rejection::StaleRide(ride_id)),
            };
            let mut next = state.clone();
            next.updates.append(format!("{unicorn_name} has arrived"));
            next.phase = RidePhase::Completed;
            next.pin = None;
            next.active_ride = None;
            Transition::applied(next, None)
        }
    }
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
