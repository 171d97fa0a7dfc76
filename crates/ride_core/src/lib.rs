//! Ride request core: the pickup/ride state machine, its async controller,
//! and the backend and session seams it talks through.

pub mod backend;
pub mod controller;
pub mod reducer;
pub mod session;

pub use backend::{HttpRideBackend, MissingRideBackend, RideBackend, SimulatedRideBackend};
pub use controller::{Ack, ControllerClosed, RideRequestController};
pub use reducer::{Rejection, RidePhase, RideState, UpdateLog};
pub use session::{SessionProvider, StaticSession};
