//! Access to the hosted backend: the `time_logs` table over REST, the
//! realtime change feed over WebSocket, and the local session credentials
//! file. The backend owns all authoritative state; this module only moves it.

pub mod entities;
pub mod feed;
pub mod session;
pub mod store;
