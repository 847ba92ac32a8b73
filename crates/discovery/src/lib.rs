//! Cross-chain call discovery (§4.3): the iterative fixed-point
//! simulation the Builder runs to find every L2→L1 and L1→L2 call a
//! candidate transaction triggers, before it registers and submits
//! ordered side-effects.
mod error;
mod incoming;
mod outgoing;
mod proxy_trace;

pub use error::DiscoveryError;
pub use incoming::{discover_incoming_calls, DiscoveredIncomingCall, IncomingDiscoveryInput};
pub use outgoing::{
    discover_outgoing_calls, OutgoingDiscoveryInput, OutgoingDiscoveryResult,
    DEFAULT_MAX_ITERATIONS,
};
pub use proxy_trace::{collect_matching_calls, find_unresolved_call, UnresolvedCall};
