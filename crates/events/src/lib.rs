//! §4.2 L1 Event Source & Ordering: decodes the L1 rollup contract's four
//! event kinds and delivers a total order of them to the derivation
//! engine, via initial catch-up plus live polling (§4.2.1, §5).

pub mod decode;
pub mod error;
pub mod selectors;
pub mod source;

pub use decode::decode_log;
pub use error::EventSourceError;
pub use source::{EventSourceConfig, L1EventSource};
