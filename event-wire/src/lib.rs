//! Wire-shape event types for Shuttle.
//!
//! The runtime's in-memory [`Event`](https://docs.rs/shuttle) carries a typed
//! timestamp and arbitrary payloads; this crate defines the two serialized
//! forms bridges exchange, plus batching. The bridge in `shuttle` converts
//! between the runtime type and these shapes.
//!
//! - [`WireEvent`]: full JSON form with spelled-out field names, a `version`
//!   marker, and an ISO8601 timestamp string (nanosecond precision preserved).
//! - [`CompactEvent`]: short field names (`i`, `t`, `a`, `s`, `d`, `e`) with
//!   the timestamp as whole Unix seconds. Sub-second precision is dropped on
//!   purpose; existing bridges rely on the integer form.
//! - [`EventBatch`]: a group of full-form events under one batch id.

mod batch;
mod event;

pub use batch::EventBatch;
pub use event::{CompactEvent, WireEvent, WIRE_VERSION};
