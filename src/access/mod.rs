//! Resource Access
//!
//! A resource owns a sequence of immutable revisions. Readers open any
//! committed revision; a single writer mutates a private copy of the latest
//! one and publishes it on commit.

pub mod cursor;
pub mod read_trx;
pub mod resource;
pub mod write_trx;

pub use cursor::NodeCursor;
pub use read_trx::ReadTrx;
pub use resource::{Resource, Revision};
pub use write_trx::{TrxState, WriteTrx};
