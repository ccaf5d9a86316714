//! The built-in `connection` block: a route-less block whose worker
//! forwards every inbound message, unchanged, to its sole downstream peer.
//! Edges in the user-visible graph are realized as these blocks, giving
//! every edge an addressable identity and a uniform lifecycle.

use serde_json::Value;

use crate::registry::BlockLogic;

/// `outChans` holds at most one entry for a connection block; the generic
/// worker loop in [`crate::worker`] enforces the fan-out mechanics, so this
/// logic only needs to pass the payload through.
#[derive(Debug, Default)]
pub struct ConnectionLogic;

impl BlockLogic for ConnectionLogic {
    fn on_input(&mut self, msg: Value) -> Option<Value> {
        Some(msg)
    }
}
