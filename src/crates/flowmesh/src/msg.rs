//! Wire types exchanged between the graph manager and worker tasks, and
//! between worker tasks themselves: [`BlockId`], [`BMsg`] and
//! [`OutChanMsg`].

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

use crate::error::{GraphError, Result};

/// A non-empty, printable identifier, unique across all live blocks.
/// Data blocks and connection blocks share this one namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockId(String);

impl BlockId {
    /// Validates non-emptiness. Connection and data block ids go through
    /// the same check (`BAD_BLOCK_ID` / `BAD_CONNECTION_ID` are
    /// distinguished by the caller, not here).
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(GraphError::BadBlockId);
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BlockId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The payload carried on data and route channels: an opaque structured
/// value plus an optional one-shot reply channel, used when the sender
/// expects a synchronous reply (route calls).
#[derive(Debug)]
pub struct BMsg {
    pub msg: serde_json::Value,
    pub response_chan: Option<oneshot::Sender<serde_json::Value>>,
}

impl BMsg {
    /// A fire-and-forget message with no expected reply.
    pub fn fire(msg: serde_json::Value) -> Self {
        Self {
            msg,
            response_chan: None,
        }
    }

    /// A request expecting exactly one reply; returns the message and the
    /// receiving half of the reply channel.
    pub fn call(msg: serde_json::Value) -> (Self, oneshot::Receiver<serde_json::Value>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                msg,
                response_chan: Some(tx),
            },
            rx,
        )
    }
}

/// A mutation message sent on a block's `addChan`, tagged over
/// `CREATE_OUT_CHAN` / `DELETE_OUT_CHAN`.
pub enum OutChanMsg {
    CreateOutChan {
        id: BlockId,
        out_chan: mpsc::Sender<BMsg>,
    },
    DeleteOutChan {
        id: BlockId,
    },
}
