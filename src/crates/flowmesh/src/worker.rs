//! The worker task protocol shared by every block type: select over the
//! default input, the mutation channel, every declared route, and the quit
//! signal. `outChans` (the fan-out table) is owned exclusively by this task
//! and mutated only by `addChan` messages — never read or written by the
//! graph manager.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{StreamExt, StreamMap};
use tracing::{debug, trace};

use crate::msg::{BMsg, BlockId, OutChanMsg};
use crate::registry::BlockLogic;

/// The channel endpoints handed to a spawned worker task. Constructed by
/// [`crate::manager::GraphManager`] alongside the manager-view handle that
/// shares the same endpoints (the "manager view" / "worker view" split).
pub struct WorkerHandles {
    pub id: BlockId,
    pub in_rx: mpsc::Receiver<BMsg>,
    pub add_rx: mpsc::Receiver<OutChanMsg>,
    pub routes: HashMap<String, mpsc::Receiver<BMsg>>,
    pub quit_rx: oneshot::Receiver<()>,
}

async fn fan_out(out_chans: &HashMap<BlockId, mpsc::Sender<BMsg>>, payload: serde_json::Value) {
    for (peer, chan) in out_chans {
        // Per-peer FIFO is preserved (we await each send before moving to
        // the next); ordering across different peers is unspecified.
        if chan.send(BMsg::fire(payload.clone())).await.is_err() {
            trace!(peer = %peer, "dropped message: peer worker is gone");
        }
    }
}

/// Run a block's worker loop to completion. Returns when `quitChan` fires;
/// no channel is drained after that point.
pub async fn run_worker(mut logic: Box<dyn BlockLogic>, handles: WorkerHandles) {
    let WorkerHandles {
        id,
        mut in_rx,
        mut add_rx,
        routes,
        mut quit_rx,
    } = handles;

    let mut out_chans: HashMap<BlockId, mpsc::Sender<BMsg>> = HashMap::new();
    let mut route_streams: StreamMap<String, ReceiverStream<BMsg>> = StreamMap::new();
    for (name, rx) in routes {
        route_streams.insert(name, ReceiverStream::new(rx));
    }

    loop {
        tokio::select! {
            biased;

            _ = &mut quit_rx => {
                debug!(block = %id, "quit signal received, stopping worker");
                return;
            }
            maybe_mutation = add_rx.recv() => {
                match maybe_mutation {
                    Some(OutChanMsg::CreateOutChan { id: peer, out_chan }) => {
                        debug!(block = %id, peer = %peer, "wiring outbound channel");
                        out_chans.insert(peer, out_chan);
                    }
                    Some(OutChanMsg::DeleteOutChan { id: peer }) => {
                        debug!(block = %id, peer = %peer, "unwiring outbound channel");
                        out_chans.remove(&peer);
                    }
                    None => {
                        // Mutation sender dropped; the manager is gone.
                        // Keep serving data/route traffic already in
                        // flight rather than tearing down unilaterally.
                    }
                }
            }
            maybe_bmsg = in_rx.recv() => {
                let Some(bmsg) = maybe_bmsg else { continue };
                let BMsg { msg, response_chan } = bmsg;
                if let Some(out) = logic.on_input(msg) {
                    fan_out(&out_chans, out).await;
                }
                if let Some(tx) = response_chan {
                    let _ = tx.send(serde_json::Value::Null);
                }
            }
            Some((route, bmsg)) = route_streams.next(), if !route_streams.is_empty() => {
                let BMsg { msg, response_chan } = bmsg;
                let outcome = logic.on_route(&route, msg);
                if let Some(emit) = outcome.emit {
                    fan_out(&out_chans, emit).await;
                }
                if let Some(tx) = response_chan {
                    let _ = tx.send(outcome.reply);
                }
            }
        }
    }
}
