//! The graph manager: the single logical owner of the block map. All
//! structural mutations funnel through it; it translates external intents
//! into mutation messages addressed to the affected blocks' `addChan`s.
//!
//! Concurrency: the block map and each block's `inBlocks`/`outBlocks`
//! adjacency are owned exclusively by this type. Structural edits
//! (`create_block`, `delete_block`, `create_connection`, `import`) take the
//! state write lock for their whole duration, so concurrent structural
//! edits are serialized. `route_msg` and `list_blocks`/`export` only need a
//! read lock to look up a channel or snapshot adjacency; they release it
//! before awaiting a worker's reply, so inject/query calls proceed
//! concurrently with each other.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::{debug, info};

use crate::config::RuntimeConfig;
use crate::error::{GraphError, Result};
use crate::id::IdGenerator;
use crate::msg::{BMsg, BlockId, OutChanMsg};
use crate::registry::Registry;
use crate::worker::{run_worker, WorkerHandles};

/// The manager-view copy of a block: shares the same channel endpoints as
/// the worker-view copy running in the spawned task, but carries
/// `inBlocks`/`outBlocks` instead of the worker's private `outChans`.
struct ManagedBlock {
    id: BlockId,
    block_type: String,
    in_tx: mpsc::Sender<BMsg>,
    routes: HashMap<String, mpsc::Sender<BMsg>>,
    add_tx: mpsc::Sender<OutChanMsg>,
    quit_tx: Option<oneshot::Sender<()>>,
    in_blocks: HashMap<BlockId, String>,
    out_blocks: HashMap<BlockId, String>,
}

#[derive(Default)]
struct GraphState {
    blocks: HashMap<BlockId, ManagedBlock>,
}

/// A snapshot of one block as reported by [`GraphManager::list_blocks`].
#[derive(Debug, Clone, Serialize)]
pub struct BlockSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    pub in_blocks: Vec<String>,
    pub out_blocks: Vec<String>,
    pub routes: Vec<String>,
}

pub struct GraphManager {
    registry: Arc<Registry>,
    state: RwLock<GraphState>,
    id_gen: Arc<dyn IdGenerator>,
    config: RuntimeConfig,
}

/// Split a `to` target into `(targetId, Option<routeName>)` per the
/// `targetID` / `targetID/routeName` syntax.
fn parse_target(to: &str) -> Result<(String, Option<String>)> {
    let mut parts = to.splitn(2, '/');
    let target = parts.next().unwrap_or_default().to_string();
    if target.trim().is_empty() {
        return Err(GraphError::MalformedTarget(to.to_string()));
    }
    let route = parts
        .next()
        .map(str::to_string)
        .filter(|r| !r.trim().is_empty());
    Ok((target, route))
}

impl GraphManager {
    pub fn new(registry: Arc<Registry>, id_gen: Arc<dyn IdGenerator>, config: RuntimeConfig) -> Self {
        Self {
            registry,
            state: RwLock::new(GraphState::default()),
            id_gen,
            config,
        }
    }

    /// Registry snapshot for clients.
    pub fn library_snapshot(&self) -> Value {
        self.registry.snapshot()
    }

    fn fresh_id(&self, blocks: &HashMap<BlockId, ManagedBlock>) -> BlockId {
        loop {
            if let Ok(candidate) = BlockId::new(self.id_gen.next_id()) {
                if !blocks.contains_key(&candidate) {
                    return candidate;
                }
            }
        }
    }

    /// Allocate channels for a block of `block_type`, spawn its worker,
    /// and insert the manager-view handle into `state`. Caller must hold
    /// the state write lock and must have already checked `id` is free
    /// and `block_type` is registered.
    fn spawn_block_locked(&self, state: &mut GraphState, block_type: &str, id: BlockId) -> Result<()> {
        let route_names = self
            .registry
            .routes_for(block_type)
            .ok_or_else(|| GraphError::InvalidBlockType(block_type.to_string()))?
            .to_vec();
        let logic = self.registry.construct(block_type)?;

        let (in_tx, in_rx) = mpsc::channel(self.config.in_chan_capacity);
        let (add_tx, add_rx) = mpsc::channel(self.config.add_chan_capacity);
        let (quit_tx, quit_rx) = oneshot::channel();

        let mut route_txs = HashMap::with_capacity(route_names.len());
        let mut route_rxs = HashMap::with_capacity(route_names.len());
        for name in route_names {
            let (tx, rx) = mpsc::channel(self.config.route_chan_capacity);
            route_txs.insert(name.clone(), tx);
            route_rxs.insert(name, rx);
        }

        let managed = ManagedBlock {
            id: id.clone(),
            block_type: block_type.to_string(),
            in_tx,
            routes: route_txs,
            add_tx,
            quit_tx: Some(quit_tx),
            in_blocks: HashMap::new(),
            out_blocks: HashMap::new(),
        };

        let handles = WorkerHandles {
            id: id.clone(),
            in_rx,
            add_rx,
            routes: route_rxs,
            quit_rx,
        };

        state.blocks.insert(id.clone(), managed);
        tokio::spawn(run_worker(logic, handles));
        info!(block = %id, block_type, "started block");
        Ok(())
    }

    /// Create a block of `block_type`. If `id` is `None` a fresh id is
    /// drawn from the configured [`IdGenerator`] and deduplicated against
    /// the live block map.
    pub async fn create_block(&self, block_type: &str, id: Option<String>) -> Result<BlockId> {
        if !self.registry.is_registered(block_type) {
            return Err(GraphError::InvalidBlockType(block_type.to_string()));
        }

        let mut state = self.state.write().await;
        let block_id = match id {
            Some(raw) => {
                let bid = BlockId::new(raw)?;
                if state.blocks.contains_key(&bid) {
                    return Err(GraphError::BlockIdAlreadyExists(bid.to_string()));
                }
                bid
            }
            None => self.fresh_id(&state.blocks),
        };

        self.spawn_block_locked(&mut state, block_type, block_id.clone())?;
        Ok(block_id)
    }

    /// Delete a block and cascade-delete any connection block left with a
    /// dangling endpoint.
    pub async fn delete_block(&self, id: &str) -> Result<()> {
        let mut state = self.state.write().await;

        let root = BlockId::new(id.to_string())
            .ok()
            .filter(|bid| state.blocks.contains_key(bid))
            .ok_or_else(|| GraphError::BlockNotFound(id.to_string()))?;

        // Iterative cascade, guarded by membership checks so a malformed
        // connection-to-connection cycle terminates instead of looping or
        // overflowing the stack.
        let mut visited: HashSet<BlockId> = HashSet::new();
        let mut stack = vec![root];

        while let Some(target) = stack.pop() {
            if !visited.insert(target.clone()) {
                continue;
            }
            let Some(block) = state.blocks.remove(&target) else {
                continue;
            };

            for peer in block.in_blocks.keys() {
                if let Some(peer_block) = state.blocks.get_mut(peer) {
                    let _ = peer_block
                        .add_tx
                        .send(OutChanMsg::DeleteOutChan { id: target.clone() })
                        .await;
                    peer_block.out_blocks.remove(&target);
                    if peer_block.block_type == "connection" {
                        stack.push(peer.clone());
                    }
                }
            }

            for peer in block.out_blocks.keys() {
                if let Some(peer_block) = state.blocks.get_mut(peer) {
                    peer_block.in_blocks.remove(&target);
                    if peer_block.block_type == "connection" {
                        stack.push(peer.clone());
                    }
                }
            }

            if let Some(quit_tx) = block.quit_tx {
                let _ = quit_tx.send(());
            }
            debug!(block = %target, "deleted block");
        }

        Ok(())
    }

    /// Create a connection block wiring `from`'s default output to `to`
    /// (`targetId` or `targetId/routeName`). All preconditions (both
    /// endpoints exist, the target route exists) are checked before any
    /// block is created, so — unlike a create-then-rollback strategy —
    /// failure never leaves a stray connection block behind.
    pub async fn create_connection(
        &self,
        from: &str,
        to: &str,
        id: Option<String>,
    ) -> Result<BlockId> {
        let (to_target, to_route) = parse_target(to)?;

        let mut state = self.state.write().await;

        let from_id = BlockId::new(from.to_string())
            .ok()
            .filter(|b| state.blocks.contains_key(b))
            .ok_or_else(|| GraphError::FromBlockNotFound(from.to_string()))?;

        let to_id = BlockId::new(to_target.clone())
            .ok()
            .filter(|b| state.blocks.contains_key(b))
            .ok_or_else(|| GraphError::ToBlockNotFound(to_target.clone()))?;

        if let Some(route) = &to_route {
            let target = state.blocks.get(&to_id).expect("checked above");
            if !target.routes.contains_key(route) {
                return Err(GraphError::ToRouteNotFound {
                    block: to_id.to_string(),
                    route: route.clone(),
                });
            }
        }

        let conn_id = match id {
            Some(raw) => {
                let bid = BlockId::new(raw).map_err(|_| GraphError::BadConnectionId)?;
                if state.blocks.contains_key(&bid) {
                    return Err(GraphError::BlockIdAlreadyExists(bid.to_string()));
                }
                bid
            }
            None => self.fresh_id(&state.blocks),
        };

        self.spawn_block_locked(&mut state, "connection", conn_id.clone())?;

        let conn_in_tx = state.blocks[&conn_id].in_tx.clone();
        state.blocks[&from_id]
            .add_tx
            .send(OutChanMsg::CreateOutChan {
                id: conn_id.clone(),
                out_chan: conn_in_tx,
            })
            .await
            .map_err(|_| GraphError::WorkerUnavailable(from_id.to_string()))?;

        let target_chan = match &to_route {
            Some(route) => state.blocks[&to_id].routes[route].clone(),
            None => state.blocks[&to_id].in_tx.clone(),
        };
        state.blocks[&conn_id]
            .add_tx
            .send(OutChanMsg::CreateOutChan {
                id: to_id.clone(),
                out_chan: target_chan,
            })
            .await
            .map_err(|_| GraphError::WorkerUnavailable(conn_id.to_string()))?;

        let route_annotation = to_route.clone().unwrap_or_default();
        state
            .blocks
            .get_mut(&from_id)
            .expect("checked above")
            .out_blocks
            .insert(conn_id.clone(), String::new());
        state
            .blocks
            .get_mut(&conn_id)
            .expect("just created")
            .in_blocks
            .insert(from_id.clone(), String::new());
        state
            .blocks
            .get_mut(&conn_id)
            .expect("just created")
            .out_blocks
            .insert(to_id.clone(), route_annotation.clone());
        state
            .blocks
            .get_mut(&to_id)
            .expect("checked above")
            .in_blocks
            .insert(conn_id.clone(), route_annotation);

        info!(connection = %conn_id, from = %from_id, to = %to_id, "connected blocks");
        Ok(conn_id)
    }

    /// Reject a route-call or import payload whose serialized JSON form
    /// exceeds the configured limit, before any state is touched.
    pub(crate) fn check_payload_size(&self, payload: &Value) -> Result<()> {
        let actual = serde_json::to_vec(payload)
            .map(|bytes| bytes.len())
            .unwrap_or(0);
        let limit = self.config.max_payload_bytes;
        if actual > limit {
            return Err(GraphError::PayloadTooLarge { actual, limit });
        }
        Ok(())
    }

    /// Synchronous request/reply against a named route. No timeout is
    /// imposed — a worker that never replies stalls the caller; accepted
    /// as a known limitation rather than adding a timeout layer.
    pub async fn route_msg(&self, id: &str, route: &str, payload: Value) -> Result<Value> {
        self.check_payload_size(&payload)?;
        let tx = {
            let state = self.state.read().await;
            let bid = BlockId::new(id.to_string())
                .ok()
                .filter(|b| state.blocks.contains_key(b))
                .ok_or_else(|| GraphError::BlockIdNotFound(id.to_string()))?;
            let block = state.blocks.get(&bid).expect("checked above");
            block
                .routes
                .get(route)
                .cloned()
                .ok_or_else(|| GraphError::RouteNotFound {
                    block: id.to_string(),
                    route: route.to_string(),
                })?
        };

        let (bmsg, rx) = BMsg::call(payload);
        tx.send(bmsg)
            .await
            .map_err(|_| GraphError::WorkerUnavailable(id.to_string()))?;
        rx.await.map_err(|_| GraphError::WorkerUnavailable(id.to_string()))
    }

    /// Snapshot the manager view. No worker communication; not a
    /// linearizable snapshot under concurrent mutation — best-effort.
    pub async fn list_blocks(&self) -> Vec<BlockSummary> {
        let state = self.state.read().await;
        state
            .blocks
            .values()
            .map(|b| BlockSummary {
                id: b.id.to_string(),
                block_type: b.block_type.clone(),
                in_blocks: b.in_blocks.keys().map(BlockId::to_string).collect(),
                out_blocks: b.out_blocks.keys().map(BlockId::to_string).collect(),
                routes: b.routes.keys().cloned().collect(),
            })
            .collect()
    }

    /// Whether `block_type` declares a route named `route`, used by the
    /// export path to decide whether to fetch a `rule`.
    pub(crate) async fn has_route(&self, id: &str, route: &str) -> bool {
        let state = self.state.read().await;
        BlockId::new(id.to_string())
            .ok()
            .and_then(|bid| state.blocks.get(&bid))
            .map(|b| b.routes.contains_key(route))
            .unwrap_or(false)
    }

    pub(crate) fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// `(from, to, route)` for a connection block, read directly off the
    /// manager-side adjacency.
    pub(crate) async fn connection_endpoints(&self, id: &str) -> Option<(String, String, Option<String>)> {
        let state = self.state.read().await;
        let bid = BlockId::new(id.to_string()).ok()?;
        let block = state.blocks.get(&bid)?;
        let from = block.in_blocks.keys().next()?.to_string();
        let (to, route) = block.out_blocks.iter().next().map(|(peer, route)| {
            let route = if route.is_empty() { None } else { Some(route.clone()) };
            (peer.to_string(), route)
        })?;
        Some((from, to, route))
    }

    /// Snapshot of every currently live block id, used by import to seed
    /// the collision map.
    pub(crate) async fn live_ids(&self) -> HashSet<String> {
        let state = self.state.read().await;
        state.blocks.keys().map(BlockId::to_string).collect()
    }
}
