//! Block registry: a process-wide catalog mapping a block *type name* to a
//! constructor and the set of routes that type declares. Populated once at
//! startup; read-only thereafter, so it is safe to share via
//! [`std::sync::Arc`] and read from many tasks concurrently.
//!
//! The runtime's own generic worker loop (see [`crate::worker`]) is the
//! same for every block type (select over the default input, the mutation
//! channel, every route, and quit); what differs per type is captured by
//! the small [`BlockLogic`] trait — polymorphism over block types, no
//! inheritance needed.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{GraphError, Result};

/// The outcome of handling one inbound message.
pub struct RouteReply {
    /// The value sent back on the caller's `responseChan`, if any.
    pub reply: Value,
    /// A payload to additionally fan out to every connected peer, if the
    /// route handler also wants to emit downstream (e.g. a synthetic
    /// "tick" route on a timer-like block).
    pub emit: Option<Value>,
}

impl RouteReply {
    pub fn reply(value: Value) -> Self {
        Self {
            reply: value,
            emit: None,
        }
    }

    pub fn reply_and_emit(reply: Value, emit: Value) -> Self {
        Self {
            reply,
            emit: Some(emit),
        }
    }
}

/// Per-type worker behavior. The default-input and mutation-protocol
/// handling (fan-out, `addChan`, `quitChan`) lives in [`crate::worker`]
/// and is identical for every type; only what a block *does* with a
/// message is type-specific.
pub trait BlockLogic: Send {
    /// Handle a message received on the default input channel. Returning
    /// `Some(payload)` fans `payload` out to every currently connected peer.
    fn on_input(&mut self, msg: Value) -> Option<Value> {
        let _ = msg;
        None
    }

    /// Handle a request on a named route. Must produce exactly one reply
    /// (sent by the worker loop only if the caller supplied a
    /// `responseChan`); may additionally request a fan-out emission.
    fn on_route(&mut self, route: &str, msg: Value) -> RouteReply {
        let _ = (route, msg);
        RouteReply::reply(Value::Null)
    }
}

type Factory = Arc<dyn Fn() -> Box<dyn BlockLogic> + Send + Sync>;

#[derive(Clone)]
struct BlockTypeDef {
    routes: Vec<String>,
    factory: Factory,
}

/// The process-wide block-type catalog. Build once with
/// [`Registry::with_builtins`], optionally [`Registry::register`] more
/// types, then share via `Arc` across the graph manager and any number of
/// readers.
#[derive(Clone, Default)]
pub struct Registry {
    types: BTreeMap<String, BlockTypeDef>,
}

impl Registry {
    /// An empty registry with no types registered at all, not even
    /// `connection`. Prefer [`Registry::with_builtins`] unless you are
    /// deliberately testing registry mechanics in isolation.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry carrying the one block type this runtime implements
    /// itself: the built-in `connection` block. The concrete block-type
    /// algorithm library (rule blocks, filters, tickers, ...) lives outside
    /// this crate; callers register their own types with
    /// [`Registry::register`].
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        reg.register("connection", Vec::<String>::new(), || {
            Box::new(crate::connection::ConnectionLogic::default())
        });
        reg
    }

    /// Register a block type under `type_name`, declaring the route names
    /// it exposes beyond the default input, and a constructor invoked once
    /// per block instance created of this type.
    pub fn register<F>(&mut self, type_name: impl Into<String>, routes: Vec<String>, factory: F)
    where
        F: Fn() -> Box<dyn BlockLogic> + Send + Sync + 'static,
    {
        self.types.insert(
            type_name.into(),
            BlockTypeDef {
                routes,
                factory: Arc::new(factory),
            },
        );
    }

    pub fn is_registered(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn routes_for(&self, type_name: &str) -> Option<&[String]> {
        self.types.get(type_name).map(|t| t.routes.as_slice())
    }

    pub(crate) fn construct(&self, type_name: &str) -> Result<Box<dyn BlockLogic>> {
        let def = self
            .types
            .get(type_name)
            .ok_or_else(|| GraphError::InvalidBlockType(type_name.to_string()))?;
        Ok((def.factory)())
    }

    /// A serializable description of every registered type and its
    /// declared routes, computed fresh from the (immutable, post-startup)
    /// catalog.
    pub fn snapshot(&self) -> Value {
        let mut out = serde_json::Map::new();
        for (name, def) in &self.types {
            out.insert(name.clone(), Value::from(def.routes.clone()));
        }
        Value::Object(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_include_connection_with_no_extra_routes() {
        let reg = Registry::with_builtins();
        assert!(reg.is_registered("connection"));
        assert_eq!(reg.routes_for("connection"), Some(&[][..]));
    }

    #[test]
    fn unknown_type_is_rejected() {
        let reg = Registry::with_builtins();
        assert!(reg.construct("nope").is_err());
    }

    #[test]
    fn snapshot_reflects_registered_routes() {
        let mut reg = Registry::with_builtins();
        reg.register(
            "echo",
            vec!["get_rule".to_string(), "set_rule".to_string()],
            || Box::new(NoopLogic),
        );
        let snap = reg.snapshot();
        let routes = snap.get("echo").unwrap().as_array().unwrap();
        assert_eq!(routes.len(), 2);
    }

    struct NoopLogic;
    impl BlockLogic for NoopLogic {}
}
