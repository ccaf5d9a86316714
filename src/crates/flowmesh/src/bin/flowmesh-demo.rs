//! Standalone test-harness binary for the graph runtime.
//!
//! Wires a small graph through the public `GraphManager` API and prints
//! its exported shape. This is the entry point that installs a `tracing`
//! subscriber — the library itself never does, since libraries don't
//! install global subscribers.

use std::sync::Arc;

use flowmesh::{BlockLogic, GraphManager, Registry, RouteReply, RuntimeConfig, ShortIdGenerator};
use serde_json::{json, Value};

#[derive(Default)]
struct EchoLogic;

impl BlockLogic for EchoLogic {
    fn on_route(&mut self, _route: &str, msg: Value) -> RouteReply {
        RouteReply::reply(msg)
    }
}

#[derive(Default)]
struct CounterLogic {
    count: u64,
}

impl BlockLogic for CounterLogic {
    fn on_input(&mut self, _msg: Value) -> Option<Value> {
        self.count += 1;
        None
    }

    fn on_route(&mut self, _route: &str, _msg: Value) -> RouteReply {
        RouteReply::reply(json!({ "count": self.count }))
    }
}

#[tokio::main]
async fn main() {
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt().with_env_filter(rust_log).init();

    let mut registry = Registry::with_builtins();
    registry.register("echo", vec!["call".to_string()], || Box::new(EchoLogic::default()));
    registry.register("counter", vec!["poll".to_string()], || {
        Box::new(CounterLogic::default())
    });

    let manager = GraphManager::new(
        Arc::new(registry),
        Arc::new(ShortIdGenerator),
        RuntimeConfig::from_env(),
    );

    let source = manager.create_block("echo", Some("src".to_string())).await.unwrap();
    let sink = manager.create_block("counter", Some("sink".to_string())).await.unwrap();
    manager
        .create_connection(source.as_str(), sink.as_str(), Some("edge".to_string()))
        .await
        .unwrap();

    tracing::info!(%source, %sink, "wired demo graph");

    let reply = manager.route_msg("src", "call", json!({"hello": "world"})).await.unwrap();
    tracing::info!(%reply, "echo replied");

    let exported = manager.export().await.unwrap();
    println!("{}", serde_json::to_string_pretty(&exported).unwrap());
}
