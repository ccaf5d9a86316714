//! # flowmesh
//!
//! A runtime for user-constructed streaming dataflow graphs. Nodes
//! ("blocks") are long-lived concurrent workers that consume messages on
//! input endpoints, mutate private state, and emit messages to output
//! endpoints; edges ("connections") are themselves blocks that buffer and
//! forward messages, so any dataflow topology is expressible as a
//! homogeneous graph of blocks.
//!
//! This crate is the graph runtime core: the block abstraction, the
//! channel-based messaging protocol, the mutation protocol that keeps the
//! live graph consistent under concurrent blocks, routing of control
//! messages to named endpoints ("routes"), connection-block semantics, and
//! import/export canonicalization with collision-safe renaming. An HTTP
//! façade, the concrete block-type library, and an ID microservice are
//! external collaborators — see [`registry::BlockLogic`] and
//! [`id::IdGenerator`] for the seams they plug into.
//!
//! ```
//! use std::sync::Arc;
//! use flowmesh::{GraphManager, Registry, RuntimeConfig, ShortIdGenerator};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let manager = GraphManager::new(
//!     Arc::new(Registry::with_builtins()),
//!     Arc::new(ShortIdGenerator),
//!     RuntimeConfig::default(),
//! );
//!
//! let unknown = manager.create_block("no-such-type", None).await;
//! assert!(unknown.is_err());
//!
//! let conn = manager.create_block("connection", None).await.unwrap();
//! manager.delete_block(conn.as_str()).await.unwrap();
//! # }
//! ```

pub mod collision;
pub mod config;
pub mod connection;
pub mod error;
pub mod id;
pub mod manager;
pub mod msg;
pub mod registry;
pub mod serialize;
pub mod worker;

pub use config::RuntimeConfig;
pub use connection::ConnectionLogic;
pub use error::{GraphError, Result};
pub use id::{IdGenerator, SequentialIdGenerator, ShortIdGenerator};
pub use manager::{BlockSummary, GraphManager};
pub use msg::{BMsg, BlockId, OutChanMsg};
pub use registry::{BlockLogic, Registry, RouteReply};
pub use serialize::{ImportReport, FORMAT_VERSION};
