//! Export / import: canonical JSON-shaped representation of the live
//! graph, and collision-tolerant reimport.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::collision::dedupe_id;
use crate::error::{GraphError, Result};
use crate::manager::GraphManager;

/// The on-disk format identifier.
pub const FORMAT_VERSION: &str = "0.1.0";

/// What an [`import`](GraphManager::import) run actually did — most
/// usefully, the collision map from serialized id to the id actually used.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub collision_map: std::collections::HashMap<String, String>,
}

impl GraphManager {
    /// Produce `{version, blocks: [...], connections: [...]}` for the
    /// live graph.
    pub async fn export(&self) -> Result<Value> {
        let summaries = self.list_blocks().await;

        let mut blocks = Vec::new();
        let mut connections = Vec::new();

        for summary in summaries {
            if summary.block_type == "connection" {
                let Some((from, to, route)) = self.connection_endpoints(&summary.id).await else {
                    // Shouldn't happen for a well-formed connection block
                    // (invariant 4), but a half-wired connection mid-edit
                    // is simply omitted from the export rather than
                    // panicking.
                    continue;
                };
                let mut entry = json!({
                    "id": summary.id,
                    "type": "connection",
                    "from": from,
                    "to": to,
                });
                if let Some(route) = route {
                    entry["route"] = Value::String(route);
                }
                connections.push(entry);
            } else {
                let mut entry = json!({
                    "id": summary.id,
                    "type": summary.block_type,
                });
                if self.has_route(&summary.id, "get_rule").await {
                    let rule = self.route_msg(&summary.id, "get_rule", Value::Null).await?;
                    entry["rule"] = rule;
                }
                blocks.push(entry);
            }
        }

        Ok(json!({
            "version": FORMAT_VERSION,
            "blocks": blocks,
            "connections": connections,
        }))
    }

    /// Reconstruct blocks and connections from an export-shaped payload,
    /// remapping any id that collides with the live graph to `"{id}_{k}"`
    /// for the smallest free `k`.
    pub async fn import(&self, payload: Value) -> Result<ImportReport> {
        self.check_payload_size(&payload)?;
        let root = payload
            .as_object()
            .ok_or_else(|| GraphError::BadImport("expected a JSON object".into()))?;

        let blocks = root
            .get("blocks")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let connections = root
            .get("connections")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let existing = self.live_ids().await;
        let mut reserved: HashSet<String> = HashSet::new();
        let mut collision_map = std::collections::HashMap::new();

        for block in &blocks {
            let obj = block
                .as_object()
                .ok_or_else(|| GraphError::BadImport("block entry is not an object".into()))?;
            let old_id = obj
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| GraphError::BadImport("block entry missing 'id'".into()))?
                .to_string();
            let block_type = obj
                .get("type")
                .and_then(Value::as_str)
                .ok_or_else(|| GraphError::BadImport("block entry missing 'type'".into()))?
                .to_string();

            let new_id = dedupe_id(&old_id, |cand| existing.contains(cand) || reserved.contains(cand));
            reserved.insert(new_id.clone());
            collision_map.insert(old_id, new_id.clone());

            self.create_block(&block_type, Some(new_id.clone())).await?;
            if let Some(rule) = obj.get("rule") {
                self.route_msg(&new_id, "set_rule", rule.clone()).await?;
            }
        }

        for conn in &connections {
            let obj = conn
                .as_object()
                .ok_or_else(|| GraphError::BadImport("connection entry is not an object".into()))?;
            let old_id = obj
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| GraphError::BadImport("connection entry missing 'id'".into()))?
                .to_string();
            let from = obj
                .get("from")
                .and_then(Value::as_str)
                .ok_or_else(|| GraphError::BadImport("connection entry missing 'from'".into()))?
                .to_string();
            let to = obj
                .get("to")
                .and_then(Value::as_str)
                .ok_or_else(|| GraphError::BadImport("connection entry missing 'to'".into()))?
                .to_string();
            let route = obj.get("route").and_then(Value::as_str).map(str::to_string);

            let new_id = dedupe_id(&old_id, |cand| existing.contains(cand) || reserved.contains(cand));
            reserved.insert(new_id.clone());
            collision_map.insert(old_id, new_id.clone());

            let mapped_from = collision_map.get(&from).cloned().unwrap_or(from);
            let mapped_target = collision_map.get(&to).cloned().unwrap_or(to);
            let mapped_to = match route {
                Some(r) => format!("{mapped_target}/{r}"),
                None => mapped_target,
            };

            self.create_connection(&mapped_from, &mapped_to, Some(new_id))
                .await?;
        }

        Ok(ImportReport { collision_map })
    }
}
