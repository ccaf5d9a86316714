//! Fixture block types used only by this crate's own integration tests.
//! The concrete block-type library is an out-of-scope collaborator; these
//! four exist purely to give the graph manager something to route
//! messages through end-to-end.

use std::sync::Arc;

use flowmesh::{BlockLogic, Registry, RouteReply};
use serde_json::{json, Value};

/// Emits its stored rule whenever poked on the test-only `tick` route, and
/// reports/accepts that rule over `get_rule`/`set_rule` like a real rule
/// block would.
#[derive(Default)]
pub struct TickerLogic {
    rule: Value,
}

impl BlockLogic for TickerLogic {
    fn on_route(&mut self, route: &str, msg: Value) -> RouteReply {
        match route {
            "set_rule" => {
                self.rule = msg;
                RouteReply::reply(Value::Null)
            }
            "get_rule" => RouteReply::reply(self.rule.clone()),
            "tick" => RouteReply::reply_and_emit(Value::Null, self.rule.clone()),
            _ => RouteReply::reply(Value::Null),
        }
    }
}

/// Accumulates every message it receives on the default input; `poll`
/// reports how many and the most recent one.
#[derive(Default)]
pub struct CountLogic {
    count: u64,
    last: Value,
}

impl BlockLogic for CountLogic {
    fn on_input(&mut self, msg: Value) -> Option<Value> {
        self.count += 1;
        self.last = msg;
        None
    }

    fn on_route(&mut self, route: &str, _msg: Value) -> RouteReply {
        match route {
            "poll" => RouteReply::reply(json!({ "count": self.count, "last": self.last })),
            _ => RouteReply::reply(Value::Null),
        }
    }
}

/// Forwards only the messages that fail its rule; matching messages are
/// swallowed. The rule is `{"field": <name>, "equals": <value>}`; an unset
/// rule accepts (swallows) everything.
#[derive(Default)]
pub struct FilterLogic {
    rule: Value,
}

impl FilterLogic {
    fn accepts(&self, msg: &Value) -> bool {
        let (Some(field), Some(expected)) = (
            self.rule.get("field").and_then(Value::as_str),
            self.rule.get("equals"),
        ) else {
            return true;
        };
        msg.get(field) == Some(expected)
    }
}

impl BlockLogic for FilterLogic {
    fn on_input(&mut self, msg: Value) -> Option<Value> {
        if self.accepts(&msg) {
            None
        } else {
            Some(msg)
        }
    }

    fn on_route(&mut self, route: &str, msg: Value) -> RouteReply {
        match route {
            "set_rule" => {
                self.rule = msg;
                RouteReply::reply(Value::Null)
            }
            "get_rule" => RouteReply::reply(self.rule.clone()),
            _ => RouteReply::reply(Value::Null),
        }
    }
}

/// A two-mailbox terminal block: the default input fills the main mailbox,
/// the `rejects` route fills a second one (addressed as `<id>/rejects`),
/// and `poll`/`poll_rejects` read each back.
#[derive(Default)]
pub struct SinkLogic {
    received: Vec<Value>,
    rejected: Vec<Value>,
}

impl BlockLogic for SinkLogic {
    fn on_input(&mut self, msg: Value) -> Option<Value> {
        self.received.push(msg);
        None
    }

    fn on_route(&mut self, route: &str, msg: Value) -> RouteReply {
        match route {
            "rejects" => {
                self.rejected.push(msg);
                RouteReply::reply(Value::Null)
            }
            "poll" => RouteReply::reply(Value::Array(self.received.clone())),
            "poll_rejects" => RouteReply::reply(Value::Array(self.rejected.clone())),
            _ => RouteReply::reply(Value::Null),
        }
    }
}

/// A registry carrying the built-ins plus the four fixture types above,
/// shared by every integration test in this crate.
pub fn test_registry() -> Arc<Registry> {
    let mut reg = Registry::with_builtins();
    reg.register(
        "ticker",
        vec!["set_rule".to_string(), "get_rule".to_string(), "tick".to_string()],
        || Box::new(TickerLogic::default()),
    );
    reg.register("count", vec!["poll".to_string()], || {
        Box::new(CountLogic::default())
    });
    reg.register(
        "filter",
        vec!["set_rule".to_string(), "get_rule".to_string()],
        || Box::new(FilterLogic::default()),
    );
    reg.register(
        "sink",
        vec![
            "rejects".to_string(),
            "poll".to_string(),
            "poll_rejects".to_string(),
        ],
        || Box::new(SinkLogic::default()),
    );
    Arc::new(reg)
}
