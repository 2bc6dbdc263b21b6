// ── Endpoint addressing ──
//
// Pure (target, operation, scope, id) -> (method, path) resolution.
// The scheduler treats this as an opaque function; nothing here touches
// the network.

use meshboard_api::HttpMethod;
use serde_json::Value;

use crate::batch::Operation;
use crate::target::Target;

/// Site used when a batch carries no scope.
pub const DEFAULT_SITE: &str = "default";

/// Resolve the concrete endpoint for one per-target request.
///
/// Returns `None` for composite targets, which have no REST collection.
/// Update and delete address a single entity, so the id is appended to
/// the collection path.
pub(crate) fn resolve(
    target: Target,
    operation: Operation,
    scope: Option<&str>,
    entity_id: Option<&str>,
) -> Option<(HttpMethod, String)> {
    let collection = target.endpoint_path()?;
    let site = scope.unwrap_or(DEFAULT_SITE);

    let method = match operation {
        Operation::Read => HttpMethod::Get,
        Operation::Create => HttpMethod::Post,
        Operation::Update => HttpMethod::Put,
        Operation::Delete => HttpMethod::Delete,
    };

    let path = match (operation, entity_id) {
        (Operation::Update | Operation::Delete, Some(id)) => {
            format!("/api/s/{site}/{collection}/{id}")
        }
        _ => format!("/api/s/{site}/{collection}"),
    };

    Some((method, path))
}

/// Extract table records from a response body.
///
/// Controllers answer reads with either a bare JSON array or the
/// `{meta, data}` envelope; a single object is treated as a one-record
/// table and `null` as empty.
pub(crate) fn records_from(body: Value) -> Vec<Value> {
    match body {
        Value::Array(records) => records,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(records)) => records,
            Some(other) => vec![other],
            None => vec![Value::Object(map)],
        },
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn read_resolves_to_get_on_collection() {
        let (method, path) =
            resolve(Target::Network, Operation::Read, None, None).unwrap();
        assert_eq!(method, HttpMethod::Get);
        assert_eq!(path, "/api/s/default/rest/network");
    }

    #[test]
    fn scope_changes_addressing_only() {
        let (_, default_path) =
            resolve(Target::Switch, Operation::Read, None, None).unwrap();
        let (_, scoped_path) =
            resolve(Target::Switch, Operation::Read, Some("branch-office"), None).unwrap();
        assert_eq!(default_path, "/api/s/default/rest/switch");
        assert_eq!(scoped_path, "/api/s/branch-office/rest/switch");
    }

    #[test]
    fn update_appends_entity_id() {
        let (method, path) = resolve(
            Target::FirewallRule,
            Operation::Update,
            None,
            Some("fw001"),
        )
        .unwrap();
        assert_eq!(method, HttpMethod::Put);
        assert_eq!(path, "/api/s/default/rest/firewallrule/fw001");
    }

    #[test]
    fn delete_appends_entity_id() {
        let (method, path) =
            resolve(Target::Account, Operation::Delete, None, Some("acc9")).unwrap();
        assert_eq!(method, HttpMethod::Delete);
        assert_eq!(path, "/api/s/default/rest/account/acc9");
    }

    #[test]
    fn composite_targets_do_not_resolve() {
        assert!(resolve(Target::Client, Operation::Read, None, None).is_none());
        assert!(resolve(Target::Device, Operation::Read, None, None).is_none());
    }

    #[test]
    fn records_from_bare_array() {
        let records = records_from(json!([{ "id": 1 }, { "id": 2 }]));
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn records_from_data_envelope() {
        let records = records_from(json!({
            "meta": { "rc": "ok" },
            "data": [{ "id": 1 }]
        }));
        assert_eq!(records, vec![json!({ "id": 1 })]);
    }

    #[test]
    fn records_from_null_is_empty() {
        assert!(records_from(Value::Null).is_empty());
    }

    #[test]
    fn records_from_single_object_wraps() {
        let records = records_from(json!({ "id": "only" }));
        assert_eq!(records.len(), 1);
    }
}
