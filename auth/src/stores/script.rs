//! Atomic server-side cache scripts.
//!
//! The conditions/actions interpreter evaluates a list of
//! `{conditions, success_actions, failure_actions}` sets against the current
//! state of one hash and applies the matching action list, all inside a
//! single Redis script invocation. Correctness of the OTP and counter flows
//! depends on this being genuinely atomic rather than client-side
//! check-then-act.

use crate::error::{AuthError, Result};
use redis::Script;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Comparison operator applied to a hash field.
///
/// Ordering operators coerce a missing field to `0`; equality operators
/// compare against the empty string when the field is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operator {
    /// String equality.
    #[serde(rename = "==")]
    Eq,
    /// String inequality.
    #[serde(rename = "!=")]
    Ne,
    /// Numeric greater-than.
    #[serde(rename = ">")]
    Gt,
    /// Numeric greater-or-equal.
    #[serde(rename = ">=")]
    Ge,
    /// Numeric less-than.
    #[serde(rename = "<")]
    Lt,
    /// Numeric less-or-equal.
    #[serde(rename = "<=")]
    Le,
}

/// Mutation applied to the hash (or its TTL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    /// Set a field.
    #[serde(rename = "hset")]
    HSet,
    /// Increment a numeric field.
    #[serde(rename = "hincr")]
    HIncr,
    /// Set the key TTL in seconds (field is ignored).
    #[serde(rename = "expire")]
    Expire,
}

/// Single field comparison.
#[derive(Debug, Clone, Serialize)]
pub struct Condition {
    /// Hash field name.
    pub field: String,
    /// Comparison operator.
    pub operator: Operator,
    /// Right-hand side, always transported as a string.
    pub value: String,
}

impl Condition {
    /// Build a condition.
    #[must_use]
    pub fn new(field: &str, operator: Operator, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value: value.to_string(),
        }
    }
}

/// Single mutation.
#[derive(Debug, Clone, Serialize)]
pub struct Action {
    /// Hash field name (empty for key-level actions).
    pub field: String,
    /// Mutation kind.
    pub action: ActionKind,
    /// Value or increment, always transported as a string.
    pub value: String,
}

impl Action {
    /// Set `field` to `value`.
    #[must_use]
    pub fn hset(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            action: ActionKind::HSet,
            value: value.to_string(),
        }
    }

    /// Increment `field` by `by`.
    #[must_use]
    pub fn hincr(field: &str, by: i64) -> Self {
        Self {
            field: field.to_string(),
            action: ActionKind::HIncr,
            value: by.to_string(),
        }
    }

    /// Set the key TTL to `seconds`.
    #[must_use]
    pub fn expire(seconds: i64) -> Self {
        Self {
            field: String::new(),
            action: ActionKind::Expire,
            value: seconds.to_string(),
        }
    }
}

/// One conditions-then-actions set.
#[derive(Debug, Clone, Serialize)]
pub struct ConditionSet {
    /// Conditions that must all hold.
    pub conditions: Vec<Condition>,
    /// Actions applied when they do.
    pub success_actions: Vec<Action>,
    /// Actions applied when they do not.
    pub failure_actions: Vec<Action>,
}

/// Script reply: per-set success flags plus any requested field values.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptReply {
    /// Requested field values after all actions ran.
    #[serde(default)]
    pub results: HashMap<String, serde_json::Value>,

    /// One flag per condition set, in submission order.
    #[serde(default)]
    pub is_success: Vec<u8>,
}

impl ScriptReply {
    /// Whether the set at `index` matched its conditions.
    #[must_use]
    pub fn succeeded(&self, index: usize) -> bool {
        self.is_success.get(index).copied() == Some(1)
    }
}

const CONDITIONAL_UPDATE: &str = r#"
    local key = KEYS[1]
    local results = {}
    local is_success = {}

    local fields = cjson.decode(ARGV[1])
    local return_list = cjson.decode(ARGV[2])
    local sets = cjson.decode(ARGV[3])

    local fields_to_return = {}
    for i = 1, #return_list do
        fields_to_return[return_list[i]] = true
    end

    local current_values_raw = {}
    if #fields > 0 then
        current_values_raw = redis.call("HMGET", key, unpack(fields))
    end

    local current_values = {}
    for i = 1, #fields do
        current_values[fields[i]] = current_values_raw[i]
    end

    local function handle_actions(actions)
        local hset_args = {}

        for i, action in ipairs(actions) do
            local field = action["field"]
            local action_type = action["action"]
            local value = action["value"]

            if #hset_args > 0 and action_type ~= "hset" then
                redis.call("HSET", key, unpack(hset_args))
                hset_args = {}
            end

            if action_type == "hset" then
                hset_args[#hset_args + 1] = field
                hset_args[#hset_args + 1] = value

                if fields_to_return[field] then
                    results[field] = value
                end
            elseif action_type == "hincr" then
                local new_value = redis.call("HINCRBY", key, field, tonumber(value))

                if fields_to_return[field] then
                    results[field] = new_value
                end
            elseif action_type == "expire" then
                redis.call("EXPIRE", key, tonumber(value))
            end
        end

        if #hset_args > 0 then
            redis.call("HSET", key, unpack(hset_args))
        end
    end

    local function handle_conditions(conditions)
        for i, condition in ipairs(conditions) do
            local field = condition["field"]
            local operator = condition["operator"]
            local value = condition["value"]

            if operator == "==" then
                local current_value = current_values[field] and tostring(current_values[field]) or ""
                if current_value ~= tostring(value) then
                    return 0
                end
            elseif operator == "!=" then
                local current_value = current_values[field] and tostring(current_values[field]) or ""
                if current_value == tostring(value) then
                    return 0
                end
            elseif operator == ">" then
                local current_value = current_values[field] and tonumber(current_values[field]) or 0
                if current_value <= tonumber(value) then
                    return 0
                end
            elseif operator == ">=" then
                local current_value = current_values[field] and tonumber(current_values[field]) or 0
                if current_value < tonumber(value) then
                    return 0
                end
            elseif operator == "<" then
                local current_value = current_values[field] and tonumber(current_values[field]) or 0
                if current_value >= tonumber(value) then
                    return 0
                end
            elseif operator == "<=" then
                local current_value = current_values[field] and tonumber(current_values[field]) or 0
                if current_value > tonumber(value) then
                    return 0
                end
            end
        end

        return 1
    end

    for i = 1, #sets do
        if handle_conditions(sets[i]["conditions"]) == 1 then
            handle_actions(sets[i]["success_actions"])
            is_success[i] = 1
        else
            handle_actions(sets[i]["failure_actions"])
            is_success[i] = 0
        end
    end

    for field in pairs(fields_to_return) do
        if results[field] == nil and current_values[field] ~= nil then
            results[field] = current_values[field]
        end
    end

    return cjson.encode({results = results, is_success = is_success})
"#;

const INCR_WITH_EXPIRY: &str = r"
    local result = redis.call('INCRBY', KEYS[1], ARGV[1])
    redis.call('EXPIRE', KEYS[1], ARGV[2])
    return result
";

const GET_DEL: &str = r"
    local result = redis.call('GET', KEYS[1])

    if result then
        redis.call('DEL', KEYS[1])
    end

    return result
";

/// Collect the distinct fields referenced by conditions and return list, in
/// first-seen order, for the script's single `HMGET`.
fn collect_fields(sets: &[ConditionSet], fields_to_return: &[&str]) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();

    for set in sets {
        for condition in &set.conditions {
            if !condition.field.is_empty() && !fields.contains(&condition.field) {
                fields.push(condition.field.clone());
            }
        }
    }

    for field in fields_to_return {
        if !field.is_empty() && !fields.iter().any(|f| f == field) {
            fields.push((*field).to_string());
        }
    }

    fields
}

/// Atomically evaluate condition sets against one hash and apply the
/// matching action lists.
///
/// # Errors
///
/// Returns error when argument serialization, script execution, or reply
/// parsing fails.
pub async fn hset_with_condition(
    conn: &mut ConnectionManager,
    key: &str,
    sets: &[ConditionSet],
    fields_to_return: &[&str],
) -> Result<ScriptReply> {
    let fields = collect_fields(sets, fields_to_return);

    let fields_json = serde_json::to_string(&fields)
        .map_err(|e| AuthError::internal(format!("Failed to encode script fields: {e}")))?;
    let return_json = serde_json::to_string(fields_to_return)
        .map_err(|e| AuthError::internal(format!("Failed to encode script return list: {e}")))?;
    let sets_json = serde_json::to_string(sets)
        .map_err(|e| AuthError::internal(format!("Failed to encode condition sets: {e}")))?;

    let raw: String = Script::new(CONDITIONAL_UPDATE)
        .key(key)
        .arg(fields_json)
        .arg(return_json)
        .arg(sets_json)
        .invoke_async(conn)
        .await
        .map_err(|e| AuthError::internal(format!("Conditional update failed: {e}")))?;

    serde_json::from_str(&raw)
        .map_err(|e| AuthError::internal(format!("Malformed script reply: {e}")))
}

/// `INCRBY` then `EXPIRE` in one script, returning the new value.
///
/// # Errors
///
/// Returns error when script execution fails.
pub async fn incr_with_expiry(
    conn: &mut ConnectionManager,
    key: &str,
    by: i64,
    ttl_seconds: i64,
) -> Result<i64> {
    Script::new(INCR_WITH_EXPIRY)
        .key(key)
        .arg(by)
        .arg(ttl_seconds)
        .invoke_async(conn)
        .await
        .map_err(|e| AuthError::internal(format!("Counter update failed: {e}")))
}

/// `GET` then `DEL` in one script: of two racing callers exactly one
/// observes the value.
///
/// # Errors
///
/// Returns error when script execution fails.
pub async fn get_del(conn: &mut ConnectionManager, key: &str) -> Result<Option<String>> {
    Script::new(GET_DEL)
        .key(key)
        .invoke_async(conn)
        .await
        .map_err(|e| AuthError::internal(format!("Atomic pop failed: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_serializes_with_symbolic_operator() {
        let condition = Condition::new("retry", Operator::Lt, 5);
        let json = serde_json::to_value(&condition).unwrap();
        assert_eq!(json["operator"], "<");
        assert_eq!(json["value"], "5");
    }

    #[test]
    fn test_action_serializes_kind_names() {
        assert_eq!(
            serde_json::to_value(Action::hset("status", 1)).unwrap()["action"],
            "hset"
        );
        assert_eq!(
            serde_json::to_value(Action::hincr("retry", 1)).unwrap()["action"],
            "hincr"
        );
        let expire = serde_json::to_value(Action::expire(600)).unwrap();
        assert_eq!(expire["action"], "expire");
        assert_eq!(expire["field"], "");
    }

    #[test]
    fn test_collect_fields_dedupes_in_order() {
        let sets = vec![
            ConditionSet {
                conditions: vec![
                    Condition::new("issued_at", Operator::Ne, ""),
                    Condition::new("status", Operator::Eq, 0),
                ],
                success_actions: vec![],
                failure_actions: vec![],
            },
            ConditionSet {
                conditions: vec![
                    Condition::new("issued_at", Operator::Gt, 10),
                    Condition::new("retry", Operator::Lt, 5),
                ],
                success_actions: vec![],
                failure_actions: vec![],
            },
        ];

        let fields = collect_fields(&sets, &["code", "status"]);
        assert_eq!(fields, vec!["issued_at", "status", "retry", "code"]);
    }

    #[test]
    fn test_reply_success_flags() {
        let reply: ScriptReply =
            serde_json::from_str(r#"{"results":{},"is_success":[1,0]}"#).unwrap();
        assert!(reply.succeeded(0));
        assert!(!reply.succeeded(1));
        assert!(!reply.succeeded(2));
    }

    #[test]
    fn test_reply_tolerates_missing_fields() {
        let reply: ScriptReply = serde_json::from_str("{}").unwrap();
        assert!(reply.results.is_empty());
        assert!(!reply.succeeded(0));
    }
}
