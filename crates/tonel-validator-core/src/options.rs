use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Options accepted by the structured-source validation operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationOptions {
    /// Only check the class/method structure, skipping method bodies.
    #[serde(rename = "without-method-body", default)]
    pub without_method_body: bool,
}

impl ValidationOptions {
    pub const WITHOUT_METHOD_BODY: &'static str = "without-method-body";

    pub fn structure_only() -> Self {
        Self {
            without_method_body: true,
        }
    }

    /// Decode the loosely-typed option object sent by a tool caller.
    ///
    /// Never fails: `null`, a missing object, or a value of the wrong shape
    /// yields the defaults. Unknown keys and ill-typed flags are ignored but
    /// logged so that misspelled options do not vanish silently.
    pub fn from_json(raw: Option<&Value>) -> Self {
        let map = match raw {
            None | Some(Value::Null) => return Self::default(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                warn!(found = json_type_name(other), "ignoring non-object validation options");
                return Self::default();
            }
        };

        let mut options = Self::default();
        for (key, value) in map {
            if key != Self::WITHOUT_METHOD_BODY {
                warn!(option = %key, "ignoring unrecognized validation option");
                continue;
            }
            match value {
                Value::Bool(flag) => options.without_method_body = *flag,
                Value::Null => {}
                other => warn!(
                    option = %key,
                    found = json_type_name(other),
                    "ignoring non-boolean validation option"
                ),
            }
        }
        options
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
