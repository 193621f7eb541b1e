//! Schema types describing provider and resource configuration.
//!
//! The host reads these through `GET /schema`; the provider also uses them to
//! reject malformed configuration and to fill declared defaults before a
//! resource ever sees the value.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    Int,
    Bool,
    StringList,
    IntList,
    StringMap,
    /// Nested object with its own attributes.
    Block,
    /// List of nested objects.
    BlockList,
}

impl AttributeType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Int => value.is_i64(),
            AttributeType::Bool => value.is_boolean(),
            AttributeType::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            AttributeType::IntList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_i64)),
            AttributeType::StringMap => value
                .as_object()
                .is_some_and(|map| map.values().all(Value::is_string)),
            AttributeType::Block => value.is_object(),
            AttributeType::BlockList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub sensitive: bool,
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Attribute>,
}

impl Attribute {
    fn new(kind: AttributeType) -> Self {
        Self {
            kind,
            description: None,
            required: false,
            optional: false,
            computed: false,
            sensitive: false,
            force_new: false,
            default: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn required(kind: AttributeType) -> Self {
        Self {
            required: true,
            ..Self::new(kind)
        }
    }

    pub fn optional(kind: AttributeType) -> Self {
        Self {
            optional: true,
            ..Self::new(kind)
        }
    }

    pub fn computed(kind: AttributeType) -> Self {
        Self {
            computed: true,
            ..Self::new(kind)
        }
    }

    pub fn required_string() -> Self {
        Self::required(AttributeType::String)
    }

    pub fn optional_string() -> Self {
        Self::optional(AttributeType::String)
    }

    pub fn computed_string() -> Self {
        Self::computed(AttributeType::String)
    }

    /// Optional nested block.
    pub fn block(attributes: impl IntoIterator<Item = (&'static str, Attribute)>) -> Self {
        Self {
            optional: true,
            attributes: attributes
                .into_iter()
                .map(|(name, attr)| (name.to_string(), attr))
                .collect(),
            ..Self::new(AttributeType::Block)
        }
    }

    pub fn block_list(attributes: impl IntoIterator<Item = (&'static str, Attribute)>) -> Self {
        Self {
            kind: AttributeType::BlockList,
            ..Self::block(attributes)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Required block list.
    pub fn mandatory(mut self) -> Self {
        self.optional = false;
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schema {
    pub version: i64,
    pub attributes: BTreeMap<String, Attribute>,
}

impl Schema {
    pub fn v0() -> Self {
        Self {
            version: 0,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, attribute: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attribute);
        self
    }

    /// Check a configuration object against the schema.
    ///
    /// Returns every problem found rather than stopping at the first.
    /// Computed-only attributes may appear (they come back in prior state)
    /// but are never required.
    pub fn validate(&self, config: &Value) -> Vec<String> {
        let Some(object) = config.as_object() else {
            return vec!["configuration must be a JSON object".to_string()];
        };
        let mut problems = Vec::new();
        validate_object(&self.attributes, object, "", &mut problems);
        problems
    }

    /// Fill declared defaults for attributes that are absent or null.
    pub fn apply_defaults(&self, config: &mut Value) {
        if let Some(object) = config.as_object_mut() {
            apply_defaults_object(&self.attributes, object);
        }
    }

    pub fn force_new_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .filter(|(_, attr)| attr.force_new)
            .map(|(name, _)| name.as_str())
    }
}

fn validate_object(
    attributes: &BTreeMap<String, Attribute>,
    object: &Map<String, Value>,
    prefix: &str,
    problems: &mut Vec<String>,
) {
    for (name, value) in object {
        if name == "id" && prefix.is_empty() {
            continue;
        }
        let Some(attr) = attributes.get(name) else {
            problems.push(format!("unknown attribute '{}{}'", prefix, name));
            continue;
        };
        if value.is_null() {
            continue;
        }
        if !attr.kind.matches(value) {
            problems.push(format!(
                "attribute '{}{}' must be of type {:?}",
                prefix, name, attr.kind
            ));
            continue;
        }

        let nested_prefix = format!("{}{}.", prefix, name);
        match attr.kind {
            AttributeType::Block => {
                if let Some(inner) = value.as_object() {
                    validate_object(&attr.attributes, inner, &nested_prefix, problems);
                }
            }
            AttributeType::BlockList => {
                for inner in value.as_array().into_iter().flatten().filter_map(Value::as_object) {
                    validate_object(&attr.attributes, inner, &nested_prefix, problems);
                }
            }
            _ => {}
        }
    }

    for (name, attr) in attributes {
        let present = object.get(name).is_some_and(|value| !value.is_null());
        if attr.required && !present && attr.default.is_none() {
            problems.push(format!("missing required attribute '{}{}'", prefix, name));
        }
    }
}

fn apply_defaults_object(attributes: &BTreeMap<String, Attribute>, object: &mut Map<String, Value>) {
    for (name, attr) in attributes {
        let missing = object.get(name).map_or(true, Value::is_null);
        if missing {
            if let Some(default) = &attr.default {
                object.insert(name.clone(), default.clone());
            }
            continue;
        }

        match (attr.kind, object.get_mut(name)) {
            (AttributeType::Block, Some(Value::Object(inner))) => {
                apply_defaults_object(&attr.attributes, inner);
            }
            (AttributeType::BlockList, Some(Value::Array(items))) => {
                for item in items.iter_mut().filter_map(Value::as_object_mut) {
                    apply_defaults_object(&attr.attributes, item);
                }
            }
            _ => {}
        }
    }
}

/// Full schema set advertised to the host.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderSchema {
    pub provider: Schema,
    pub resources: BTreeMap<String, Schema>,
}
