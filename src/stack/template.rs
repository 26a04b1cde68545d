//! CloudFormation template model.
//!
//! Only the parts of the template format the stack uses are modelled.
//! Resource properties stay as JSON values so each resource can be written
//! the way the CloudFormation reference documents it.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Template format version understood by CloudFormation
pub const FORMAT_VERSION: &str = "2010-09-09";

/// A CloudFormation template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub format_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,

    pub resources: IndexMap<String, Resource>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub outputs: IndexMap<String, Output>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            description: Some(description.into()),
            parameters: IndexMap::new(),
            resources: IndexMap::new(),
            outputs: IndexMap::new(),
        }
    }

    /// Add a template parameter; returns its logical ID for use with [`ref_`].
    pub fn add_parameter(&mut self, id: &str, parameter: Parameter) -> String {
        self.parameters.insert(id.to_string(), parameter);
        id.to_string()
    }

    /// Add a resource; returns its logical ID for use with [`ref_`] and [`get_att`].
    pub fn add_resource(&mut self, id: &str, resource: Resource) -> String {
        self.resources.insert(id.to_string(), resource);
        id.to_string()
    }

    pub fn add_output(&mut self, id: &str, output: Output) {
        self.outputs.insert(id.to_string(), output);
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A template parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Parameter {
    #[serde(rename = "Type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A template resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Resource {
    #[serde(rename = "Type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub properties: Value,
}

impl Resource {
    pub fn new(kind: &str, properties: Value) -> Self {
        Self {
            kind: kind.to_string(),
            properties,
        }
    }
}

/// A stack output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Output {
    pub value: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Output {
    pub fn new(value: Value, description: &str) -> Self {
        Self {
            value,
            description: Some(description.to_string()),
        }
    }
}

// Intrinsic functions

/// `{"Ref": id}`
pub fn ref_(id: &str) -> Value {
    json!({ "Ref": id })
}

/// `{"Fn::GetAtt": [id, attribute]}`
pub fn get_att(id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [id, attribute] })
}

/// `{"Fn::Sub": template}`
pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

/// `{"Fn::Base64": value}`
pub fn base64(value: Value) -> Value {
    json!({ "Fn::Base64": value })
}

/// A `Key`/`Value` tag list.
pub fn tags<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Value {
    Value::Array(
        pairs
            .into_iter()
            .map(|(k, v)| json!({ "Key": k, "Value": v }))
            .collect(),
    )
}
