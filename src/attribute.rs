// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Merged attribute operations and their wire types.
//!
//! An attribute belongs to a CI and is merged across the requested layer
//! stack; the layer order in `layer_ids` decides which layer wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::{ApiClient, Query};
use crate::error::Error;

const CONTROLLER: &str = "Attribute";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValueType {
    Text,
    MultilineText,
    Integer,
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "YAML")]
    Yaml,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeState {
    New,
    Changed,
    Removed,
    Renewed,
}

/// An attribute value; arrays and scalars share one representation on the
/// wire, with every element carried as a string of the given type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeValue {
    #[serde(rename = "Type")]
    pub value_type: AttributeValueType,
    pub is_array: bool,
    pub values: Vec<String>,
}

impl AttributeValue {
    pub fn scalar(value: &str, value_type: AttributeValueType) -> Self {
        Self {
            value_type,
            is_array: false,
            values: vec![value.to_string()],
        }
    }

    pub fn array(values: &[&str], value_type: AttributeValueType) -> Self {
        Self {
            value_type,
            is_array: true,
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CiAttribute {
    pub name: String,
    pub value: AttributeValue,
    pub state: AttributeState,
}

/// One attribute to write in a bulk replace, addressed by CI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttributeFragment {
    pub name: String,
    pub value: AttributeValue,
    #[serde(rename = "CIID")]
    pub ciid: Uuid,
}

/// Payload for `bulkReplaceAttributesInLayer`: replaces all attributes below
/// `name_prefix` in the given layer with the supplied fragments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BulkAttributeLayerScope {
    pub name_prefix: String,
    #[serde(rename = "LayerID")]
    pub layer_id: i64,
    pub fragments: Vec<AttributeFragment>,
}

impl ApiClient {
    /// All merged attributes with an exact name, across all CIs.
    pub fn get_merged_attributes_with_name(
        &self,
        name: &str,
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<CiAttribute>, Error> {
        let query = Query::new()
            .add("name", name)
            .add_layers(layer_ids)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getMergedAttributesWithName", &query)
    }

    /// All merged attributes of the given CIs.
    pub fn get_merged_attributes(
        &self,
        ciids: &[Uuid],
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<CiAttribute>, Error> {
        if ciids.is_empty() {
            return Err("Empty CIID list".into());
        }
        let query = Query::new()
            .add_ciids("ciids", ciids)
            .add_layers(layer_ids)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getMergedAttributes", &query)
    }

    /// A single merged attribute of a single CI.
    pub fn get_merged_attribute(
        &self,
        ciid: Uuid,
        name: &str,
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<CiAttribute, Error> {
        let query = Query::new()
            .add("ciid", ciid)
            .add("name", name)
            .add_layers(layer_ids)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getMergedAttribute", &query)
    }

    /// Merged attributes whose name matches `regex`; `ciids` of `None`
    /// searches across all CIs.
    pub fn find_merged_attributes_by_name(
        &self,
        regex: &str,
        ciids: Option<&[Uuid]>,
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<CiAttribute>, Error> {
        let mut query = Query::new().add("regex", regex);
        if let Some(ciids) = ciids {
            query = query.add_ciids("ciids", ciids);
        }
        let query = query.add_layers(layer_ids).add_at_time(at_time);
        self.get(CONTROLLER, "findMergedAttributesByName", &query)
    }

    /// Replaces all attributes in the scoped layer with the given fragments.
    pub fn bulk_replace_attributes_in_layer(
        &self,
        data: &BulkAttributeLayerScope,
    ) -> Result<(), Error> {
        self.post_json(CONTROLLER, "bulkReplaceAttributesInLayer", data)
    }
}
