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

//! Configuration item (CI) operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attribute::CiAttribute;
use crate::client::{ApiClient, Query};
use crate::error::Error;

const CONTROLLER: &str = "CI";

/// A CI merged across the requested layers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ci {
    #[serde(rename = "ID")]
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub attributes: Vec<CiAttribute>,
}

impl ApiClient {
    /// IDs of all CIs known to the server that the caller may read.
    pub fn get_all_ciids(&self) -> Result<Vec<Uuid>, Error> {
        self.get(CONTROLLER, "getAllCIIDs", &Query::new())
    }

    /// A single CI by ID, merged over `layer_ids`; `at_time` of `None` reads
    /// the latest state.
    pub fn get_ci_by_id(
        &self,
        layer_ids: &[i64],
        ciid: Uuid,
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Ci, Error> {
        let query = Query::new()
            .add_layers(layer_ids)
            .add("CIID", ciid)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getCIByID", &query)
    }

    /// Multiple CIs by ID. Watch out for the query URL getting too long when
    /// passing a lot of CIIDs.
    pub fn get_cis_by_id(
        &self,
        layer_ids: &[i64],
        ciids: &[Uuid],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Ci>, Error> {
        if ciids.is_empty() {
            return Err("Empty CIID list".into());
        }
        let query = Query::new()
            .add_layers(layer_ids)
            .add_ciids("CIIDs", ciids)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getCIsByID", &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{AttributeState, AttributeValueType};
    use crate::token::TokenManager;

    #[test]
    fn test_deserialize_ciid_list() {
        let json = r#"[
            "8bedfb41-d6f9-4e1a-aad3-0a6cbca8f0ea",
            "2c98cb53-4a69-4e49-b2a5-40c72fb730f7"
        ]"#;
        let ciids: Vec<Uuid> = serde_json::from_str(json).unwrap();
        assert_eq!(ciids.len(), 2);
        assert_eq!(
            ciids[0],
            "8bedfb41-d6f9-4e1a-aad3-0a6cbca8f0ea".parse::<Uuid>().unwrap()
        );
    }

    #[test]
    fn test_deserialize_ci() {
        let json = r#"{
            "ID": "8bedfb41-d6f9-4e1a-aad3-0a6cbca8f0ea",
            "Name": "web-01",
            "Attributes": [
                {
                    "Name": "hostname",
                    "Value": { "Type": "Text", "IsArray": false, "Values": ["web-01"] },
                    "State": "Renewed"
                }
            ]
        }"#;
        let ci: Ci = serde_json::from_str(json).unwrap();
        assert_eq!(ci.name.as_deref(), Some("web-01"));
        assert_eq!(ci.attributes.len(), 1);
        assert_eq!(ci.attributes[0].state, AttributeState::Renewed);
        assert_eq!(
            ci.attributes[0].value.value_type,
            AttributeValueType::Text
        );
    }

    #[test]
    fn test_deserialize_nameless_ci() {
        let json = r#"{ "ID": "8bedfb41-d6f9-4e1a-aad3-0a6cbca8f0ea", "Name": null, "Attributes": [] }"#;
        let ci: Ci = serde_json::from_str(json).unwrap();
        assert!(ci.name.is_none());
        assert!(ci.attributes.is_empty());
    }

    #[test]
    fn test_get_cis_by_id_rejects_empty_ciids() {
        let tm = TokenManager::new("https://idp.local/auth/realms/acme", "u", "p", "c");
        let client = ApiClient::new("https://omnikeeper.local", tm).unwrap();
        assert!(client.get_cis_by_id(&[1], &[], None).is_err());
    }
}
