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

//! Merged relation operations. A relation is a directed, predicate-labeled
//! edge between two CIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::client::{ApiClient, Query};
use crate::error::Error;

const CONTROLLER: &str = "Relation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationState {
    New,
    Removed,
    Renewed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Relation {
    #[serde(rename = "FromCIID")]
    pub from_ciid: Uuid,
    #[serde(rename = "ToCIID")]
    pub to_ciid: Uuid,
    #[serde(rename = "PredicateID")]
    pub predicate_id: String,
    pub state: RelationState,
}

impl ApiClient {
    /// A single merged relation identified by its endpoints and predicate.
    pub fn get_merged_relation(
        &self,
        from_ciid: Uuid,
        to_ciid: Uuid,
        predicate_id: &str,
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Relation, Error> {
        let query = Query::new()
            .add("fromCIID", from_ciid)
            .add("toCIID", to_ciid)
            .add("predicateID", predicate_id)
            .add_layers(layer_ids)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getMergedRelation", &query)
    }

    /// All merged relations carrying the given predicate.
    pub fn get_merged_relations_with_predicate(
        &self,
        predicate_id: &str,
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Relation>, Error> {
        let query = Query::new()
            .add("predicateID", predicate_id)
            .add_layers(layer_ids)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getMergedRelationsWithPredicate", &query)
    }

    pub fn get_all_merged_relations(
        &self,
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Relation>, Error> {
        let query = Query::new().add_layers(layer_ids).add_at_time(at_time);
        self.get(CONTROLLER, "getAllMergedRelations", &query)
    }

    pub fn get_merged_relations_outgoing_from_ci(
        &self,
        from_ciid: Uuid,
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Relation>, Error> {
        let query = Query::new()
            .add("fromCIID", from_ciid)
            .add_layers(layer_ids)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getMergedRelationsOutgoingFromCI", &query)
    }

    /// All merged relations a CI participates in, in either direction.
    pub fn get_merged_relations_from_or_to_ci(
        &self,
        ciid: Uuid,
        layer_ids: &[i64],
        at_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<Relation>, Error> {
        let query = Query::new()
            .add("ciid", ciid)
            .add_layers(layer_ids)
            .add_at_time(at_time);
        self.get(CONTROLLER, "getMergedRelationsFromOrToCI", &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_relation() {
        let json = r#"{
            "FromCIID": "8bedfb41-d6f9-4e1a-aad3-0a6cbca8f0ea",
            "ToCIID": "2c98cb53-4a69-4e49-b2a5-40c72fb730f7",
            "PredicateID": "runs_on",
            "State": "New"
        }"#;
        let relation: Relation = serde_json::from_str(json).unwrap();
        assert_eq!(relation.predicate_id, "runs_on");
        assert_eq!(relation.state, RelationState::New);
        assert_ne!(relation.from_ciid, relation.to_ciid);
    }
}
