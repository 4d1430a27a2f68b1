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

//! Layer operations. A layer is a named scope for CI attributes and
//! relations; reads are merged over an ordered layer stack.

use serde::{Deserialize, Serialize};

use crate::client::{ApiClient, Query};
use crate::error::Error;

const CONTROLLER: &str = "Layer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayerState {
    Active,
    Deprecated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Layer {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    pub state: LayerState,
    /// Display color, ARGB encoded.
    pub color: i32,
}

impl ApiClient {
    /// All layers the caller may read from.
    pub fn get_all_layers(&self) -> Result<Vec<Layer>, Error> {
        self.get(CONTROLLER, "getAllLayers", &Query::new())
    }

    pub fn get_layer_by_name(&self, layer_name: &str) -> Result<Layer, Error> {
        let query = Query::new().add("layerName", layer_name);
        self.get(CONTROLLER, "getLayerByName", &query)
    }

    /// Multiple layers by name; fails as a whole if any name is unknown.
    pub fn get_layers_by_name(&self, layer_names: &[&str]) -> Result<Vec<Layer>, Error> {
        let mut query = Query::new();
        for name in layer_names {
            query = query.add("layerNames", name);
        }
        self.get(CONTROLLER, "getLayersByName", &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_layer() {
        let json = r#"{ "ID": 1, "Name": "CMDB", "State": "Active", "Color": -16776961 }"#;
        let layer: Layer = serde_json::from_str(json).unwrap();
        assert_eq!(layer.id, 1);
        assert_eq!(layer.name, "CMDB");
        assert_eq!(layer.state, LayerState::Active);
        assert_eq!(layer.color, -16776961);
    }

    #[test]
    fn test_deserialize_layer_list() {
        let json = r#"[
            { "ID": 1, "Name": "CMDB", "State": "Active", "Color": 0 },
            { "ID": 2, "Name": "Monitoring", "State": "Deprecated", "Color": 255 }
        ]"#;
        let layers: Vec<Layer> = serde_json::from_str(json).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].state, LayerState::Deprecated);
    }
}
