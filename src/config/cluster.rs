use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClusterConfig {
    /// Identity of this data node inside the cluster. Assigned by the
    /// coordinator topology, not computed here.
    #[serde(default = "default_node_id")]
    pub node_id: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
        }
    }
}

impl ClusterConfig {
    /// Validates cluster configuration consistency
    pub fn validate(&self) -> Result<()> {
        if self.node_id == 0 {
            return Err(Error::Config(ConfigError::Message(
                "node_id cannot be 0 (reserved for invalid nodes)".into(),
            )));
        }
        Ok(())
    }
}

fn default_node_id() -> u32 {
    1
}
