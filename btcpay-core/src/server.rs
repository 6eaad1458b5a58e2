use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub version: String,
    #[serde(default)]
    pub onion: Option<String>,
    #[serde(default)]
    pub supported_payment_methods: Vec<String>,
    pub fully_synched: bool,
    #[serde(default)]
    pub sync_status: Vec<SyncStatus>,
}

impl ServerStatus {
    pub fn sync_status_of(&self, crypto_code: &str) -> Option<&SyncStatus> {
        self.sync_status
            .iter()
            .find(|status| status.crypto_code == crypto_code)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub crypto_code: String,
    pub chain_height: u64,
    pub sync_height: Option<u64>,
    pub node_information: Option<NodeInformation>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NodeInformation {
    pub headers: u64,
    pub blocks: u64,
    pub verification_progress: f64,
}
