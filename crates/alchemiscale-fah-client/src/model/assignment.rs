// Assignment server model types

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

/// Work server attributes held by the assignment server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsWorkServerData {
    /// The maximum assigns/sec allowed for this WS
    pub max_assign_rate: f64,
    pub weight: f64,
    /// WS constraints as defined in the AS online help
    #[serde(default, alias = "contraints")]
    pub constraints: String,
}

/// Project attributes held by the assignment server
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AsProjectData {
    /// IP address of the WS
    pub ws: Ipv4Addr,
    pub weight: f64,
    /// Project constraints as defined in the AS online help
    #[serde(default, alias = "contraints")]
    pub constraints: String,
}
