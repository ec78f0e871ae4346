// Configuration for FahAdaptiveSamplingClient

use std::net::Ipv4Addr;
use std::path::PathBuf;

pub const DEFAULT_CERTIFICATE_FILE: &str = "api-certificate.pem";
pub const DEFAULT_KEY_FILE: &str = "api-private.pem";
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 30000;

/// Configuration for the FAH adaptive sampling client
#[derive(Clone, Debug)]
pub struct FahClientConfig {
    /// Base URL of the assignment server API
    pub as_api_url: String,
    /// Base URL of the work server API
    pub ws_api_url: String,
    /// Address the work server is known by on the assignment server
    pub ws_ip_addr: Ipv4Addr,
    /// PEM certificate presented for mutual TLS
    pub certificate_file: PathBuf,
    /// PEM private key matching the certificate
    pub key_file: PathBuf,
    /// Verify the certificate presented by FAH servers (default: true)
    pub verify: bool,
    /// Connection timeout in milliseconds (default: 5000)
    pub connect_timeout_ms: u64,
    /// Read timeout in milliseconds (default: 30000)
    pub read_timeout_ms: u64,
}

impl FahClientConfig {
    /// Config with the default identity files, verification on and default timeouts
    pub fn new(as_api_url: &str, ws_api_url: &str, ws_ip_addr: Ipv4Addr) -> Self {
        Self {
            as_api_url: as_api_url.to_string(),
            ws_api_url: ws_api_url.to_string(),
            ws_ip_addr,
            certificate_file: PathBuf::from(DEFAULT_CERTIFICATE_FILE),
            key_file: PathBuf::from(DEFAULT_KEY_FILE),
            verify: true,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }

    /// Set the certificate and key used for mutual TLS
    pub fn with_identity(mut self, certificate_file: impl Into<PathBuf>, key_file: impl Into<PathBuf>) -> Self {
        self.certificate_file = certificate_file.into();
        self.key_file = key_file.into();
        self
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_timeouts(mut self, connect_ms: u64, read_ms: u64) -> Self {
        self.connect_timeout_ms = connect_ms;
        self.read_timeout_ms = read_ms;
        self
    }
}
