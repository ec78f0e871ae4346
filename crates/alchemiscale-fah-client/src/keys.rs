//! TLS private keys, certificates and certificate signing requests.
//!
//! FAH servers authenticate clients with mutual TLS. A new client creates a
//! private key, generates a CSR from it and presents the CSR to the
//! assignment server, which signs and returns the certificate that is then
//! used together with the key for every request.

use std::fs;
use std::io::Write;
use std::path::Path;

use rcgen::{
    CertificateParams, DistinguishedName, DnType, KeyPair, PKCS_ECDSA_P256_SHA256,
    PKCS_RSA_SHA256, RsaKeySize,
};
use tracing::{debug, info};

use crate::error::{FahError, Result};

/// Key algorithms supported for new keys
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// RSA, 4096 bits, public exponent 65537, signed with SHA-256
    #[default]
    Rsa4096,
    /// ECDSA on P-256, signed with SHA-256
    EcdsaP256,
}

impl std::str::FromStr for KeyAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rsa4096" | "rsa" => Ok(KeyAlgorithm::Rsa4096),
            "ecdsa-p256" | "ecdsa" => Ok(KeyAlgorithm::EcdsaP256),
            other => Err(format!("unknown key algorithm: {other}")),
        }
    }
}

/// A private key held in memory
pub struct PrivateKey {
    key_pair: KeyPair,
}

impl PrivateKey {
    /// The key as unencrypted PKCS#8 PEM
    pub fn to_pem(&self) -> String {
        self.key_pair.serialize_pem()
    }

    pub fn key_pair(&self) -> &KeyPair {
        &self.key_pair
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("algorithm", self.key_pair.algorithm())
            .finish_non_exhaustive()
    }
}

/// A PEM X.509 certificate
#[derive(Clone, Debug)]
pub struct Certificate {
    pem: String,
}

impl Certificate {
    pub fn from_pem(pem: &str) -> Result<Self> {
        CertificateParams::from_ca_cert_pem(pem)
            .map_err(|e| FahError::InvalidCertificate(e.to_string()))?;
        Ok(Self {
            pem: pem.to_string(),
        })
    }

    pub fn pem(&self) -> &str {
        &self.pem
    }
}

/// Certificate and private key presented to FAH servers
#[derive(Clone)]
pub struct Identity {
    certificate_pem: String,
    key_pem: String,
}

impl Identity {
    /// Load an identity from a certificate file and a key file
    pub fn from_files(certificate_file: &Path, key_file: &Path) -> Result<Self> {
        let certificate = read_certificate(certificate_file)?;
        let key_pem = fs::read_to_string(key_file)?;
        if !key_pem.contains("PRIVATE KEY-----") {
            return Err(anyhow::anyhow!("no PEM private key in {}", key_file.display()).into());
        }
        Ok(Self {
            certificate_pem: certificate.pem,
            key_pem,
        })
    }

    pub fn new(certificate: &Certificate, key: &PrivateKey) -> Self {
        Self {
            certificate_pem: certificate.pem.clone(),
            key_pem: key.to_pem(),
        }
    }

    /// Certificate followed by key, the bundle layout reqwest expects
    pub fn to_pem_bundle(&self) -> Vec<u8> {
        let mut bundle = Vec::with_capacity(self.certificate_pem.len() + self.key_pem.len() + 1);
        bundle.extend_from_slice(self.certificate_pem.as_bytes());
        if !self.certificate_pem.ends_with('\n') {
            bundle.push(b'\n');
        }
        bundle.extend_from_slice(self.key_pem.as_bytes());
        bundle
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity").finish_non_exhaustive()
    }
}

/// Create a new RSA-4096 private key
pub fn create_key() -> Result<PrivateKey> {
    create_key_with(KeyAlgorithm::Rsa4096)
}

pub fn create_key_with(algorithm: KeyAlgorithm) -> Result<PrivateKey> {
    debug!(?algorithm, "Generating private key");
    let key_pair = match algorithm {
        KeyAlgorithm::Rsa4096 => KeyPair::generate_rsa_for(&PKCS_RSA_SHA256, RsaKeySize::_4096)?,
        KeyAlgorithm::EcdsaP256 => KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)?,
    };
    Ok(PrivateKey { key_pair })
}

/// Read a PKCS#8 PEM private key
pub fn read_key(key_file: &Path) -> Result<PrivateKey> {
    let pem = fs::read_to_string(key_file)?;
    let key_pair = KeyPair::from_pem(&pem)?;
    Ok(PrivateKey { key_pair })
}

/// Write a private key as unencrypted PEM, readable by the owner only
pub fn write_key(key: &PrivateKey, key_file: &Path) -> Result<()> {
    write_private(key_file, key.to_pem().as_bytes())?;
    info!(path = %key_file.display(), "Wrote private key");
    Ok(())
}

pub fn read_certificate(certificate_file: &Path) -> Result<Certificate> {
    let pem = fs::read_to_string(certificate_file)?;
    Certificate::from_pem(&pem)
}

/// Build a CSR with subject `CN=<common_name>` signed by `key`, in PEM form
pub fn csr_pem(key: &PrivateKey, common_name: &str) -> Result<String> {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, common_name);
    params.distinguished_name = dn;

    let csr = params.serialize_request(&key.key_pair)?;
    Ok(csr.pem()?)
}

/// Generate a CSR and write it to `csr_file`.
///
/// The CSR must be presented to an assignment server to receive a valid
/// certificate.
pub fn generate_csr(key: &PrivateKey, common_name: &str, csr_file: &Path) -> Result<()> {
    let pem = csr_pem(key, common_name)?;
    fs::write(csr_file, pem)?;
    info!(path = %csr_file.display(), common_name, "Wrote certificate signing request");
    Ok(())
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(contents)
}
