//! TLS policy for the voice server connection.
//!
//! Voice servers routinely run with self-signed certificates, so certificate
//! verification is skipped unless the operator turns it back on. A client
//! certificate is optional and, when present, is read from a single PEM file
//! holding both the certificate chain and the private key.

use anyhow::{bail, Context, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Client certificate chain and key.
#[derive(Debug)]
pub struct ClientIdentity {
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl ClientIdentity {
    /// Load certificate chain and private key from one PEM file.
    pub fn load_pem(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let certs = CertificateDer::pem_file_iter(path)
            .with_context(|| format!("Failed to read certificate file {}", path.display()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Malformed certificate in {}", path.display()))?;

        if certs.is_empty() {
            bail!("No certificate found in {}", path.display());
        }

        let key = PrivateKeyDer::from_pem_file(path)
            .with_context(|| format!("No usable private key in {}", path.display()))?;

        info!("Loaded client certificate from {} ({} in chain)", path.display(), certs.len());

        Ok(Self { certs, key })
    }

    pub fn chain_len(&self) -> usize {
        self.certs.len()
    }
}

/// How the transport should set up TLS.
#[derive(Debug, Clone)]
pub struct TlsPolicy {
    /// Skip server certificate verification
    pub insecure_skip_verify: bool,
    /// Optional client certificate
    pub client_identity: Option<Arc<ClientIdentity>>,
}

impl Default for TlsPolicy {
    fn default() -> Self {
        Self {
            insecure_skip_verify: true,
            client_identity: None,
        }
    }
}

impl TlsPolicy {
    /// Build the rustls client configuration for this policy.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());

        let builder = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .context("TLS provider rejected default protocol versions")?;

        let builder = if self.insecure_skip_verify {
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(InsecureVerifier { provider }))
        } else {
            let roots = RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder.with_root_certificates(roots)
        };

        let config = match &self.client_identity {
            Some(identity) => builder
                .with_client_auth_cert(identity.certs.clone(), identity.key.clone_key())
                .context("Client certificate rejected")?,
            None => builder.with_no_client_auth(),
        };

        Ok(config)
    }
}

/// Accepts any server certificate.
#[derive(Debug)]
struct InsecureVerifier {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
