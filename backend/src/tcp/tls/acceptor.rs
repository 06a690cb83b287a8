//! TLS acceptor loading from a PKCS#12 identity.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use native_tls::{Identity, TlsAcceptor};

use super::error::TlsError;

/// Load a TLS acceptor from a PKCS#12 file protected by `password`
pub fn load_tls_acceptor(
    pkcs12_path: impl AsRef<Path>,
    password: &str,
) -> Result<Arc<TlsAcceptor>, TlsError> {
    let path = pkcs12_path.as_ref();
    let identity_data = fs::read(path).map_err(|e| {
        TlsError::InvalidCertificate(format!("Cannot open {}: {}", path.display(), e))
    })?;

    if identity_data.is_empty() {
        return Err(TlsError::InvalidCertificate(
            "Certificate file is empty".to_string(),
        ));
    }

    let identity = Identity::from_pkcs12(&identity_data, password)
        .map_err(|e| TlsError::InvalidCertificate(format!("Invalid PKCS#12 format: {}", e)))?;

    Ok(Arc::new(TlsAcceptor::new(identity)?))
}
