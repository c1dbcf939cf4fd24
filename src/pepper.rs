//! Process-wide pepper and the sources it can be loaded from.
//!
//! The pepper is read once at startup and handed to the
//! [`CredentialHasher`](crate::CredentialHasher). It is never persisted with
//! user records and never logged.

use std::fmt;
use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::error::{Error, Result};

/// Environment variable holding the pepper for [`EnvPepperSource`].
pub const PEPPER_ENV: &str = "PEPPERBOX_PEPPER";

/// Secret appended to every password before derivation.
#[derive(Clone)]
pub struct Pepper(Zeroizing<Vec<u8>>);

impl Pepper {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(Error::PepperSource("pepper must not be empty".to_string()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Pepper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pepper(<redacted>)")
    }
}

/// Somewhere a pepper can be read from at startup.
pub trait PepperSource {
    fn load(&self) -> Result<Pepper>;
}

/// Reads the pepper from [`PEPPER_ENV`], after loading `.env` if present.
#[derive(Debug, Clone)]
pub struct EnvPepperSource {
    var: String,
}

impl Default for EnvPepperSource {
    fn default() -> Self {
        Self::new(PEPPER_ENV)
    }
}

impl EnvPepperSource {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl PepperSource for EnvPepperSource {
    fn load(&self) -> Result<Pepper> {
        dotenvy::dotenv().ok();

        let value = std::env::var(&self.var)
            .map_err(|_| Error::PepperSource(format!("{} is not set", self.var)))?;
        Pepper::new(value.into_bytes())
    }
}

/// Reads the pepper from a secret file, e.g. a mounted secret volume.
///
/// A single trailing newline is stripped.
#[derive(Debug, Clone)]
pub struct FilePepperSource {
    path: PathBuf,
}

impl FilePepperSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl PepperSource for FilePepperSource {
    fn load(&self) -> Result<Pepper> {
        let mut bytes = Zeroizing::new(std::fs::read(&self.path).map_err(|e| {
            Error::PepperSource(format!("cannot read {}: {e}", self.path.display()))
        })?);

        if bytes.last() == Some(&b'\n') {
            bytes.pop();
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }
        }

        Pepper::new(bytes.as_slice())
    }
}
