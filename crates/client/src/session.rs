//! Bank connection context shared by transactions.

use std::fmt;
use std::sync::Arc;

use ebics_protocol::ProtocolVersion;
use ebics_protocol::constants::DEFAULT_REVISION;

use crate::config::TransferConfig;
use crate::crypto::{EncryptionCapability, SigningCapability};
use crate::error::EbicsError;

/// Identity of the bank server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankIdentity {
    pub host_id: String,
}

/// Identity of the subscriber acting on the bank connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub partner_id: String,
    pub user_id: String,
    pub system_id: Option<String>,
}

/// Borrowed capability handles, available once checked.
pub struct Capabilities<'a> {
    pub signer: &'a dyn SigningCapability,
    pub encryptor: &'a dyn EncryptionCapability,
}

/// Per-connection context, immutable once built.
///
/// A session is created once per banking connection and borrowed by every
/// transfer; it holds no per-transaction state, so independent transfers
/// can share it concurrently.
#[derive(Clone)]
pub struct Session {
    bank: BankIdentity,
    user: UserIdentity,
    protocol: ProtocolVersion,
    revision: u32,
    signer: Option<Arc<dyn SigningCapability>>,
    encryptor: Option<Arc<dyn EncryptionCapability>>,
}

impl Session {
    /// Starts building a session for the given host and subscriber.
    pub fn builder(
        host_id: impl Into<String>,
        partner_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> SessionBuilder {
        SessionBuilder {
            host_id: host_id.into(),
            partner_id: partner_id.into(),
            user_id: user_id.into(),
            system_id: None,
            protocol: ProtocolVersion::default(),
            revision: DEFAULT_REVISION,
            signer: None,
            encryptor: None,
        }
    }

    pub fn bank(&self) -> &BankIdentity {
        &self.bank
    }

    pub fn user(&self) -> &UserIdentity {
        &self.user
    }

    pub fn protocol(&self) -> ProtocolVersion {
        self.protocol
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Returns the capability handles, or a configuration error naming the
    /// missing one. Transfers call this before any network exchange.
    pub fn require_capabilities(&self) -> Result<Capabilities<'_>, EbicsError> {
        let signer = self
            .signer
            .as_deref()
            .ok_or_else(|| EbicsError::Configuration("session has no signing capability".into()))?;
        let encryptor = self.encryptor.as_deref().ok_or_else(|| {
            EbicsError::Configuration("session has no encryption capability".into())
        })?;
        Ok(Capabilities { signer, encryptor })
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("bank", &self.bank)
            .field("user", &self.user)
            .field("protocol", &self.protocol)
            .field("revision", &self.revision)
            .field("signer", &self.signer.is_some())
            .field("encryptor", &self.encryptor.is_some())
            .finish()
    }
}

/// Builder for [`Session`].
pub struct SessionBuilder {
    host_id: String,
    partner_id: String,
    user_id: String,
    system_id: Option<String>,
    protocol: ProtocolVersion,
    revision: u32,
    signer: Option<Arc<dyn SigningCapability>>,
    encryptor: Option<Arc<dyn EncryptionCapability>>,
}

impl SessionBuilder {
    pub fn system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    pub fn protocol(mut self, protocol: ProtocolVersion) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn revision(mut self, revision: u32) -> Self {
        self.revision = revision;
        self
    }

    /// Takes protocol version and revision from a transfer configuration.
    pub fn config(self, config: &TransferConfig) -> Self {
        self.protocol(config.protocol_version)
            .revision(config.revision)
    }

    pub fn signer(mut self, signer: Arc<dyn SigningCapability>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn encryptor(mut self, encryptor: Arc<dyn EncryptionCapability>) -> Self {
        self.encryptor = Some(encryptor);
        self
    }

    pub fn build(self) -> Result<Session, EbicsError> {
        for (name, value) in [
            ("host id", &self.host_id),
            ("partner id", &self.partner_id),
            ("user id", &self.user_id),
        ] {
            if value.trim().is_empty() {
                return Err(EbicsError::Validation(format!("{name} must not be empty")));
            }
        }

        Ok(Session {
            bank: BankIdentity {
                host_id: self.host_id,
            },
            user: UserIdentity {
                partner_id: self.partner_id,
                user_id: self.user_id,
                system_id: self.system_id,
            },
            protocol: self.protocol,
            revision: self.revision,
            signer: self.signer,
            encryptor: self.encryptor,
        })
    }
}
