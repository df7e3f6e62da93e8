//! Test doubles: a scriptable mock bank and deterministic capabilities.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use ebics_protocol::{Message, ProtocolVersion, ResponseMessage, TransactionId, TransactionPhase};

use crate::config::TransferConfig;
use crate::crypto::{CryptoError, EncryptionCapability, SigningCapability};
use crate::error::EbicsError;
use crate::session::Session;
use crate::transport::{SendFuture, TransportGateway};

type Responder = Box<dyn Fn(&Message) -> Result<ResponseMessage, EbicsError> + Send + Sync>;
type SendHook = Box<dyn Fn(&Message) + Send + Sync>;

pub(crate) fn txid(hex: &str) -> TransactionId {
    TransactionId::from_hex(hex).unwrap()
}

/// Records every request and answers through a responder closure.
pub(crate) struct MockBank {
    responder: Responder,
    hook: Option<SendHook>,
    messages: Mutex<Vec<Message>>,
    delay: Option<Duration>,
    fail_on_segment: Option<u32>,
}

impl MockBank {
    pub(crate) fn new(
        responder: impl Fn(&Message) -> Result<ResponseMessage, EbicsError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            hook: None,
            messages: Mutex::new(Vec::new()),
            delay: None,
            fail_on_segment: None,
        }
    }

    /// Accepts everything under transaction `hex`, echoing segment numbers.
    pub(crate) fn accepting(hex: &str) -> Self {
        let id = txid(hex);
        Self::new(move |msg: &Message| {
            let mut resp = ResponseMessage::ok(msg.phase()).with_transaction_id(id.clone());
            if let Some(seg) = msg.segment_number() {
                resp = resp.with_segment(seg.number, seg.last_segment);
            }
            Ok(resp)
        })
    }

    /// Fails the transfer request for segment `n` with a transport error.
    pub(crate) fn fail_on_segment(mut self, n: u32) -> Self {
        self.fail_on_segment = Some(n);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Runs `hook` as each request arrives, before the response is produced.
    pub(crate) fn on_send(mut self, hook: impl Fn(&Message) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub(crate) fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }
}

impl TransportGateway for MockBank {
    fn send<'a>(&'a self, message: &'a Message) -> SendFuture<'a> {
        Box::pin(async move {
            self.messages.lock().unwrap().push(message.clone());
            if let Some(hook) = &self.hook {
                hook(message);
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let segment = message.segment_number().map(|s| s.number);
            if message.phase() == TransactionPhase::Transfer
                && segment.is_some()
                && segment == self.fail_on_segment
            {
                return Err(EbicsError::Transport("connection reset by peer".into()));
            }
            (self.responder)(message)
        })
    }
}

/// Signs by prefixing `SIG:` to the input.
pub(crate) struct MockSigner;

impl SigningCapability for MockSigner {
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut sig = b"SIG:".to_vec();
        sig.extend_from_slice(data);
        Ok(sig)
    }
}

pub(crate) struct FailingSigner;

impl SigningCapability for FailingSigner {
    fn sign(&self, _data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Err(CryptoError::Signing("smart card not present".into()))
    }
}

/// Length-preserving XOR "cipher".
pub(crate) struct MockCipher;

impl MockCipher {
    fn xor(data: &[u8]) -> Vec<u8> {
        data.iter().map(|b| b ^ 0x5A).collect()
    }
}

impl EncryptionCapability for MockCipher {
    fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(Self::xor(data))
    }

    fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(Self::xor(data))
    }
}

pub(crate) fn session_with_signer(signer: Arc<dyn SigningCapability>) -> Session {
    Session::builder("EBIXHOST", "PARTNER1", "USER1")
        .signer(signer)
        .encryptor(Arc::new(MockCipher))
        .build()
        .unwrap()
}

pub(crate) fn session_with_version(version: ProtocolVersion) -> Session {
    Session::builder("EBIXHOST", "PARTNER1", "USER1")
        .protocol(version)
        .signer(Arc::new(MockSigner))
        .encryptor(Arc::new(MockCipher))
        .build()
        .unwrap()
}

pub(crate) fn test_session() -> Session {
    session_with_signer(Arc::new(MockSigner))
}

pub(crate) fn test_session_without_capabilities() -> Session {
    Session::builder("EBIXHOST", "PARTNER1", "USER1")
        .build()
        .unwrap()
}

pub(crate) fn config_with_limit(segment_size_limit: usize) -> TransferConfig {
    TransferConfig {
        segment_size_limit,
        ..TransferConfig::default()
    }
}
