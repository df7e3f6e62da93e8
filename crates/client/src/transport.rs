//! Transport seam between the state machine and the bank connection.
//!
//! `TransportGateway` is implemented by the embedding application on top of
//! its HTTP/TLS client, which also renders the envelope into the bank's XML
//! dialect. Keeping it a trait lets transfers run against a mock bank.

use std::future::Future;
use std::pin::Pin;

use ebics_protocol::{Message, ResponseMessage};

use crate::error::EbicsError;

/// Boxed future returned by [`TransportGateway::send`].
pub type SendFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ResponseMessage, EbicsError>> + Send + 'a>>;

/// Sends one request to the bank and returns its response.
///
/// Implementations report connection failures as [`EbicsError::Transport`]
/// and must be safe to share between concurrent transactions.
pub trait TransportGateway: Send + Sync {
    fn send<'a>(&'a self, message: &'a Message) -> SendFuture<'a>;
}
