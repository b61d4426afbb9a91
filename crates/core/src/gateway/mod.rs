//! Payment gateway port.
//!
//! The provider API client itself lives outside this system; everything
//! here talks to it through this trait so the settlement, recovery, and
//! withdrawal paths all share one injected implementation.

pub mod webhook;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tixera_shared::types::money::Currency;

use crate::withdrawal::BankDetails;

/// Errors from the payment gateway port.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The call could not reach the provider.
    #[error("Gateway transport error: {0}")]
    Transport(String),

    /// The provider rejected the request.
    #[error("Gateway rejected the request: {0}")]
    Rejected(String),

    /// The provider has no record of the reference.
    #[error("Unknown transaction reference: {0}")]
    UnknownTransaction(String),
}

/// Status of a transaction as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayTransactionStatus {
    /// The charge went through.
    Success,
    /// The charge failed or was abandoned.
    Failed,
    /// The charge is still in progress on the provider side.
    Pending,
}

/// A transaction verification result from the provider.
#[derive(Debug, Clone)]
pub struct GatewayTransaction {
    /// The provider's own transaction identifier.
    pub external_ref: String,
    /// Charge status.
    pub status: GatewayTransactionStatus,
    /// Amount the provider collected.
    pub amount_paid: Decimal,
    /// When the provider recorded the charge.
    pub paid_at: Option<DateTime<Utc>>,
}

/// Status of an outbound transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    /// The transfer settled immediately.
    Success,
    /// The transfer was accepted and will settle asynchronously.
    Pending,
}

/// An accepted outbound transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// The provider's transfer reference.
    pub reference: String,
    /// Whether the transfer settled immediately or is still in flight.
    pub status: TransferStatus,
}

/// The payment provider, seen as an opaque port.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Verifies a transaction by our payment reference.
    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<GatewayTransaction, GatewayError>;

    /// Requests a transfer to an organizer's bank account.
    ///
    /// An `Ok` return means the provider accepted the transfer; only then
    /// may the caller debit the organizer's balance.
    async fn initiate_transfer(
        &self,
        amount: Decimal,
        currency: Currency,
        destination: &BankDetails,
    ) -> Result<TransferReceipt, GatewayError>;
}
