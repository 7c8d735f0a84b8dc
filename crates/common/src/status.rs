//! Order status dimensions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Payment dimension of an order.
///
/// ```text
/// Pending ──┬──► Paid     (terminal)
///           └──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    /// Awaiting payment.
    #[default]
    Pending,

    /// Payment captured.
    Paid,

    /// Payment failed.
    Failed,
}

impl PaymentStatus {
    /// Returns true if a payment capture may mark the order paid from this state.
    ///
    /// Re-capturing an already paid order is allowed and leaves it paid.
    pub fn can_mark_paid(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Paid)
    }

    /// Returns true if moving to `next` does not un-pay the order.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        !matches!(self, PaymentStatus::Paid) || next == PaymentStatus::Paid
    }

    /// Returns true if this is a terminal state for payment purposes.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Paid)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "Pending",
            PaymentStatus::Paid => "Paid",
            PaymentStatus::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery dimension of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Processing => "Processing",
            DeliveryStatus::Shipped => "Shipped",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Returned when a stored or submitted status string is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for PaymentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(PaymentStatus::Pending),
            "Paid" => Ok(PaymentStatus::Paid),
            "Failed" => Ok(PaymentStatus::Failed),
            other => Err(UnknownStatus {
                kind: "payment",
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(DeliveryStatus::Processing),
            "Shipped" => Ok(DeliveryStatus::Shipped),
            "Delivered" => Ok(DeliveryStatus::Delivered),
            "Cancelled" => Ok(DeliveryStatus::Cancelled),
            other => Err(UnknownStatus {
                kind: "delivery",
                value: other.to_string(),
            }),
        }
    }
}
