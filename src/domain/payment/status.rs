//! Processor status vocabularies.
//!
//! Each operation has its own closed set of statuses plus a catch-all so that
//! new values introduced by the processor never break parsing.

use serde::{Deserialize, Serialize};

/// Status of a one-off payment request as reported on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentRequestStatus {
    /// Payment link created and awaiting the customer.
    Pending,

    /// Customer paid.
    Completed,

    /// Payment attempt failed.
    Failed,

    /// Payment link expired before completion.
    Expired,

    /// Any status this integration does not know about.
    #[serde(other)]
    Unknown,
}

/// Status of a recurring billing plan or of a charge against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringBillingStatus {
    /// Plan created; customer still has to save a card.
    Scheduled,

    /// Card saved and plan running.
    Active,

    /// Charge captured.
    Succeeded,

    /// Charge declined or plan failed.
    Failed,

    /// Plan cancelled.
    Canceled,

    /// Any status this integration does not know about.
    #[serde(other)]
    Unknown,
}

/// Status carried by an inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationStatus {
    Pending,
    Completed,
    Scheduled,
    Succeeded,
    Failed,
    /// Forward-compatible bucket for statuses with no state transition.
    Other(String),
}

impl NotificationStatus {
    /// Parses the raw `status` field.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" => Self::Pending,
            "completed" => Self::Completed,
            "scheduled" => Self::Scheduled,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// True if the notification settles the order as paid.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Succeeded)
    }

    /// True if the notification marks the order as failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Scheduled => "scheduled",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
