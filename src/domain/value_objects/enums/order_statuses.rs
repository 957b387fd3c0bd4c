use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    PendingInterview,
    InterviewInProgress,
    InProduction,
    Ready,
    Delivered,
    Cancelled,
}

/// Everything that may move an order between statuses. All handlers route
/// through [`OrderStatus::transition`] so the rules live in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    CheckoutCompleted,
    IntakeSubmitted,
    AdminSetStatus(OrderStatus),
    Cancel,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("order in status {current} does not accept {action}")]
    Rejected {
        current: &'static str,
        action: &'static str,
    },
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::PendingInterview => "pending_interview",
            OrderStatus::InterviewInProgress => "interview_in_progress",
            OrderStatus::InProduction => "in_production",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(OrderStatus::Pending),
            "pending_interview" => Some(OrderStatus::PendingInterview),
            "interview_in_progress" => Some(OrderStatus::InterviewInProgress),
            "in_production" => Some(OrderStatus::InProduction),
            "ready" => Some(OrderStatus::Ready),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Applies `action` to the current status and returns the next one.
    ///
    /// Intake never regresses a finished order: re-submitting against a
    /// `ready` order leaves it `ready`. Admin updates accept any status value
    /// as long as the order is not cancelled; setting `ready` is not gated on
    /// the final video being present (manual override path).
    pub fn transition(self, action: &OrderAction) -> Result<OrderStatus, TransitionError> {
        let rejected = || TransitionError::Rejected {
            current: self.as_str(),
            action: action.as_str(),
        };

        match action {
            OrderAction::CheckoutCompleted => match self {
                OrderStatus::Pending => Ok(OrderStatus::PendingInterview),
                _ => Err(rejected()),
            },
            OrderAction::IntakeSubmitted => match self {
                OrderStatus::PendingInterview | OrderStatus::InterviewInProgress => {
                    Ok(OrderStatus::InProduction)
                }
                OrderStatus::Ready => Ok(OrderStatus::Ready),
                _ => Err(rejected()),
            },
            OrderAction::AdminSetStatus(next) => match self {
                OrderStatus::Cancelled => Err(rejected()),
                _ => Ok(*next),
            },
            OrderAction::Cancel => {
                if self.is_terminal() {
                    Err(rejected())
                } else {
                    Ok(OrderStatus::Cancelled)
                }
            }
        }
    }
}

impl OrderAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::CheckoutCompleted => "checkout_completed",
            OrderAction::IntakeSubmitted => "intake_submitted",
            OrderAction::AdminSetStatus(_) => "admin_set_status",
            OrderAction::Cancel => "cancel",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
