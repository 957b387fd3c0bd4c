use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TicketSubject {
    OrderQuestion,
    TechnicalIssue,
    RefundRequest,
    Feedback,
    Other,
}

impl TicketSubject {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketSubject::OrderQuestion => "order_question",
            TicketSubject::TechnicalIssue => "technical_issue",
            TicketSubject::RefundRequest => "refund_request",
            TicketSubject::Feedback => "feedback",
            TicketSubject::Other => "other",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "order_question" => Some(TicketSubject::OrderQuestion),
            "technical_issue" => Some(TicketSubject::TechnicalIssue),
            "refund_request" => Some(TicketSubject::RefundRequest),
            "feedback" => Some(TicketSubject::Feedback),
            "other" => Some(TicketSubject::Other),
            _ => None,
        }
    }
}

impl Display for TicketSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
