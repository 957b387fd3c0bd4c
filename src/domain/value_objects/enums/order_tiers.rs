use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderTier {
    Standard,
    Premium,
    Biography,
    /// Bespoke productions handled off-platform; excluded from the shareable
    /// viewing link.
    Custom,
}

impl OrderTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderTier::Standard => "standard",
            OrderTier::Premium => "premium",
            OrderTier::Biography => "biography",
            OrderTier::Custom => "custom",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "standard" => Some(OrderTier::Standard),
            "premium" => Some(OrderTier::Premium),
            "biography" => Some(OrderTier::Biography),
            "custom" => Some(OrderTier::Custom),
            _ => None,
        }
    }
}

impl Display for OrderTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
