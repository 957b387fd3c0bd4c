use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Relive credit bundles. Prices are in cents; Stripe line items are built
/// from these via `price_data`, so no dashboard-managed price ids are needed.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CreditPackage {
    pub id: &'static str,
    pub name: &'static str,
    pub credits: i32,
    pub amount_cents: i64,
}

pub const CREDIT_PACKAGES: [CreditPackage; 3] = [
    CreditPackage {
        id: "starter",
        name: "Starter Pack",
        credits: 10,
        amount_cents: 999,
    },
    CreditPackage {
        id: "plus",
        name: "Plus Pack",
        credits: 30,
        amount_cents: 2499,
    },
    CreditPackage {
        id: "pro",
        name: "Pro Pack",
        credits: 100,
        amount_cents: 5999,
    },
];

pub fn find_credit_package(package_id: &str) -> Option<&'static CreditPackage> {
    CREDIT_PACKAGES.iter().find(|p| p.id == package_id)
}

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub type_: String,
    pub data: StripeEventData,
}

#[derive(Debug, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeCheckoutSession {
    pub id: Option<String>,
    pub mode: Option<String>,
    pub customer: Option<String>,
    pub customer_details: Option<StripeCustomerDetails>,
    pub payment_intent: Option<String>,
    pub payment_status: Option<String>,
    pub amount_total: Option<i64>,
    pub metadata: Option<HashMap<String, String>>,
    pub line_items: Option<StripeLineItems>,
}

impl StripeCheckoutSession {
    pub fn customer_email(&self) -> Option<&str> {
        self.customer_details
            .as_ref()
            .and_then(|details| details.email.as_deref())
    }

    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get(key))
            .map(String::as_str)
    }

    pub fn first_price_id(&self) -> Option<&str> {
        self.line_items
            .as_ref()
            .and_then(|items| items.data.first())
            .and_then(|item| item.price.as_ref())
            .and_then(|price| price.id.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeCustomerDetails {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StripeLineItems {
    pub data: Vec<StripeLineItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeLineItem {
    pub price: Option<StripePrice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripePrice {
    pub id: Option<String>,
}

/// A freshly created Checkout Session: the id is persisted on our side, the
/// url is handed to the browser for redirect.
#[derive(Debug, Clone)]
pub struct CheckoutSessionLink {
    pub id: String,
    pub url: String,
}
