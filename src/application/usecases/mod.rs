pub mod admin_orders;
pub mod checkout;
pub mod generation_webhook;
pub mod generations;
pub mod intake;
pub mod interview;
pub mod order_claim;
pub mod order_view;
pub mod stripe_webhook;
pub mod support;
