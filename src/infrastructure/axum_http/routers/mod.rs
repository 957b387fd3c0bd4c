pub mod admin_orders;
pub mod checkout;
pub mod generations;
pub mod intake;
pub mod kie_webhook;
pub mod orders;
pub mod stripe_webhook;
pub mod support;
pub mod view;
