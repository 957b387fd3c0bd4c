pub mod generations;
pub mod newsletter_signups;
pub mod orders;
pub mod pending_checkouts;
pub mod profiles;
pub mod support_tickets;
pub mod transactions;
