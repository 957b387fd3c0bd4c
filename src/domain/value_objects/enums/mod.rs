pub mod generation_statuses;
pub mod generation_types;
pub mod order_statuses;
pub mod order_tiers;
pub mod ticket_subjects;
pub mod transaction_statuses;
