pub mod exoscale;
pub mod mailer;
pub mod repositories;
