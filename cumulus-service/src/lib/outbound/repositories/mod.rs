pub mod account;
pub mod event;
pub mod reset;

pub use account::PostgresAccountRepository;
pub use event::PostgresEventRecorder;
pub use reset::PostgresResetRepository;
