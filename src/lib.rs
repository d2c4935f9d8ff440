pub mod config;
pub mod email;
pub mod forms;
pub mod i18n;
pub mod loan;
pub mod server;
