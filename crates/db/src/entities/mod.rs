//! Database entities.

#![allow(missing_docs)]

pub mod abuse_report;
pub mod account;
pub mod account_status_history;

pub use abuse_report::Entity as AbuseReport;
pub use account::Entity as Account;
pub use account_status_history::Entity as AccountStatusHistory;
