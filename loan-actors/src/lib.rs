//! The two actor families between the Load Gateway and a site's Storage
//! Engines: the synchronous, immediate-failover Loan Actor, and the
//! asynchronous, indefinitely-retrying Event Actors for returns and
//! renewals (spec §4.3, §4.4).

pub mod event_actor;
pub mod loan_actor;

pub use event_actor::EventActor;
pub use loan_actor::LoanActor;
