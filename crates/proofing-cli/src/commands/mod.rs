pub mod outbox;
pub mod photos;
pub mod pick;
pub mod session;
