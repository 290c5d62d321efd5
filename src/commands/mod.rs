pub mod classify;
pub mod extract;
pub mod inventory;
pub mod status;
