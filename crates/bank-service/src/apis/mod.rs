//! API handlers for the bank account service.

pub mod session;
