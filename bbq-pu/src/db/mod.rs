//! Database access layer for bbq-pu

pub mod players;
