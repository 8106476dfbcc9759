pub mod classify;
pub mod config;
pub mod corpus;
pub mod driver;
pub mod outcome;
pub mod supervise;
pub mod witness;
