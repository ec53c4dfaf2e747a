//! Decision table compilation

pub mod generator;

pub use generator::DecisionTableGenerator;
