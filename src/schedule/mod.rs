pub mod calculator;
pub mod generator;

pub use calculator::{calculate_emi, total_interest, total_payable};
pub use generator::generate;
