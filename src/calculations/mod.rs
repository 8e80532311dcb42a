pub mod cascade;
pub mod sequential_pass;
