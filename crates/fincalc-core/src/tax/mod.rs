pub mod brackets;
pub mod deductions;
pub mod income_tax;
