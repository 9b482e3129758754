pub mod growth;
pub mod mortgage;
pub mod operations;
pub mod salary;
pub mod scenarios;
pub mod tax;
