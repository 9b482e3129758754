pub mod capital;
pub mod goals;
