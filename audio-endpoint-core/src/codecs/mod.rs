pub mod g711;
pub mod standard;
