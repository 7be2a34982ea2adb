pub mod accounts;
pub mod refresh;
