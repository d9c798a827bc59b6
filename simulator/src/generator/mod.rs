pub mod capture;
pub mod hands;
