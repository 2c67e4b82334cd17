pub mod address;
pub mod paths;
pub mod validation;
