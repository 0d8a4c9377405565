pub mod interfaces;
pub mod platforms;
pub mod resolve;
