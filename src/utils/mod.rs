pub mod auth;
pub mod busy;
pub mod validation;
