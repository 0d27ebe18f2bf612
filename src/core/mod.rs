pub mod avatar;
pub mod error;
pub mod mood;
pub mod prompt;
pub mod proxy;
pub mod services;
pub mod traits;
