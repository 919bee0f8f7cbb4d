pub mod backends;
pub mod connector;
pub mod errors;
pub mod fetch;
pub mod fs;
pub mod host;
pub mod session;
pub mod settings;
pub mod tree;
