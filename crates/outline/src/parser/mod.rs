pub mod backend;
pub mod layout;
