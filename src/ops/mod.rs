pub mod delete;
pub mod editor;
pub mod flatten;
pub mod parents;
pub mod search;
pub mod session;
pub mod validate;
