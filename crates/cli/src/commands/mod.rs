pub mod check;
pub mod discover;
pub mod inspect;
pub mod store;
