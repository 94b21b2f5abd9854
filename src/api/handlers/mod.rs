//! Request handlers, one module per role area

pub mod admin;
pub mod curator;
pub mod dean;
pub mod faculty;
pub mod profile;
pub mod rector;
pub mod session;
pub mod vice_dean;
