//! Request handling for `/debug`: validation, the stage machine, and the
//! response shapes it produces.

pub mod events;
pub mod response;
pub mod run;
pub mod sink;
pub mod validate;

pub use run::run_debug;
pub use validate::validate_request;
