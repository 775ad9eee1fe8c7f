pub mod appointment;
pub mod change_request;
pub mod enums;
pub mod filters;
pub mod patient;
pub mod service;
pub mod staff;
pub mod user;

pub use appointment::*;
pub use change_request::*;
pub use enums::*;
pub use filters::*;
pub use patient::*;
pub use service::*;
pub use staff::*;
pub use user::*;
