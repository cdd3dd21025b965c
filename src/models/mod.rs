pub mod alert;
pub mod change;
pub mod relief;
pub mod response;
pub mod user;
