pub mod error;
pub mod forms;
pub mod hashing;
pub mod helpers;
pub mod model;
pub mod pagination;
pub mod uploads;
pub mod validation;
