pub mod controller;
pub mod events;

pub use controller::CallController;
pub use events::{BudgetSnapshot, CallEvent};
