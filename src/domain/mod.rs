mod appointment;
mod calendar;
mod expense;
mod money;
mod range;

pub use appointment::*;
pub use calendar::*;
pub use expense::*;
pub use money::*;
pub use range::*;
