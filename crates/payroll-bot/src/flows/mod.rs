//! Flow handlers registered with the [`CallbackRouter`](crate::CallbackRouter).

pub mod salary;
