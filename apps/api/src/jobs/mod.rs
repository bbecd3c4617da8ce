// Job lifecycle: creation through the factory, edit and delete through the store.

pub mod factory;
pub mod handlers;
