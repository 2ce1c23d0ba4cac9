pub mod task;
pub mod user;

pub use task::{Task, TaskInput, TaskPatch, TaskQuery, TaskRef, TaskUpdate};
pub use user::{NewUser, User};
