mod session;
pub mod timer;
mod worker;

#[rustfmt::skip]
pub use self::{
    session::{SessionCell, UpdateLock},
    worker::{Worker, WorkerState},
};
