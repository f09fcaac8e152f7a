pub mod job;
pub mod log;

#[rustfmt::skip]
pub use self::{
    job::{JobDescriptor, JobStatus},
    log::{LogSnapshot, TailOptions},
};
