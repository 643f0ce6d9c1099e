pub mod job;

pub use job::{Job, JobStatus, NewJob};
