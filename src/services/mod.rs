pub mod sink;
pub mod submitter;
