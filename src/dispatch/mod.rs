pub mod dispatcher;
pub mod job;
pub mod rows;
