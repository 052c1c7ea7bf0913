pub mod events;
pub mod status;
pub mod subject;
