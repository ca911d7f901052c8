pub mod agent_session;
pub mod project;
pub mod task;
pub mod user;
