pub mod agent_sessions;
pub mod projects;
pub mod tasks;
pub mod users;
