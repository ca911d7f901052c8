pub mod planner;
pub mod projects;
pub mod task_parser;
pub mod tasks;
pub mod users;
