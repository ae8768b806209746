pub mod activity;
pub mod announcement;
pub mod assignment;
pub mod attendance;
pub mod class;
pub mod notification;
pub mod performance;
pub mod report;
pub mod schedule;
pub mod session;
pub mod user;
