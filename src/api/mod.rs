pub mod announcement;
pub mod attendance;
pub mod company;
pub mod department;
pub mod employee;
pub mod file;
pub mod message;
pub mod report;
