pub mod announcement;
pub mod attendance;
pub mod badge;
pub mod company;
pub mod coordinate;
pub mod department;
pub mod employee;
pub mod file_entry;
pub mod message;
pub mod report;
