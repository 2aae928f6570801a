pub mod collaborations;
pub mod health;
pub mod matches;
pub mod projects;
pub mod ratings;
pub mod users;
