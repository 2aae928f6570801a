pub mod collaboration;
pub mod decision;
pub mod project;
pub mod rating;
