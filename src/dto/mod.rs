pub mod catalog;
pub mod health;
pub mod maintenance;
pub mod order;
pub mod report;
pub mod seat;
pub mod showtime;
pub mod sse;
pub mod validation;
