/// Persistence abstraction and its backends.
pub mod booking_store;
/// Date and time formats shared by entities and requests.
pub mod calendar;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
