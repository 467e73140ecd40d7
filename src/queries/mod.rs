pub mod chunks;
pub mod ddl;
pub mod metadata;
pub mod recordings;
pub mod users;
