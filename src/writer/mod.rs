pub mod dat;
pub mod schema_gen;
pub mod sqlite;

pub use dat::*;
pub use sqlite::*;
