pub mod core;
pub mod indices;
pub mod lookup;
pub mod table;
