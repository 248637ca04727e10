pub mod db;
pub mod timing;
pub mod util;
