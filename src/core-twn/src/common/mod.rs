pub mod db_env;
pub mod delay;
pub mod health;
pub mod hostname;
pub mod logging;
pub mod poll_interval;
