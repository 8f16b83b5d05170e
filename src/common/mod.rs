pub mod command_utils;

pub use command_utils::{execute_command, split_command};
