pub mod logs;
pub mod recommend;
pub mod status;
pub mod works;
