//! 驱动器抽象
//!
//! drive/session.rs 定义探测所消费的驱动器会话接口（物理读取、音轨信息、计时、调速）。
//! drive/timed.rs 在会话之上提供计时读取：每次读取都检查区间不变量、
//! 查询计时并转换为 [`Sample`](crate::Sample)，同时统计读取次数。

mod session;
mod timed;

pub use session::{DriveSession, ReadError};
pub use timed::TimedDrive;
