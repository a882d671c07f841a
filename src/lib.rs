//! cdda_cachetest: 光驱预读缓存探测
//!
//! 没有标准命令能可靠地报告光驱是否缓存音频扇区、缓存多大、是否为单一连续窗口。
//! 本库通过计时的读取/寻道序列，把响应延迟统计地分为"缓存命中"（快）和
//! "机械寻道"（慢），据此推断缓存行为：
//! - **基线采样**：寻道/读取耗时的诊断输出，并判断驱动器是否已经预热
//! - **离群值剔除统计**：排除偶发的后台争用造成的慢样本
//! - **缓存大小搜索**：找出重读起点仍然命中的最大读取长度
//! - **连续性验证**：确认缓存是单一连续窗口
//! - **结论分类**：无缓存 / 确定大小 / 超出模型 / 不连续 / 不确定 / 致命错误
//!
//! # 示例
//!
//! ```rust,ignore
//! use cdda_cachetest::{CacheProbe, DriveSession, ReadError};
//!
//! // 实现 DriveSession trait
//! struct MyDrive {
//!     // ...
//! }
//!
//! impl DriveSession for MyDrive {
//!     // 实现必要的方法
//!     // ...
//! }
//!
//! fn main() {
//!     let mut drive = MyDrive::open("/dev/sr0");
//!     let mut progress = String::new();
//!
//!     let report = CacheProbe::new(&mut drive)
//!         .with_progress(&mut progress)
//!         .run();
//!
//!     print!("{}", progress);
//!     std::process::exit(report.return_code());
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`drive`] - 驱动器会话接口和计时读取
//! - [`consts`] - 调优常量
//! - [`types`] - 数据结构定义
//! - [`stats`] - 离群值剔除统计
//! - [`probe`] - 探测流程
//! - [`report`] - 诊断输出
//! - [`sim`] - 模拟驱动器

#![no_std]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 驱动器抽象
pub mod drive;

/// 常量定义
pub mod consts;

/// 数据结构定义
pub mod types;

/// 延迟统计
pub mod stats;

/// 缓存探测
pub mod probe;

/// 诊断输出
pub mod report;

/// 模拟驱动器
pub mod sim;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 驱动器
pub use drive::{DriveSession, ReadError, TimedDrive};

// 数据结构
pub use types::{
    BaselineEstimate, CacheSizeEstimate, DiscRange, Msf, Sample, Verdict, Warnings,
};

// 统计
pub use stats::LatencyStats;

// 探测
pub use probe::{analyze_verify, CacheProbe, ProbeConfig, ProbeReport};

// 诊断输出
pub use report::Reporter;

// 模拟驱动器
pub use sim::{SimTrack, SimulatedDrive};
