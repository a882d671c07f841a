//! 错误类型定义
//!
//! 提供缓存探测过程中的错误类型。只有 [`ErrorKind::Media`] 是可恢复的，
//! 其余类别都会立即终止整个探测。

use core::fmt;

/// 探测错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// 介质读取错误（瞬时，可换位置重试）
    Media,
    /// 设备级致命错误
    DeviceFatal,
    /// 计时子系统故障
    TimingFault,
    /// 光盘上没有音轨
    NoAudio,
    /// 探测偏移越出音频范围
    OutOfRange,
    /// 可读空间耗尽
    OutOfSpace,
    /// 重试次数超限
    TooManyErrors,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }

    /// 是否为可重试的瞬时错误
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Media)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
