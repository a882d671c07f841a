//! 诊断输出
//!
//! 探测产生两路相互独立的人类可读输出：
//!
//! - **progress** - 简短的进度视图（会用 `\r` 覆盖同一行）
//! - **log** - 详细的逐次读取记录
//!
//! 两路都是可选的 [`core::fmt::Write`]，缺省时静默丢弃。写入失败同样被忽略：
//! 诊断输出不影响探测结论。结构化日志另走 `log` facade。

use core::fmt::{Arguments, Write};

/// 双路诊断输出
#[derive(Default)]
pub struct Reporter<'w> {
    progress: Option<&'w mut dyn Write>,
    log: Option<&'w mut dyn Write>,
}

impl<'w> Reporter<'w> {
    /// 无输出
    pub fn silent() -> Self {
        Self::default()
    }

    /// 指定两路输出
    pub fn new(progress: Option<&'w mut dyn Write>, log: Option<&'w mut dyn Write>) -> Self {
        Self { progress, log }
    }

    /// 设置进度输出
    pub fn set_progress(&mut self, sink: &'w mut dyn Write) {
        self.progress = Some(sink);
    }

    /// 设置详细日志输出
    pub fn set_log(&mut self, sink: &'w mut dyn Write) {
        self.log = Some(sink);
    }

    /// 同时写入两路
    pub fn report(&mut self, args: Arguments<'_>) {
        self.print(args);
        self.log(args);
    }

    /// 只写入进度
    pub fn print(&mut self, args: Arguments<'_>) {
        if let Some(sink) = self.progress.as_mut() {
            let _ = sink.write_fmt(args);
        }
    }

    /// 只写入详细日志
    pub fn log(&mut self, args: Arguments<'_>) {
        if let Some(sink) = self.log.as_mut() {
            let _ = sink.write_fmt(args);
        }
    }
}

/// 写入两路输出
macro_rules! report {
    ($out:expr, $($arg:tt)*) => {
        $out.report(format_args!($($arg)*))
    };
}

/// 只写入进度输出
macro_rules! progress {
    ($out:expr, $($arg:tt)*) => {
        $out.print(format_args!($($arg)*))
    };
}

/// 只写入详细日志输出
macro_rules! verbose {
    ($out:expr, $($arg:tt)*) => {
        $out.log(format_args!($($arg)*))
    };
}

pub(crate) use {progress, report, verbose};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;

    #[test]
    fn test_silent_is_noop() {
        let mut out = Reporter::silent();
        report!(out, "nothing {}", 1);
        progress!(out, "nothing");
        verbose!(out, "nothing");
    }

    #[test]
    fn test_sinks_are_independent() {
        let mut terse = String::new();
        let mut detail = String::new();
        {
            let mut out = Reporter::new(Some(&mut terse), Some(&mut detail));
            report!(out, "both ");
            progress!(out, "terse ");
            verbose!(out, "detail {}", 42);
        }
        assert_eq!(terse, "both terse ");
        assert_eq!(detail, "both detail 42");
    }

    #[test]
    fn test_single_sink() {
        let mut detail = String::new();
        {
            let mut out = Reporter::silent();
            out.set_log(&mut detail);
            report!(out, "a");
            progress!(out, "b");
        }
        assert_eq!(detail, "a");
    }
}
