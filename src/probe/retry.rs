//! 读错误换位与致命错误输出
//!
//! 搜索和连续性验证两个阶段共用。

use crate::error::{Error, ErrorKind, Result};
use crate::report::{report, Reporter};

/// 连续换位计数
///
/// 每完成一轮（无论命中与否）清零；没有成功轮次间隔的连续失败超过上限即为致命错误。
pub(super) struct Relocations {
    used: u32,
    limit: u32,
}

impl Relocations {
    pub(super) fn new(limit: u32) -> Self {
        Self { used: 0, limit }
    }

    /// 记录一次换位；超过上限时返回致命错误
    pub(super) fn record(&mut self, out: &mut Reporter<'_>) -> Result<()> {
        self.used += 1;
        if self.used > self.limit {
            report!(
                out,
                "\n\tToo many read errors while performing drive cache checks;\n\t  aborting test.\n\n"
            );
            log::error!("[PROBE] {} read errors in a row, giving up", self.used);
            return Err(Error::new(ErrorKind::TooManyErrors, "too many read errors"));
        }
        report!(
            out,
            "\n\tRead error while performing drive cache checks;\n\t  choosing new offset and trying again.\n"
        );
        Ok(())
    }

    /// 一轮读取成功完成
    pub(super) fn reset(&mut self) {
        self.used = 0;
    }
}

/// 输出致命错误说明
pub(super) fn report_fatal(out: &mut Reporter<'_>, err: &Error) {
    match err.kind() {
        ErrorKind::TimingFault => report!(
            out,
            "\n\tTiming error while performing drive cache checks; aborting test.\n"
        ),
        ErrorKind::DeviceFatal => report!(
            out,
            "\n\tUnrecoverable drive error while performing drive cache checks; aborting test.\n"
        ),
        _ => report!(out, "\n\t{}; aborting test.\n", err.message()),
    }
}
