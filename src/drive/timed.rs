//! 计时读取

use super::{DriveSession, ReadError};
use crate::consts::{MAX_LATENCY_MS, TIMING_FAULT};
use crate::error::{Error, ErrorKind, Result};
use crate::types::{DiscRange, Sample};

/// 计时驱动器包装器
///
/// 为探测提供带计时的扇区读取，包含统计信息。
///
/// 每次成功读取后立即查询计时：计时故障会作为致命错误返回，
/// 调用者通过 `?` 传播，因此故障之后不会再发出任何读取。
pub struct TimedDrive<'d, D: ?Sized> {
    /// 底层驱动器会话
    device: &'d mut D,
    /// 允许探测的音频区间
    range: DiscRange,
    /// 发出的读取次数
    read_count: u64,
    /// 失败的读取次数（介质错误或零扇区）
    failed_reads: u64,
}

impl<'d, D: DriveSession + ?Sized> TimedDrive<'d, D> {
    /// 创建计时包装器
    pub fn new(device: &'d mut D, range: DiscRange) -> Self {
        Self {
            device,
            range,
            read_count: 0,
            failed_reads: 0,
        }
    }

    /// 获取底层设备的引用
    pub fn device(&self) -> &D {
        self.device
    }

    /// 音频区间
    pub fn range(&self) -> DiscRange {
        self.range
    }

    /// 发出的读取次数
    pub fn read_count(&self) -> u64 {
        self.read_count
    }

    /// 失败的读取次数
    pub fn failed_reads(&self) -> u64 {
        self.failed_reads
    }

    /// 计时读取
    ///
    /// # 返回
    ///
    /// - `Ok(Sample)` - 读取成功，延迟已截断到 `[0, 9999]`
    /// - `Err(Media)` - 瞬时失败，调用者可换位置重试
    /// - 其他错误 - 致命，必须中止探测
    pub fn read(&mut self, lba: u32, count: u32) -> Result<Sample> {
        if !self.range.contains_span(lba, count) {
            log::error!(
                "[DRIVE] read {}+{} outside audio range {}..={}",
                lba,
                count,
                self.range.first,
                self.range.last
            );
            return Err(Error::new(
                ErrorKind::OutOfRange,
                "probe offset outside audio range",
            ));
        }

        self.read_count += 1;

        let served = match self.device.read(lba, count) {
            Ok(0) | Err(ReadError::Media) => {
                self.failed_reads += 1;
                log::trace!("[DRIVE] read {}+{} failed", lba, count);
                return Err(Error::new(ErrorKind::Media, "media error"));
            }
            Err(ReadError::DeviceFatal) => {
                log::error!("[DRIVE] unrecoverable device error at {}", lba);
                return Err(Error::new(ErrorKind::DeviceFatal, "unrecoverable device error"));
            }
            Ok(n) => n.min(count),
        };

        let elapsed = self.device.milliseconds();
        if elapsed == TIMING_FAULT {
            log::error!("[DRIVE] timing fault after read {}+{}", lba, count);
            return Err(Error::new(ErrorKind::TimingFault, "timing subsystem fault"));
        }
        let latency_ms = (elapsed.max(0) as u32).min(MAX_LATENCY_MS);

        log::trace!("[DRIVE] read {}+{} -> {}:{}ms", lba, count, served, latency_ms);
        Ok(Sample::new(latency_ms, served))
    }

    /// 设置读取倍速（尽力而为）
    pub fn set_read_speed(&mut self, multiplier: u32) -> bool {
        let ok = self.device.set_read_speed(multiplier);
        if !ok {
            log::warn!("[DRIVE] drive refused read speed {}x", multiplier);
        }
        ok
    }
}
