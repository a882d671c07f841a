//! 模拟驱动器
//!
//! 一个确定性的 [`DriveSession`] 实现，用于在没有真实光驱时演练探测流程。
//!
//! # 缓存模型
//!
//! 缓存由若干个分段组成，每段是 `cache_sectors` 个连续扇区的窗口，
//! 使用 `lru::LruCache` 管理分段表：
//!
//! - 读取的扇区完全落在某一段内：命中，耗时 `hit_ms`，不改变分段顺序（先进先出）
//! - 否则从介质读取：耗时为传输时间，若不是紧接上次读取的位置还要加上寻道时间；
//!   随后以本次读取为起点预读出一个新分段，满时淘汰最早的分段
//!
//! 只有一段时就是单一连续窗口；多段则模拟按区域分别管理的缓存。
//!
//! # 故障注入
//!
//! 按读取序号（从 0 开始）注入：介质错误、设备致命错误、计时故障。

use crate::consts::{CD_FRAMES_PER_SECOND, TIMING_FAULT};
use crate::drive::{DriveSession, ReadError};
use alloc::vec;
use alloc::vec::Vec;
use core::num::NonZeroUsize;
use core::ops::Range;
use lru::LruCache;

/// 默认寻道耗时（毫秒）
pub const DEFAULT_SEEK_MS: u32 = 20;

/// 默认命中耗时（毫秒）
pub const DEFAULT_HIT_MS: u32 = 1;

/// 默认全速倍速
pub const DEFAULT_FULL_SPEED: u32 = 32;

/// 默认单次最大传输扇区数
pub const DEFAULT_MAX_TRANSFER: u32 = 26;

/// 模拟音轨
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimTrack {
    /// 首扇区
    pub first: u32,
    /// 末扇区（包含）
    pub last: u32,
    /// 是否音频轨
    pub audio: bool,
}

/// 模拟驱动器
pub struct SimulatedDrive {
    tracks: Vec<SimTrack>,
    /// 每段缓存的扇区数，0 表示无缓存
    cache_sectors: u32,
    /// 分段表：起始扇区 -> 长度
    segments: LruCache<u32, u32>,
    seek_ms: u32,
    hit_ms: u32,
    full_speed: u32,
    speed: u32,
    max_transfer: u32,
    /// 上次读取结束的位置，用于判断是否需要寻道
    last_end: Option<u32>,
    last_ms: i32,
    reads: u64,
    speed_changes: u32,
    refuse_speed: bool,
    failing: Vec<Range<u64>>,
    device_fatal_at: Option<u64>,
    timing_fault_at: Option<u64>,
}

impl SimulatedDrive {
    /// 由音轨表创建（无缓存）
    pub fn new(tracks: Vec<SimTrack>) -> Self {
        Self {
            tracks,
            cache_sectors: 0,
            segments: LruCache::new(NonZeroUsize::MIN),
            seek_ms: DEFAULT_SEEK_MS,
            hit_ms: DEFAULT_HIT_MS,
            full_speed: DEFAULT_FULL_SPEED,
            speed: DEFAULT_FULL_SPEED,
            max_transfer: DEFAULT_MAX_TRANSFER,
            last_end: None,
            last_ms: 0,
            reads: 0,
            speed_changes: 0,
            refuse_speed: false,
            failing: Vec::new(),
            device_fatal_at: None,
            timing_fault_at: None,
        }
    }

    /// 单一音轨的光盘
    pub fn single_track(first: u32, last: u32) -> Self {
        Self::new(vec![SimTrack { first, last, audio: true }])
    }

    /// 设置每段缓存的扇区数
    pub fn with_cache(mut self, sectors: u32) -> Self {
        self.cache_sectors = sectors;
        self.segments.clear();
        self
    }

    /// 设置缓存分段数（至少 1）
    pub fn with_segments(mut self, segments: usize) -> Self {
        let cap = NonZeroUsize::new(segments).unwrap_or(NonZeroUsize::MIN);
        self.segments = LruCache::new(cap);
        self
    }

    /// 设置寻道和命中耗时
    pub fn with_latency(mut self, seek_ms: u32, hit_ms: u32) -> Self {
        self.seek_ms = seek_ms;
        self.hit_ms = hit_ms;
        self
    }

    /// 设置全速倍速
    pub fn with_full_speed(mut self, speed: u32) -> Self {
        self.full_speed = speed.max(1);
        self.speed = self.full_speed;
        self
    }

    /// 设置单次最大传输扇区数
    pub fn with_max_transfer(mut self, sectors: u32) -> Self {
        self.max_transfer = sectors.max(1);
        self
    }

    /// 第 `from` 次起的 `count` 次读取返回介质错误（可多次调用叠加）
    pub fn fail_reads(mut self, from: u64, count: u64) -> Self {
        self.failing.push(from..from + count);
        self
    }

    /// 第 `op` 次读取返回设备致命错误
    pub fn device_fatal_at(mut self, op: u64) -> Self {
        self.device_fatal_at = Some(op);
        self
    }

    /// 第 `op` 次读取起计时返回故障
    pub fn timing_fault_at(mut self, op: u64) -> Self {
        self.timing_fault_at = Some(op);
        self
    }

    /// 拒绝所有调速请求
    pub fn refuse_speed_changes(mut self) -> Self {
        self.refuse_speed = true;
        self
    }

    /// 已发出的读取次数
    pub fn reads_issued(&self) -> u64 {
        self.reads
    }

    /// 接受的调速次数
    pub fn speed_changes(&self) -> u32 {
        self.speed_changes
    }

    /// 当前倍速
    pub fn speed(&self) -> u32 {
        self.speed
    }

    fn disc_last(&self) -> Option<u32> {
        self.tracks.iter().map(|t| t.last).max()
    }

    fn cached(&self, lba: u32, count: u32) -> bool {
        self.segments
            .iter()
            .any(|(&start, &len)| lba >= start && lba + count <= start + len)
    }

    /// 从介质读取后预读出新分段
    fn fill(&mut self, lba: u32, count: u32) {
        if self.cache_sectors == 0 {
            return;
        }
        let start = if count > self.cache_sectors {
            lba + count - self.cache_sectors
        } else {
            lba
        };
        self.segments.push(start, self.cache_sectors);
    }

    fn transfer_ms(&self, count: u32) -> u32 {
        count * 1000 / (CD_FRAMES_PER_SECOND * self.speed)
    }
}

impl DriveSession for SimulatedDrive {
    fn track_count(&self) -> u8 {
        self.tracks.len() as u8
    }

    fn is_audio_track(&self, track: u8) -> bool {
        self.tracks
            .get(usize::from(track).wrapping_sub(1))
            .map_or(false, |t| t.audio)
    }

    fn track_first_sector(&self, track: u8) -> u32 {
        self.tracks
            .get(usize::from(track).wrapping_sub(1))
            .map_or(0, |t| t.first)
    }

    fn track_last_sector(&self, track: u8) -> u32 {
        self.tracks
            .get(usize::from(track).wrapping_sub(1))
            .map_or(0, |t| t.last)
    }

    fn read(&mut self, lba: u32, count: u32) -> Result<u32, ReadError> {
        let op = self.reads;
        self.reads += 1;

        if self.device_fatal_at == Some(op) {
            return Err(ReadError::DeviceFatal);
        }
        if self.failing.iter().any(|r| r.contains(&op)) {
            return Err(ReadError::Media);
        }
        let last = match self.disc_last() {
            Some(last) if lba <= last && count > 0 => last,
            _ => return Err(ReadError::Media),
        };

        let served = count.min(self.max_transfer).min(last - lba + 1);
        let latency = if self.cached(lba, served) {
            self.hit_ms
        } else {
            let seek = if self.last_end == Some(lba) { 0 } else { self.seek_ms };
            self.fill(lba, served);
            seek + self.transfer_ms(served)
        };
        self.last_end = Some(lba + served);

        self.last_ms = if self.timing_fault_at.map_or(false, |at| op >= at) {
            TIMING_FAULT
        } else {
            latency as i32
        };
        Ok(served)
    }

    fn milliseconds(&self) -> i32 {
        self.last_ms
    }

    fn set_read_speed(&mut self, multiplier: u32) -> bool {
        if self.refuse_speed {
            return false;
        }
        self.speed = multiplier.clamp(1, self.full_speed);
        self.speed_changes += 1;
        true
    }
}
