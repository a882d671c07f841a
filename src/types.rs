//! 探测数据结构定义

use crate::consts::{CD_FRAMES_PER_MINUTE, CD_FRAMES_PER_SECOND};
use crate::drive::DriveSession;
use crate::error::{Error, ErrorKind};
use bitflags::bitflags;
use core::fmt;

/// 光盘上最长的连续音频扇区区间
///
/// 在探测开始时由音轨信息计算一次，此后只读。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscRange {
    /// 首扇区
    pub first: u32,
    /// 末扇区（包含）
    pub last: u32,
}

impl DiscRange {
    /// 创建区间
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// 从驱动器音轨表中找出最长的连续音频区间
    ///
    /// 相邻的音轨合并为一段，遇到数据轨则断开。没有音轨时返回 `None`。
    pub fn longest_audio_run<D: DriveSession + ?Sized>(drive: &D) -> Option<Self> {
        let mut best: Option<Self> = None;
        let mut run: Option<Self> = None;

        for track in 1..=drive.track_count() {
            if !drive.is_audio_track(track) {
                run = None;
                continue;
            }
            let first = run.map_or(drive.track_first_sector(track), |r| r.first);
            let current = Self::new(first, drive.track_last_sector(track));
            run = Some(current);

            if best.map_or(true, |b| current.sector_count() > b.sector_count()) {
                best = Some(current);
            }
        }

        best
    }

    /// 区间内扇区数
    pub const fn sector_count(&self) -> u32 {
        self.last - self.first + 1
    }

    /// `[lba, lba + count)` 是否完全位于区间内
    pub fn contains_span(&self, lba: u32, count: u32) -> bool {
        count > 0
            && lba >= self.first
            && lba
                .checked_add(count - 1)
                .map_or(false, |end| end <= self.last)
    }
}

/// 一次计时读取的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// 延迟（毫秒），截断到 `[0, 9999]`
    pub latency_ms: u32,
    /// 实际返回的扇区数（短读时可能小于请求值）
    pub sectors: u32,
}

impl Sample {
    /// 创建样本
    pub const fn new(latency_ms: u32, sectors: u32) -> Self {
        Self { latency_ms, sectors }
    }

    /// 每扇区延迟
    pub fn per_sector(&self) -> f64 {
        self.latency_ms as f64 / self.sectors as f64
    }
}

/// 某个偏移处的基线计时估计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaselineEstimate {
    /// 采样偏移
    pub offset: u32,
    /// 首次寻道延迟（毫秒）
    pub initial_seek_ms: u32,
    /// 剔除离群值后的每扇区平均延迟
    pub mean_ms_per_sector: f64,
    /// 每扇区延迟的标准差
    pub stddev_ms_per_sector: f64,
}

impl BaselineEstimate {
    /// 折算出的原始读取倍速
    pub fn raw_speed(&self) -> f64 {
        1000.0 / CD_FRAMES_PER_SECOND as f64 / self.mean_ms_per_sector
    }
}

/// 缓存大小估计
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSizeEstimate {
    /// 扇区数，0 表示未检测到缓存
    pub sectors: u32,
}

impl CacheSizeEstimate {
    /// 是否超出纠错模型上限（默认为 [`crate::consts::CACHEMODEL_SECTORS`]）
    pub const fn exceeds_model(&self, model_sectors: u32) -> bool {
        self.sectors > model_sectors
    }
}

bitflags! {
    /// 探测结论附带的警告
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Warnings: u8 {
        /// 缓存大于纠错模型的支持范围
        const EXCEEDS_MODEL  = 0x01;
        /// 缓存不是单一连续窗口
        const NON_CONTIGUOUS = 0x02;
    }
}

/// 探测结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// 驱动器不缓存非线性访问
    NoCache,
    /// 确定的缓存大小
    Determinate(u32),
    /// 确定的缓存大小，但超出纠错模型上限
    DeterminateExceedsModel(u32),
    /// 缓存不连续
    NonContiguous(u32),
    /// 恰好在搜索上限处才未命中，无法确定
    Indeterminate,
    /// 探测中止
    FatalError(Error),
}

impl Verdict {
    /// 顶层返回码
    ///
    /// - `-1` 致命错误/中止
    /// - `0` 无缓存，或缓存大小确定且无警告
    /// - `1` 不确定或带警告
    pub fn return_code(&self) -> i32 {
        match self {
            Verdict::FatalError(_) => -1,
            Verdict::NoCache | Verdict::Determinate(_) => 0,
            Verdict::DeterminateExceedsModel(_)
            | Verdict::NonContiguous(_)
            | Verdict::Indeterminate => 1,
        }
    }

    /// 检测到的缓存大小（带外结果）
    pub fn cache_size(&self) -> Option<u32> {
        match self {
            Verdict::NoCache => Some(0),
            Verdict::Determinate(s)
            | Verdict::DeterminateExceedsModel(s)
            | Verdict::NonContiguous(s) => Some(*s),
            Verdict::Indeterminate | Verdict::FatalError(_) => None,
        }
    }

    /// 致命错误的类别
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Verdict::FatalError(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// 分:秒.帧 形式的扇区地址
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msf {
    /// 分
    pub minutes: u32,
    /// 秒
    pub seconds: u32,
    /// 帧
    pub frames: u32,
}

impl Msf {
    /// 由扇区号换算
    pub const fn from_lba(lba: u32) -> Self {
        let minutes = lba / CD_FRAMES_PER_MINUTE;
        let rest = lba % CD_FRAMES_PER_MINUTE;
        Self {
            minutes,
            seconds: rest / CD_FRAMES_PER_SECOND,
            frames: rest % CD_FRAMES_PER_SECOND,
        }
    }
}

impl fmt::Display for Msf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:02}:{:02}.{:02}]", self.minutes, self.seconds, self.frames)
    }
}
