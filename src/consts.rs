//! 缓存探测常量定义
//!
//! 这些值都是经验性的调优常量，[`crate::ProbeConfig`] 以它们作为默认值。

//=============================================================================
// CD 几何
//=============================================================================

/// 每秒帧数（扇区数）
pub const CD_FRAMES_PER_SECOND: u32 = 75;

/// 每分钟扇区数
pub const CD_FRAMES_PER_MINUTE: u32 = 60 * CD_FRAMES_PER_SECOND;

//=============================================================================
// 计时
//=============================================================================

/// 命中阈值（毫秒）：低于此值视为缓存命中
///
/// 任何机械寻道都不可能快于这个物理下限。
pub const HIT_THRESHOLD_MS: u32 = 9;

/// 单次延迟上限（毫秒），超过的值被截断
pub const MAX_LATENCY_MS: u32 = 9999;

/// `DriveSession::milliseconds` 的计时故障哨兵值
pub const TIMING_FAULT: i32 = -1;

//=============================================================================
// 缓存模型
//=============================================================================

/// 下游纠错模型能够处理的最大缓存扇区数
pub const CACHEMODEL_SECTORS: u32 = 1200;

/// 缓存大小搜索的硬上限
pub const CACHE_SEARCH_CEILING: u32 = 15000;

//=============================================================================
// 搜索与验证
//=============================================================================

/// 每个长度的快速确认轮数
pub const FAST_ROUNDS: u32 = 5;

/// 每个长度的总轮数（快速 + 慢速）
pub const TOTAL_ROUNDS: u32 = 15;

/// 慢速确认时请求的读取倍速
pub const SLOW_READ_SPEED: u32 = 1;

/// 出错换位时在当前长度之外额外跳过的扇区数
pub const RELOCATE_BIAS: u32 = 100;

/// 每个阶段允许的换位次数
pub const MAX_RELOCATIONS: u32 = 10;

/// 连续性验证的远端偏移倍数
pub const CONTIGUITY_MULTIPLIER: u32 = 3;

/// 连续性验证轮数
pub const CONTIGUITY_ROUNDS: u32 = 30;

//=============================================================================
// 基线采样
//=============================================================================

/// 基线采样窗口（扇区）
pub const BASELINE_WINDOW: u32 = 1000;

/// 粗步进间隔（十分钟的扇区数）
pub const BASELINE_STRIDE: u32 = 10 * CD_FRAMES_PER_MINUTE;

/// 稳定判定阈值（毫秒）：无改善的累计读取时间超过该值后切换粗步进
pub const BASELINE_PLATEAU_MS: u32 = 2000;
