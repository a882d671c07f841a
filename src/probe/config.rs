//! 探测配置

use crate::consts::*;

/// 探测配置
///
/// 所有字段都是经验性的调优参数，默认值见 [`crate::consts`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    /// 命中阈值（毫秒），重读延迟严格小于该值视为命中
    pub hit_threshold_ms: u32,
    /// 缓存大小搜索上限（扇区）
    pub search_ceiling: u32,
    /// 纠错模型能处理的最大缓存扇区数
    pub cache_model_sectors: u32,
    /// 全速快速确认轮数
    pub fast_rounds: u32,
    /// 每个长度的总轮数
    pub total_rounds: u32,
    /// 慢速确认时的读取倍速
    pub slow_speed: u32,
    /// 换位时额外跳过的扇区数
    pub relocate_bias: u32,
    /// 每个阶段允许的换位次数
    pub max_relocations: u32,
    /// 连续性验证远端偏移倍数
    pub contiguity_multiplier: u32,
    /// 连续性验证轮数
    pub contiguity_rounds: u32,
    /// 是否进行基线采样（仅用于诊断）
    pub sample_baseline: bool,
    /// 基线采样窗口（扇区）
    pub baseline_window: u32,
    /// 基线粗步进间隔（扇区）
    pub baseline_stride: u32,
    /// 基线稳定判定阈值（毫秒）
    pub baseline_plateau_ms: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            hit_threshold_ms: HIT_THRESHOLD_MS,
            search_ceiling: CACHE_SEARCH_CEILING,
            cache_model_sectors: CACHEMODEL_SECTORS,
            fast_rounds: FAST_ROUNDS,
            total_rounds: TOTAL_ROUNDS,
            slow_speed: SLOW_READ_SPEED,
            relocate_bias: RELOCATE_BIAS,
            max_relocations: MAX_RELOCATIONS,
            contiguity_multiplier: CONTIGUITY_MULTIPLIER,
            contiguity_rounds: CONTIGUITY_ROUNDS,
            sample_baseline: true,
            baseline_window: BASELINE_WINDOW,
            baseline_stride: BASELINE_STRIDE,
            baseline_plateau_ms: BASELINE_PLATEAU_MS,
        }
    }
}

impl ProbeConfig {
    /// 样本延迟是否为缓存命中
    pub fn is_hit(&self, latency_ms: u32) -> bool {
        latency_ms < self.hit_threshold_ms
    }
}
