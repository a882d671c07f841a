//! 剔除离群值的延迟统计
//!
//! 后台的驱动器访问或转速抖动会在采样中混入少量异常慢的样本。
//! 先用全部样本求出均值和标准差，得到上界 `mean + max(1.0, 2·stddev)`，
//! 再只用不超过上界的样本按扇区数加权重新求均值。假设污染是稀疏的，
//! 一遍剔除就足够。

use crate::types::Sample;

/// 统计结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyStats {
    /// 未剔除时的每扇区平均延迟
    pub raw_mean: f64,
    /// 每扇区延迟的总体标准差（按扇区加权）
    pub stddev: f64,
    /// 剔除上界
    pub upper_bound: f64,
    /// 剔除离群值后的每扇区平均延迟
    pub mean: f64,
    /// 参与最终均值的样本数
    pub kept: usize,
}

impl LatencyStats {
    /// 计算统计量
    ///
    /// `samples` 不应包含触发寻道的首个样本。没有有效扇区时返回 `None`。
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let mut sum = 0.0;
        let mut sumsq = 0.0;
        let mut sectors = 0.0;
        for s in samples.iter().filter(|s| s.sectors > 0) {
            let x = s.latency_ms as f64;
            sum += x;
            sumsq += x * x / s.sectors as f64;
            sectors += s.sectors as f64;
        }
        if sectors == 0.0 {
            return None;
        }

        let raw_mean = sum / sectors;
        let stddev = libm::sqrt(sumsq / sectors - raw_mean * raw_mean);
        let spread = if stddev.is_nan() || stddev * 2.0 < 1.0 {
            1.0
        } else {
            stddev * 2.0
        };
        let upper_bound = raw_mean + spread;

        let mut kept_latency = 0.0;
        let mut kept_sectors = 0.0;
        let mut kept = 0;
        for s in samples
            .iter()
            .filter(|s| s.sectors > 0 && s.per_sector() <= upper_bound)
        {
            kept_latency += s.latency_ms as f64;
            kept_sectors += s.sectors as f64;
            kept += 1;
        }

        let mean = if kept_sectors > 0.0 {
            kept_latency / kept_sectors
        } else {
            raw_mean
        };

        Some(Self {
            raw_mean,
            stddev: if stddev.is_nan() { 0.0 } else { stddev },
            upper_bound,
            mean,
            kept,
        })
    }
}
