//! 基线采样
//!
//! 从光盘末端向前，在稀疏的偏移处测量寻道和读取耗时，供人工确认驱动器已经预热。
//! 结果只用于诊断。起初逐扇区后退；一旦窗口读取耗时不再变化（稳定），
//! 改为按十分钟对齐的粗步进，跳过没有意义的预热区域。

use super::config::ProbeConfig;
use super::retry::report_fatal;
use crate::drive::{DriveSession, TimedDrive};
use crate::error::Result;
use crate::report::{progress, report, verbose, Reporter};
use crate::stats::LatencyStats;
use crate::types::{BaselineEstimate, Msf, Sample};
use alloc::vec::Vec;

/// 稳定判定
///
/// 记录见过的最长窗口耗时；之后没有更长耗时出现时累计读取时间，
/// 累计超过阈值（且超过单个窗口耗时）即认为稳定。
#[derive(Debug, Clone, Copy)]
struct Plateau {
    worst_ms: f64,
    accumulated_ms: f64,
    threshold_ms: f64,
    settled: bool,
}

impl Plateau {
    fn new(threshold_ms: u32) -> Self {
        Self {
            worst_ms: 0.0,
            accumulated_ms: 0.0,
            threshold_ms: threshold_ms as f64,
            settled: false,
        }
    }

    fn observe(&mut self, window_ms: f64) {
        if self.settled {
            return;
        }
        if window_ms > self.worst_ms {
            self.worst_ms = window_ms;
            self.accumulated_ms = 0.0;
        } else {
            self.accumulated_ms += window_ms;
            if self.accumulated_ms > window_ms && self.accumulated_ms > self.threshold_ms {
                self.settled = true;
            }
        }
    }
}

/// 采样基线
///
/// 介质错误只跳过当前偏移；设备错误和计时故障直接返回。
pub fn sample_baseline<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    config: &ProbeConfig,
    out: &mut Reporter<'_>,
) -> Result<Vec<BaselineEstimate>> {
    let range = drive.range();
    let window = config.baseline_window.max(2);
    let mut estimates = Vec::new();

    report!(out, "\nSeek/read timing:\n");

    // 窗口之后还要放一个触发扇区
    if range.sector_count() < window + 2 {
        report!(out, "\tAudio range too short for timing samples; skipping.\n");
        log::info!("[BASELINE] range of {} sectors too short, skipped", range.sector_count());
        return Ok(estimates);
    }

    let stride = config.baseline_stride.max(1);
    let mut offset = range.last - window - 1;
    let mut plateau = Plateau::new(config.baseline_plateau_ms);
    let mut samples: Vec<Sample> = Vec::new();

    loop {
        if plateau.settled {
            report!(out, "\n");
        } else {
            progress!(out, "\r");
            verbose!(out, "\n");
        }
        report!(out, "\t{}: ", Msf::from_lba(offset));

        match sample_offset(drive, out, offset, window, &mut samples) {
            Ok(Some(estimate)) => {
                progress!(
                    out,
                    "{:4}ms seek, {:.2}ms/sec read [{:.1}x]",
                    estimate.initial_seek_ms,
                    estimate.mean_ms_per_sector,
                    estimate.raw_speed()
                );
                verbose!(
                    out,
                    "\n\tInitial seek latency ({} sectors): {}ms",
                    window,
                    estimate.initial_seek_ms
                );
                verbose!(
                    out,
                    "\n\tAverage read latency: {:.2}ms/sector (raw speed: {:.1}x)",
                    estimate.mean_ms_per_sector,
                    estimate.raw_speed()
                );
                verbose!(
                    out,
                    "\n\tRead latency standard deviation: {:.2}ms/sector",
                    estimate.stddev_ms_per_sector
                );
                log::debug!(
                    "[BASELINE] offset={} seek={}ms mean={:.3}ms/sector",
                    offset,
                    estimate.initial_seek_ms,
                    estimate.mean_ms_per_sector
                );

                plateau.observe(estimate.mean_ms_per_sector * window as f64);
                estimates.push(estimate);
            }
            Ok(None) => {}
            Err(e) if e.is_transient() => {
                log::warn!("[BASELINE] media error at offset {}, skipping", offset);
            }
            Err(e) => {
                report_fatal(out, &e);
                return Err(e);
            }
        }

        if plateau.settled {
            let aligned = (offset - range.first).div_ceil(stride) * stride;
            if aligned < stride {
                break;
            }
            offset = range.first + aligned - stride;
            progress!(out, "               ");
        } else {
            if offset == range.first {
                break;
            }
            offset -= 1;
            progress!(out, " spinning up...");
        }
    }

    log::info!("[BASELINE] {} offsets sampled", estimates.len());
    Ok(estimates)
}

/// 在一个偏移处采样
///
/// 先读窗口之后的一个扇区强制寻道，再从 `offset` 读完整个窗口：
/// 第一次只读一个扇区，使其耗时以寻道为主。
fn sample_offset<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    out: &mut Reporter<'_>,
    offset: u32,
    window: u32,
    samples: &mut Vec<Sample>,
) -> Result<Option<BaselineEstimate>> {
    if let Err(e) = drive.read(offset + window + 1, 1) {
        if e.is_transient() {
            report!(out, "\n\tWARNING: media error during setup; continuing at next offset...");
        }
        return Err(e);
    }

    verbose!(out, "\n");

    let seek = read_logged(drive, out, offset, 1)?;
    let mut sofar = seek.sectors;
    samples.clear();
    while sofar < window {
        let sample = read_logged(drive, out, offset + sofar, window - sofar)?;
        sofar += sample.sectors;
        samples.push(sample);
    }

    Ok(LatencyStats::from_samples(samples).map(|stats| BaselineEstimate {
        offset,
        initial_seek_ms: seek.latency_ms,
        mean_ms_per_sector: stats.mean,
        stddev_ms_per_sector: stats.stddev,
    }))
}

fn read_logged<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    out: &mut Reporter<'_>,
    lba: u32,
    count: u32,
) -> Result<Sample> {
    match drive.read(lba, count) {
        Ok(sample) => {
            verbose!(out, "{}:{} ", sample.sectors, sample.latency_ms);
            Ok(sample)
        }
        Err(e) => {
            if e.is_transient() {
                report!(out, "\n\tWARNING: media error during read; continuing at next offset...");
            }
            Err(e)
        }
    }
}
