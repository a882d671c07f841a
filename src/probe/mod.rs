//! 缓存探测
//!
//! 没有哪条标准命令能可靠地报告驱动器是否缓存音频扇区、缓存多少扇区、
//! 缓存是否是一个连续窗口。本模块通过计时的读取/寻道序列推断这些信息：
//!
//! - [`baseline`] - 基线采样，输出寻道和读取耗时供人工判断（仅诊断）
//! - [`search`] - 线性搜索缓存大小
//! - [`contiguity`] - 验证缓存是否为单一连续窗口
//! - [`verdict`] - 把结果归类为 [`Verdict`]
//!
//! 整个流程单线程同步执行，探测期间独占驱动器会话。
//!
//! # 使用示例
//!
//! ```rust,ignore
//! use cdda_cachetest::{CacheProbe, Verdict};
//!
//! let mut progress = String::new();
//! let report = CacheProbe::new(&mut drive)
//!     .with_progress(&mut progress)
//!     .run();
//!
//! match report.verdict {
//!     Verdict::Determinate(sectors) => println!("cache: {} sectors", sectors),
//!     other => println!("{:?}", other),
//! }
//! ```

mod config;

pub mod baseline;
pub mod contiguity;
pub mod search;
pub mod verdict;

mod retry;

pub use config::ProbeConfig;

use crate::drive::{DriveSession, TimedDrive};
use crate::error::{Error, ErrorKind, Result};
use crate::report::{progress, report, Reporter};
use crate::types::{BaselineEstimate, DiscRange, Verdict, Warnings};
use alloc::vec::Vec;
use core::fmt::Write;

use baseline::sample_baseline;
use contiguity::verify_contiguous;
use search::{find_cache_size, SearchOutcome};
use verdict::classify;

/// 探测报告
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    /// 结论
    pub verdict: Verdict,
    /// 附带的警告
    pub warnings: Warnings,
    /// 探测使用的音频区间（无音轨时为 `None`）
    pub range: Option<DiscRange>,
    /// 基线采样结果
    pub baseline: Vec<BaselineEstimate>,
    /// 发出的读取次数
    pub reads: u64,
    /// 失败的读取次数
    pub failed_reads: u64,
}

impl ProbeReport {
    /// 顶层返回码，见 [`Verdict::return_code`]
    pub fn return_code(&self) -> i32 {
        self.verdict.return_code()
    }

    /// 检测到的缓存大小
    pub fn cache_size(&self) -> Option<u32> {
        self.verdict.cache_size()
    }
}

/// 缓存探测器
pub struct CacheProbe<'d, 'w, D: ?Sized> {
    device: &'d mut D,
    config: ProbeConfig,
    out: Reporter<'w>,
}

impl<'d, 'w, D: DriveSession + ?Sized> CacheProbe<'d, 'w, D> {
    /// 使用默认配置、无诊断输出创建探测器
    pub fn new(device: &'d mut D) -> Self {
        Self {
            device,
            config: ProbeConfig::default(),
            out: Reporter::silent(),
        }
    }

    /// 设置配置
    pub fn with_config(mut self, config: ProbeConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置简短进度输出
    pub fn with_progress(mut self, sink: &'w mut dyn Write) -> Self {
        self.out.set_progress(sink);
        self
    }

    /// 设置详细日志输出
    pub fn with_log(mut self, sink: &'w mut dyn Write) -> Self {
        self.out.set_log(sink);
        self
    }

    /// 运行探测直到得出结论
    pub fn run(self) -> ProbeReport {
        let Self { device, config, mut out } = self;

        report!(
            out,
            "\n=================== Checking drive cache/timing behavior ===================\n"
        );

        let Some(range) = DiscRange::longest_audio_run(&*device) else {
            report!(out, "\n\tNo audio on disc; Cannot determine timing behavior...");
            log::error!("[PROBE] no audio tracks on disc");
            return ProbeReport {
                verdict: Verdict::FatalError(Error::new(ErrorKind::NoAudio, "no audio on disc")),
                warnings: Warnings::empty(),
                range: None,
                baseline: Vec::new(),
                reads: 0,
                failed_reads: 0,
            };
        };
        log::info!("[PROBE] audio range {}..={}", range.first, range.last);

        let mut drive = TimedDrive::new(device, range);
        let mut baseline = Vec::new();
        let (verdict, warnings) = match analyze(&mut drive, &config, &mut out, &mut baseline) {
            Ok(result) => result,
            Err(e) => {
                log::error!("[PROBE] aborted: {}", e);
                (Verdict::FatalError(e), Warnings::empty())
            }
        };

        ProbeReport {
            verdict,
            warnings,
            range: Some(range),
            baseline,
            reads: drive.read_count(),
            failed_reads: drive.failed_reads(),
        }
    }
}

/// 以默认配置探测，结果写入两路可选输出
pub fn analyze_verify<'w, D: DriveSession + ?Sized>(
    device: &mut D,
    progress: Option<&'w mut dyn Write>,
    log: Option<&'w mut dyn Write>,
) -> ProbeReport {
    let mut probe = CacheProbe::new(device);
    if let Some(sink) = progress {
        probe = probe.with_progress(sink);
    }
    if let Some(sink) = log {
        probe = probe.with_log(sink);
    }
    probe.run()
}

fn analyze<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    config: &ProbeConfig,
    out: &mut Reporter<'_>,
    baseline: &mut Vec<BaselineEstimate>,
) -> Result<(Verdict, Warnings)> {
    if config.sample_baseline {
        *baseline = sample_baseline(drive, config, out)?;
    }

    let outcome = find_cache_size(drive, config, out)?;
    progress!(out, "\r");

    let (size, offset) = match outcome {
        SearchOutcome::Indeterminate => {
            report!(out, "\tWARNING: Cannot determine drive cache size or behavior!          \n");
            return Ok(classify(None, true, config.cache_model_sectors));
        }
        SearchOutcome::Found { size, .. } if size.sectors == 0 => {
            report!(out, "\tDrive does not cache nonlinear access                            \n");
            return Ok(classify(Some(size), true, config.cache_model_sectors));
        }
        SearchOutcome::Found { size, offset } => {
            report!(
                out,
                "\tApproximate random access cache size: {} sectors                 \n",
                size.sectors
            );
            (size, offset)
        }
    };

    if size.exceeds_model(config.cache_model_sectors) {
        report!(
            out,
            "\nWARNING: This drive appears to be caching more sectors of\n           readahead than the error-correction model can currently handle!\n"
        );
        log::warn!(
            "[PROBE] cache of {} sectors exceeds model limit {}",
            size.sectors,
            config.cache_model_sectors
        );
    }

    let contiguous = verify_contiguous(drive, config, out, offset, size)?;
    if contiguous {
        report!(out, "\n\tdone.  Drive cache tests as contiguous.\n");
    } else {
        report!(out, "\nWARNING: Drive cache does not appear to be contiguous!\n");
    }

    let (verdict, warnings) = classify(Some(size), contiguous, config.cache_model_sectors);
    log::info!("[PROBE] verdict {:?} warnings {:?}", verdict, warnings);
    Ok((verdict, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimTrack, SimulatedDrive};
    use alloc::string::String;
    use alloc::vec;

    fn no_baseline() -> ProbeConfig {
        ProbeConfig { sample_baseline: false, ..ProbeConfig::default() }
    }

    fn probe(dev: &mut SimulatedDrive, config: ProbeConfig) -> ProbeReport {
        CacheProbe::new(dev).with_config(config).run()
    }

    #[test]
    fn test_determinate_cache_with_baseline() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64);
        let mut progress = String::new();
        let report = CacheProbe::new(&mut dev).with_progress(&mut progress).run();

        assert_eq!(report.verdict, Verdict::Determinate(64));
        assert_eq!(report.warnings, Warnings::empty());
        assert_eq!(report.return_code(), 0);
        assert_eq!(report.cache_size(), Some(64));
        assert_eq!(report.range, Some(DiscRange::new(0, 99_999)));
        assert!(!report.baseline.is_empty());
        assert!(progress.contains("Approximate random access cache size: 64 sectors"));
        assert!(progress.contains("Drive cache tests as contiguous"));
    }

    #[test]
    fn test_determinate_for_several_sizes() {
        for size in [1, 2, 27, 64, 300, 1200] {
            let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(size);
            assert_eq!(probe(&mut dev, no_baseline()).verdict, Verdict::Determinate(size));
        }
    }

    #[test]
    fn test_no_cache() {
        let mut dev = SimulatedDrive::single_track(0, 99_999);
        let report = probe(&mut dev, ProbeConfig::default());
        assert_eq!(report.verdict, Verdict::NoCache);
        assert_eq!(report.return_code(), 0);
        assert_eq!(dev.speed_changes(), 0);
    }

    #[test]
    fn test_exceeds_model() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64);
        let config = ProbeConfig { cache_model_sectors: 32, ..no_baseline() };
        let report = probe(&mut dev, config);
        assert_eq!(report.verdict, Verdict::DeterminateExceedsModel(64));
        assert_eq!(report.warnings, Warnings::EXCEEDS_MODEL);
        assert_eq!(report.return_code(), 1);
        assert_eq!(report.cache_size(), Some(64));
    }

    #[test]
    fn test_cache_beyond_search_ceiling_exceeds_model() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(200);
        let config = ProbeConfig { search_ceiling: 150, cache_model_sectors: 100, ..no_baseline() };
        let mut progress = String::new();
        let report = CacheProbe::new(&mut dev).with_config(config).with_progress(&mut progress).run();
        assert_eq!(report.verdict, Verdict::DeterminateExceedsModel(150));
        assert_eq!(report.warnings, Warnings::EXCEEDS_MODEL);
        assert_eq!(report.return_code(), 1);
        assert_eq!(report.cache_size(), Some(150));
        assert!(progress.contains("Drive cache tests as contiguous"));
    }

    #[test]
    fn test_miss_at_search_ceiling_is_indeterminate() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(149);
        let config = ProbeConfig { search_ceiling: 150, ..no_baseline() };
        let report = probe(&mut dev, config);
        assert_eq!(report.verdict, Verdict::Indeterminate);
        assert_eq!(report.return_code(), 1);
        assert_eq!(report.cache_size(), None);
    }

    #[test]
    fn test_non_contiguous() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(16).with_segments(2);
        let mut progress = String::new();
        let report = CacheProbe::new(&mut dev)
            .with_config(no_baseline())
            .with_progress(&mut progress)
            .run();
        assert_eq!(report.verdict, Verdict::NonContiguous(16));
        assert_eq!(report.warnings, Warnings::NON_CONTIGUOUS);
        assert_eq!(report.return_code(), 1);
        assert!(progress.contains("does not appear to be contiguous"));
    }

    #[test]
    fn test_both_warnings() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(16).with_segments(2);
        let config = ProbeConfig { cache_model_sectors: 8, ..no_baseline() };
        let report = probe(&mut dev, config);
        assert_eq!(report.verdict, Verdict::NonContiguous(16));
        assert_eq!(report.warnings, Warnings::EXCEEDS_MODEL | Warnings::NON_CONTIGUOUS);
    }

    #[test]
    fn test_audio_after_data_track() {
        let tracks = vec![
            SimTrack { first: 0, last: 9_999, audio: false },
            SimTrack { first: 10_000, last: 109_999, audio: true },
        ];
        let mut dev = SimulatedDrive::new(tracks).with_cache(48);
        let report = probe(&mut dev, ProbeConfig::default());
        assert_eq!(report.range, Some(DiscRange::new(10_000, 109_999)));
        assert_eq!(report.verdict, Verdict::Determinate(48));
        assert!(report.baseline.iter().all(|e| e.offset >= 10_000));
    }

    #[test]
    fn test_no_audio() {
        let tracks = vec![SimTrack { first: 0, last: 9_999, audio: false }];
        let mut dev = SimulatedDrive::new(tracks).with_cache(48);
        let mut progress = String::new();
        let report = analyze_verify(&mut dev, Some(&mut progress), None);
        assert_eq!(report.verdict.error_kind(), Some(ErrorKind::NoAudio));
        assert_eq!(report.return_code(), -1);
        assert_eq!(report.reads, 0);
        assert_eq!(dev.reads_issued(), 0);
        assert!(progress.contains("No audio on disc"));
    }

    #[test]
    fn test_transient_burst_does_not_change_verdict() {
        let mut clean = SimulatedDrive::single_track(0, 99_999).with_cache(64);
        let expected = probe(&mut clean, no_baseline()).verdict;

        for start in [0, 4, 200, 1500] {
            let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64).fail_reads(start, 5);
            let report = probe(&mut dev, no_baseline());
            assert_eq!(report.verdict, expected);
            assert_eq!(report.failed_reads, 5);
        }
    }

    #[test]
    fn test_isolated_failures_across_lengths() {
        let mut clean = SimulatedDrive::single_track(0, 99_999).with_cache(64);
        let expected = probe(&mut clean, no_baseline()).verdict;

        // 十一次分散的失败，总数超过换位上限，但从不连续
        let mut dev = (0..11).fold(SimulatedDrive::single_track(0, 99_999).with_cache(64), |dev, k| {
            dev.fail_reads(10 + k * 60, 1)
        });
        let report = probe(&mut dev, no_baseline());
        assert_eq!(report.verdict, expected);
        assert_eq!(report.failed_reads, 11);
    }

    #[test]
    fn test_excessive_failures_are_fatal() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64).fail_reads(4, 11);
        let report = probe(&mut dev, no_baseline());
        assert_eq!(report.verdict.error_kind(), Some(ErrorKind::TooManyErrors));
        assert_eq!(report.return_code(), -1);
    }

    #[test]
    fn test_timing_fault_halts_probe() {
        let mut clean = SimulatedDrive::single_track(0, 99_999).with_cache(64);
        let total = probe(&mut clean, no_baseline()).reads;

        for fault_at in [0, 1, 7, total / 2, total - 10, total - 1] {
            let mut dev = SimulatedDrive::single_track(0, 99_999)
                .with_cache(64)
                .timing_fault_at(fault_at);
            let report = probe(&mut dev, no_baseline());
            assert_eq!(report.verdict.error_kind(), Some(ErrorKind::TimingFault));
            assert_eq!(dev.reads_issued(), fault_at + 1);
        }
    }

    #[test]
    fn test_timing_fault_during_baseline() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64).timing_fault_at(3);
        let mut progress = String::new();
        let mut detail = String::new();
        let report = CacheProbe::new(&mut dev)
            .with_progress(&mut progress)
            .with_log(&mut detail)
            .run();
        assert_eq!(report.verdict.error_kind(), Some(ErrorKind::TimingFault));
        assert_eq!(dev.reads_issued(), 4);
        assert!(report.baseline.is_empty());
        assert!(progress.contains("Timing error"));
        assert!(detail.contains("Timing error"));
    }

    #[test]
    fn test_device_fatal() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64).device_fatal_at(100);
        let report = probe(&mut dev, no_baseline());
        assert_eq!(report.verdict.error_kind(), Some(ErrorKind::DeviceFatal));
        assert_eq!(dev.reads_issued(), 101);
    }

    #[test]
    fn test_log_sink_records_reads() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(4);
        let mut detail = String::new();
        let report = CacheProbe::new(&mut dev)
            .with_config(no_baseline())
            .with_log(&mut detail)
            .run();
        assert_eq!(report.verdict, Verdict::Determinate(4));
        assert!(detail.contains("fast_read="));
        assert!(detail.contains("slow_read="));
        assert!(detail.contains("seek_read="));
        assert!(detail.contains("Attempting to reduce read speed to 1x"));
    }
}
