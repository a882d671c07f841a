//! 缓存大小搜索
//!
//! 命中很快而寻道很慢，所以从长度 1 开始线性向上扫描、遇到第一次未命中即停止，
//! 在常见的小缓存情形下比二分更省时间。
//!
//! 对每个长度 `L`：
//!
//! 1. 前 `fast_rounds` 轮全速进行：读 `offset + L - 1` 处的一个扇区，
//!    再重读 `offset`，重读耗时低于阈值即命中；
//! 2. 之后降到最低倍速，每轮顺序读完 `offset` 起的 `L` 个扇区再重读，
//!    避免驱动器在全速下快到看起来像缓存；
//! 3. 任何一轮未命中，缓存大小即为 `L - 1`；全部轮次命中则 `L + 1`。
//!
//! 直到上限都在命中时，缓存大小取上限；恰好在 `L` 等于上限时才未命中则无法判定。
//!
//! 介质错误时把测试偏移前移 `L + relocate_bias`，并从 `L = 1` 重新开始；
//! 连续换位超过 `max_relocations` 次为致命错误。

use super::config::ProbeConfig;
use super::retry::{report_fatal, Relocations};
use crate::drive::{DriveSession, TimedDrive};
use crate::error::{Error, ErrorKind, Result};
use crate::report::{progress, report, verbose, Reporter};
use crate::types::CacheSizeEstimate;

/// 搜索结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// 找到边界
    Found {
        /// 缓存大小
        size: CacheSizeEstimate,
        /// 最终使用的测试偏移（换位后可能前移）
        offset: u32,
    },
    /// 恰好在上限处才未命中，无法判定
    Indeterminate,
}

/// 测量缓存大小
pub fn find_cache_size<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    config: &ProbeConfig,
    out: &mut Reporter<'_>,
) -> Result<SearchOutcome> {
    let range = drive.range();
    let mut offset = range.first;
    let mut relocations = Relocations::new(config.max_relocations);
    let mut len = 1;

    report!(out, "\n\nAnalyzing readahead cache access...\n");

    'search: while len <= config.search_ceiling {
        progress!(out, "\r");
        report!(
            out,
            "\tFast search for approximate cache size... {} sectors            ",
            len - 1
        );
        verbose!(out, "\n");

        for round in 0..config.total_rounds {
            if offset.checked_add(len).map_or(true, |end| end > range.last) {
                report!(
                    out,
                    "\n\tOut of readable space on CDROM while performing drive checks;\n\t  aborting test.\n\n"
                );
                return Err(Error::new(ErrorKind::OutOfSpace, "probe ran past the audio range"));
            }

            if round == config.fast_rounds {
                throttle(drive, config, out, len);
            }

            match search_round(drive, config, out, offset, len, round) {
                Ok(true) => relocations.reset(),
                Ok(false) if len == config.search_ceiling => {
                    log::warn!("[SEARCH] first miss at the ceiling {}", len);
                    return Ok(SearchOutcome::Indeterminate);
                }
                Ok(false) => {
                    let size = CacheSizeEstimate { sectors: len - 1 };
                    log::info!("[SEARCH] miss at len={} round={}, cache size {}", len, round, size.sectors);
                    return Ok(SearchOutcome::Found { size, offset });
                }
                Err(e) if e.is_transient() => {
                    offset = offset.saturating_add(len + config.relocate_bias);
                    relocations.record(out)?;
                    log::warn!("[SEARCH] read error at len={}, relocated to {}", len, offset);
                    len = 1;
                    continue 'search;
                }
                Err(e) => {
                    report_fatal(out, &e);
                    return Err(e);
                }
            }
        }

        len += 1;
    }

    let size = CacheSizeEstimate { sectors: config.search_ceiling };
    log::warn!("[SEARCH] every length up to {} hit the cache", size.sectors);
    Ok(SearchOutcome::Found { size, offset })
}

/// 一轮填充读 + 重读，返回重读是否命中
fn search_round<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    config: &ProbeConfig,
    out: &mut Reporter<'_>,
    offset: u32,
    len: u32,
    round: u32,
) -> Result<bool> {
    if round >= config.fast_rounds {
        progress!(out, ".");
        verbose!(out, "\t\t>>> ");
        let mut sofar = 0;
        while sofar < len {
            let sample = drive.read(offset + sofar, len - sofar)?;
            verbose!(out, "slow_read={}:{} ", sample.sectors, sample.latency_ms);
            sofar += sample.sectors;
        }
    } else {
        let sample = drive.read(offset + len - 1, 1)?;
        verbose!(out, "\t\t>>> fast_read={}:{} ", sample.sectors, sample.latency_ms);
    }

    let sample = drive.read(offset, 1)?;
    verbose!(out, "seek_read={}:{}\n", sample.sectors, sample.latency_ms);

    let hit = config.is_hit(sample.latency_ms);
    log::debug!(
        "[SEARCH] len={} round={} reread={}ms {}",
        len,
        round,
        sample.latency_ms,
        if hit { "hit" } else { "miss" }
    );
    Ok(hit)
}

/// 进入慢速确认：尽力把驱动器降到最低倍速
fn throttle<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    config: &ProbeConfig,
    out: &mut Reporter<'_>,
    len: u32,
) {
    progress!(out, "\r");
    report!(out, "\tSlow verify for approximate cache size... {} sectors", len - 1);
    verbose!(out, "\n");

    verbose!(out, "\tAttempting to reduce read speed to {}x... ", config.slow_speed);
    if drive.set_read_speed(config.slow_speed) {
        verbose!(out, "drive said OK\n");
    } else {
        verbose!(out, "failed.\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedDrive;
    use crate::types::DiscRange;

    const RANGE: DiscRange = DiscRange::new(0, 99_999);

    fn search(dev: &mut SimulatedDrive, config: &ProbeConfig) -> Result<SearchOutcome> {
        let mut drive = TimedDrive::new(dev, RANGE);
        find_cache_size(&mut drive, config, &mut Reporter::silent())
    }

    fn found(sectors: u32, offset: u32) -> SearchOutcome {
        SearchOutcome::Found { size: CacheSizeEstimate { sectors }, offset }
    }

    #[test]
    fn test_finds_contiguous_cache() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64);
        assert_eq!(search(&mut dev, &ProbeConfig::default()).unwrap(), found(64, 0));
        assert!(dev.speed_changes() > 0);
    }

    #[test]
    fn test_no_cache_stops_before_slow_rounds() {
        let mut dev = SimulatedDrive::single_track(0, 99_999);
        assert_eq!(search(&mut dev, &ProbeConfig::default()).unwrap(), found(0, 0));
        assert_eq!(dev.speed_changes(), 0);
        assert_eq!(dev.reads_issued(), 2);
    }

    #[test]
    fn test_hits_up_to_ceiling_report_ceiling() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64);
        let config = ProbeConfig { search_ceiling: 20, ..ProbeConfig::default() };
        assert_eq!(search(&mut dev, &config).unwrap(), found(20, 0));
    }

    #[test]
    fn test_miss_at_ceiling_is_indeterminate() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(19);
        let config = ProbeConfig { search_ceiling: 20, ..ProbeConfig::default() };
        assert_eq!(search(&mut dev, &config).unwrap(), SearchOutcome::Indeterminate);
    }

    #[test]
    fn test_relocation_restarts_search() {
        // 第三轮的填充读开始连续失败三次
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64).fail_reads(4, 3);
        assert_eq!(search(&mut dev, &ProbeConfig::default()).unwrap(), found(64, 303));
    }

    #[test]
    fn test_relocation_limit() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64).fail_reads(4, 10);
        assert!(search(&mut dev, &ProbeConfig::default()).is_ok());

        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64).fail_reads(4, 11);
        let err = search(&mut dev, &ProbeConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TooManyErrors);
        assert_eq!(dev.reads_issued(), 15);
    }

    #[test]
    fn test_scattered_failures_do_not_add_up() {
        // 十二次互不相邻的失败，每次之间都有成功的轮次
        let mut dev = (0..12).fold(SimulatedDrive::single_track(0, 99_999).with_cache(64), |dev, k| {
            dev.fail_reads(4 + k * 40, 1)
        });
        let outcome = search(&mut dev, &ProbeConfig::default()).unwrap();
        assert!(matches!(outcome, SearchOutcome::Found { size, .. } if size.sectors == 64));
    }

    #[test]
    fn test_out_of_space() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64);
        let mut drive = TimedDrive::new(&mut dev, DiscRange::new(0, 40));
        let err = find_cache_size(&mut drive, &ProbeConfig::default(), &mut Reporter::silent())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfSpace);
    }

    #[test]
    fn test_timing_fault_stops_reads() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(64).timing_fault_at(9);
        let err = search(&mut dev, &ProbeConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TimingFault);
        assert_eq!(dev.reads_issued(), 10);
    }

    #[test]
    fn test_refused_speed_change_is_not_fatal() {
        let mut dev = SimulatedDrive::single_track(0, 99_999).with_cache(8).refuse_speed_changes();
        assert_eq!(search(&mut dev, &ProbeConfig::default()).unwrap(), found(8, 0));
        assert_eq!(dev.speed_changes(), 0);
    }
}
