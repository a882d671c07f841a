//! 连续性验证
//!
//! 与快速搜索类似，但读的是 `offset + multiplier·S` 处的远端扇区：
//! 单一连续窗口的缓存在那之后不可能还保留着 `offset`，
//! 若重读 `offset` 仍然命中，说明缓存按多个区域分别管理。

use super::config::ProbeConfig;
use super::retry::{report_fatal, Relocations};
use crate::drive::{DriveSession, TimedDrive};
use crate::error::{Error, ErrorKind, Result};
use crate::report::{progress, report, verbose, Reporter};
use crate::types::CacheSizeEstimate;

/// 验证缓存是否为单一连续窗口
///
/// # 返回
///
/// - `Ok(true)` - 所有轮次都按预期未命中
/// - `Ok(false)` - 某一轮意外命中，缓存不连续
pub fn verify_contiguous<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    config: &ProbeConfig,
    out: &mut Reporter<'_>,
    mut offset: u32,
    size: CacheSizeEstimate,
) -> Result<bool> {
    let last = drive.range().last;
    let seekoff = size.sectors.saturating_mul(config.contiguity_multiplier);
    let mut relocations = Relocations::new(config.max_relocations);
    let mut round = 0;

    report!(out, "\nVerifying that readahead cache is contiguous");

    while round < config.contiguity_rounds {
        progress!(out, ".");

        if offset.checked_add(seekoff).map_or(true, |far| far > last) {
            report!(
                out,
                "\n\tOut of readable space on CDROM while performing drive checks;\n\t  aborting test.\n\n"
            );
            log::error!("[CONTIG] offset {} + {} past end of audio", offset, seekoff);
            return Err(Error::new(ErrorKind::OutOfSpace, "out of readable space"));
        }

        match contiguity_round(drive, config, out, offset, seekoff) {
            Ok(false) => {
                relocations.reset();
                round += 1;
            }
            Ok(true) => {
                log::warn!("[CONTIG] offset {} still cached after reading {} ahead", offset, seekoff);
                return Ok(false);
            }
            Err(e) if e.is_transient() => {
                offset = offset.saturating_add(size.sectors + 1 + config.relocate_bias);
                relocations.record(out)?;
                log::warn!("[CONTIG] read error, relocated to {}", offset);
            }
            Err(e) => {
                report_fatal(out, &e);
                return Err(e);
            }
        }
    }

    log::info!("[CONTIG] {} rounds without a hit", round);
    Ok(true)
}

/// 读远端扇区后重读 `offset`，返回是否命中
fn contiguity_round<D: DriveSession + ?Sized>(
    drive: &mut TimedDrive<'_, D>,
    config: &ProbeConfig,
    out: &mut Reporter<'_>,
    offset: u32,
    seekoff: u32,
) -> Result<bool> {
    let far = drive.read(offset + seekoff, 1)?;
    verbose!(out, "\t\t>>> {}:{} ", offset + seekoff, far.latency_ms);
    let back = drive.read(offset, 1)?;
    verbose!(out, "{}:{}\n", offset, back.latency_ms);
    Ok(config.is_hit(back.latency_ms))
}
