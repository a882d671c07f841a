//! 结论分类

use crate::types::{CacheSizeEstimate, Verdict, Warnings};

/// 由搜索和验证结果得出结论
///
/// # 参数
///
/// * `size` - 搜索得到的缓存大小，`None` 表示恰好在搜索上限处才未命中，无法确定
/// * `contiguous` - 连续性验证结果（无缓存或未确定时忽略）
/// * `model_sectors` - 纠错模型上限
///
/// 超出模型与不连续两个警告可以同时成立，此时结论取 `NonContiguous`，
/// 两个标志都会置位。
pub fn classify(
    size: Option<CacheSizeEstimate>,
    contiguous: bool,
    model_sectors: u32,
) -> (Verdict, Warnings) {
    let size = match size {
        None => return (Verdict::Indeterminate, Warnings::empty()),
        Some(size) if size.sectors == 0 => return (Verdict::NoCache, Warnings::empty()),
        Some(size) => size,
    };

    let mut warnings = Warnings::empty();
    warnings.set(Warnings::EXCEEDS_MODEL, size.exceeds_model(model_sectors));
    warnings.set(Warnings::NON_CONTIGUOUS, !contiguous);

    let verdict = if warnings.contains(Warnings::NON_CONTIGUOUS) {
        Verdict::NonContiguous(size.sectors)
    } else if warnings.contains(Warnings::EXCEEDS_MODEL) {
        Verdict::DeterminateExceedsModel(size.sectors)
    } else {
        Verdict::Determinate(size.sectors)
    };
    (verdict, warnings)
}
