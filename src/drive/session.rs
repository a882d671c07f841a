//! 驱动器会话接口

/// 读取失败的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadError {
    /// 介质错误（瞬时，可换位置重试）
    Media,
    /// 设备不可恢复的状态，必须立即中止探测
    DeviceFatal,
}

/// 驱动器会话接口
///
/// 实现此 trait 以向探测提供底层光驱访问。探测期间会话被独占借用，
/// 其他逻辑不能并发发出读取，否则会破坏延迟测量。
///
/// # 示例
///
/// ```rust,ignore
/// use cdda_cachetest::{DriveSession, ReadError};
///
/// struct MyDrive {
///     // ...
/// }
///
/// impl DriveSession for MyDrive {
///     fn track_count(&self) -> u8 {
///         self.toc.len() as u8
///     }
///
///     fn read(&mut self, lba: u32, count: u32) -> Result<u32, ReadError> {
///         // 发出 READ CD，计时
///         Ok(count)
///     }
///
///     // ...
/// }
/// ```
pub trait DriveSession {
    /// 音轨数量
    fn track_count(&self) -> u8;

    /// 音轨是否为音频轨（音轨号从 1 开始）
    fn is_audio_track(&self, track: u8) -> bool;

    /// 音轨首扇区
    fn track_first_sector(&self, track: u8) -> u32;

    /// 音轨末扇区（包含）
    fn track_last_sector(&self, track: u8) -> u32;

    /// 读取扇区
    ///
    /// # 参数
    ///
    /// * `lba` - 起始扇区
    /// * `count` - 请求的扇区数
    ///
    /// # 返回
    ///
    /// 成功返回实际读取的扇区数，可能少于请求值；`Ok(0)` 视为读取失败
    fn read(&mut self, lba: u32, count: u32) -> Result<u32, ReadError>;

    /// 上一次操作耗时（毫秒）
    ///
    /// 计时子系统故障时返回 [`TIMING_FAULT`](crate::consts::TIMING_FAULT)
    fn milliseconds(&self) -> i32;

    /// 设置读取倍速
    ///
    /// 尽力而为，驱动器拒绝时返回 `false`
    fn set_read_speed(&mut self, multiplier: u32) -> bool;
}
