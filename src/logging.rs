//! 日志初始化

use tracing::Level;

/// 安装全局 fmt 订阅器
///
/// 无法解析的级别回退到 `info`；重复调用时保留第一次安装的订阅器。
pub fn init(level: &str) {
    let level = level.parse::<Level>().unwrap_or(Level::INFO);

    let result = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();

    if result.is_err() {
        tracing::debug!("日志订阅器已安装，忽略重复初始化");
    }
}
