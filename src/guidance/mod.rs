//! 导航播报能力边界。

pub mod format;

use tracing::info;

/// 播报一条指引文本。只发不收：实现不得阻塞调用方。
pub trait GuidanceAnnouncer: Send + Sync {
    fn announce(&self, text: &str);
}

/// 将播报写入日志，供无语音输出的宿主使用。
#[derive(Debug, Default)]
pub struct TracingAnnouncer;

impl GuidanceAnnouncer for TracingAnnouncer {
    fn announce(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        info!(target: "guidance_announcer", instruction = %text, "announcing guidance");
    }
}
