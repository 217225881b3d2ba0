//! 报告导出到剪贴板

use async_trait::async_trait;
use spine_core::{Result, SpineError};
use spine_report::ReportSession;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// 剪贴板写入接口
#[async_trait]
pub trait ClipboardSink: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

/// 通过外部程序（如 `wl-copy`、`xclip -selection clipboard`、`pbcopy`）写入系统剪贴板
#[derive(Debug, Clone)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl ClipboardSink for CommandClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        debug!("Piping {} chars into {}", text.len(), self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                error!("Failed to start clipboard program {}: {}", self.program, e);
                SpineError::ClipboardUnavailable(format!("{}: {}", self.program, e))
            })?;

        let mut stdin = child.stdin.take().ok_or_else(|| {
            SpineError::ClipboardUnavailable(format!("{}: stdin not captured", self.program))
        })?;
        stdin
            .write_all(text.as_bytes())
            .await
            .map_err(|e| SpineError::ClipboardUnavailable(format!("write failed: {}", e)))?;
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|e| SpineError::ClipboardUnavailable(format!("wait failed: {}", e)))?;

        if !status.success() {
            return Err(SpineError::ClipboardUnavailable(format!(
                "{} exited with {}",
                self.program, status
            )));
        }

        Ok(())
    }
}

/// 内存剪贴板，保存最近一次写入的内容
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<RwLock<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contents(&self) -> Option<String> {
        self.contents.read().await.clone()
    }
}

#[async_trait]
impl ClipboardSink for MemoryClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        *self.contents.write().await = Some(text.to_string());
        Ok(())
    }
}

/// 导出报告：优先使用会话中的报告文本（含用户编辑），为空时按当前状态生成
///
/// 返回实际写入的文本。
pub async fn export_report<S>(sink: &S, session: &ReportSession) -> Result<String>
where
    S: ClipboardSink + ?Sized,
{
    let text = if session.report_text.trim().is_empty() {
        session.compose()
    } else {
        session.report_text.clone()
    };

    sink.write_text(&text).await?;
    info!("Report for session {} exported to clipboard", session.id);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_export_composes_when_blank() {
        let clipboard = MemoryClipboard::new();
        let session = ReportSession::default();

        let written = export_report(&clipboard, &session).await.unwrap();
        assert_eq!(written, session.compose());
        assert_eq!(clipboard.contents().await, Some(session.compose()));
    }

    #[tokio::test]
    async fn test_export_keeps_edited_text() {
        let clipboard = MemoryClipboard::new();
        let session = ReportSession::default()
            .generate_report()
            .with_report_text("Edited report\n\nImpression:\n• Custom");

        export_report(&clipboard, &session).await.unwrap();
        assert_eq!(
            clipboard.contents().await.as_deref(),
            Some("Edited report\n\nImpression:\n• Custom")
        );
    }

    #[tokio::test]
    async fn test_missing_program() {
        let clipboard = CommandClipboard::new("definitely-not-a-clipboard-tool", Vec::new());
        let result = export_report(&clipboard, &ReportSession::default()).await;
        assert!(matches!(result, Err(SpineError::ClipboardUnavailable(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_clipboard() {
        let clipboard = CommandClipboard::new("cat", Vec::new());
        assert!(clipboard.write_text("MRI LUMBAR SPINE").await.is_ok());

        let failing = CommandClipboard::new("false", Vec::new());
        assert!(matches!(
            failing.write_text("ignored").await,
            Err(SpineError::ClipboardUnavailable(_))
        ));
    }
}
