//! Renderer trait - the outbound collaborator that presents notifications

use async_trait::async_trait;
use std::io::Write;

use super::dispatcher::RenderRequest;
use super::importance::Importance;
use crate::error::RenderDeliveryError;

/// Presents render requests (OS notification shade, file, webhook, ...)
///
/// `render` returns once the renderer has accepted the request; it does not
/// wait for the notification to be on screen.
#[async_trait]
pub trait NotificationRenderer: Send + Sync {
    /// Renderer name (for logs and errors)
    fn name(&self) -> &str;

    async fn render(&self, request: &RenderRequest) -> Result<(), RenderDeliveryError>;
}

/// Prints one line per notification to stdout
#[derive(Debug, Default)]
pub struct ConsoleRenderer;

impl ConsoleRenderer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl NotificationRenderer for ConsoleRenderer {
    fn name(&self) -> &str {
        "console"
    }

    async fn render(&self, request: &RenderRequest) -> Result<(), RenderDeliveryError> {
        writeln!(std::io::stdout(), "{}", format_line(request)).map_err(|source| RenderDeliveryError::Io {
            renderer: self.name().to_string(),
            notification_id: request.notification_id,
            source,
        })
    }
}

fn format_line(request: &RenderRequest) -> String {
    let icon = match request.importance {
        Importance::High => "🔔",
        Importance::Default => "📬",
        Importance::Low => "📭",
    };
    format!(
        "{} [{}] #{} {}: {}",
        icon, request.channel_id, request.notification_id, request.title, request.body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn request() -> RenderRequest {
        RenderRequest {
            notification_id: 7,
            intent_id: "m1".to_string(),
            title: "Hi".to_string(),
            body: "Hello".to_string(),
            channel_id: "high_importance_channel".to_string(),
            importance: Importance::High,
            vibration_pattern: vec![],
            sound: true,
            auto_cancel: true,
            data: BTreeMap::new(),
        }
    }

    #[test]
    fn test_format_line() {
        assert_eq!(
            format_line(&request()),
            "🔔 [high_importance_channel] #7 Hi: Hello"
        );
    }

    #[tokio::test]
    async fn test_console_renderer_accepts() {
        let renderer = ConsoleRenderer::new();
        assert_eq!(renderer.name(), "console");
        assert!(renderer.render(&request()).await.is_ok());
    }
}
