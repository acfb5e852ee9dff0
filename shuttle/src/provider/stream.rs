//! Token streams: finite, non-restartable lazy sequences of reply tokens.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

/// One streamed piece of a reply. The final token of a stream has
/// `finished = true` and usually empty text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub finished: bool,
}

impl Token {
    pub fn text_chunk(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            finished: false,
        }
    }

    pub fn finish() -> Self {
        Self {
            text: String::new(),
            finished: true,
        }
    }
}

/// A finite sequence of [`Token`]s backed by a bounded channel.
///
/// Tokens arrive in sending order; the stream ends when the sender closes
/// the channel (normally right after the finishing token). On
/// cancellation, providers drop the sender without sending further tokens.
pub struct TokenStream {
    rx: mpsc::Receiver<Token>,
}

impl TokenStream {
    /// Creates a channel-backed stream; the provider keeps the sender.
    pub fn channel(buffer: usize) -> (mpsc::Sender<Token>, TokenStream) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (tx, TokenStream { rx })
    }

    /// A stream delivering `text` as one content token plus the finishing
    /// token (just the finishing token for empty text).
    pub fn from_text(text: impl Into<String>) -> TokenStream {
        let text = text.into();
        let (tx, stream) = Self::channel(2);
        // Capacity covers both sends, so try_send cannot fail here.
        if !text.is_empty() {
            let _ = tx.try_send(Token::text_chunk(text));
        }
        let _ = tx.try_send(Token::finish());
        stream
    }

    /// Receives the next token; `None` once the stream is closed.
    pub async fn next(&mut self) -> Option<Token> {
        self.rx.recv().await
    }

    /// Collects the remaining content tokens into one string.
    pub async fn collect_text(mut self) -> String {
        let mut out = String::new();
        while let Some(token) = self.next().await {
            out.push_str(&token.text);
            if token.finished {
                break;
            }
        }
        out
    }
}

impl Stream for TokenStream {
    type Item = Token;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Token>> {
        self.rx.poll_recv(cx)
    }
}
