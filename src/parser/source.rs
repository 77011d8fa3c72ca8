//! Token sources feeding the parser
//!
//! The parser pulls tokens one at a time from anything implementing
//! [`TokenSource`]. Two sources are provided:
//! - [`Lexer`]: single-threaded, produces each token on demand
//! - [`ScannerThread`]: runs a lexer on its own thread and hands tokens over a
//!   bounded channel, so scanning overlaps with parsing
//!
//! [`open`] builds the source selected by [`ScanOptions`].

use crate::parser::lexer::{Lexer, Token};
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use tracing::trace;

/// Default number of tokens buffered between scanner thread and parser.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Ordered, finite stream of tokens terminated by exactly one `Eof`.
pub trait TokenSource: Iterator<Item = Token> {}

impl<T: Iterator<Item = Token>> TokenSource for T {}

/// How source text is turned into tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Scan on a separate thread.
    pub threaded: bool,
    /// Print every token to stderr as the parser receives it.
    pub echo_tokens: bool,
    pub channel_capacity: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            threaded: false,
            echo_tokens: false,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Build the token source described by `options`.
pub fn open(source: &str, options: &ScanOptions) -> Box<dyn TokenSource + Send> {
    let tokens: Box<dyn TokenSource + Send> = if options.threaded {
        Box::new(ScannerThread::spawn(source, options.channel_capacity))
    } else {
        Box::new(Lexer::new(source))
    };

    if options.echo_tokens {
        Box::new(tokens.inspect(|token| eprintln!("{}", format_token(token))))
    } else {
        tokens
    }
}

/// One-line rendering used by the token echo.
pub fn format_token(token: &Token) -> String {
    format!(
        "TOKEN {:>4}:{:<3} : {} : {}",
        token.location.line,
        token.location.column,
        token.kind,
        token.lexeme.as_deref().unwrap_or("")
    )
}

/// Lexer running on a spawned thread.
///
/// The thread blocks when the channel is full and exits once it has sent
/// `Eof` or the receiving side has gone away.
pub struct ScannerThread {
    receiver: Option<Receiver<Token>>,
    handle: Option<JoinHandle<()>>,
}

impl ScannerThread {
    pub fn spawn(source: &str, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity.max(1));
        let lexer = Lexer::new(source);

        let handle = thread::spawn(move || {
            trace!("scanner thread started");
            for token in lexer {
                if sender.send(token).is_err() {
                    trace!("scanner channel closed by receiver");
                    return;
                }
            }
            trace!("scanner thread finished");
        });

        ScannerThread {
            receiver: Some(receiver),
            handle: Some(handle),
        }
    }
}

impl Iterator for ScannerThread {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        // A recv error means the sender hung up: the stream is closed.
        self.receiver.as_ref()?.recv().ok()
    }
}

impl Drop for ScannerThread {
    fn drop(&mut self) {
        // Close the channel first so a blocked sender wakes up and exits.
        self.receiver.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                trace!("scanner thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::TokenKind;

    #[test]
    fn test_threaded_matches_lexer() {
        let source = "let mut x: int32 = 1 + 2;\nfunc f(void) return void { }";
        let direct: Vec<Token> = Lexer::new(source).collect();
        let threaded: Vec<Token> = ScannerThread::spawn(source, 2).collect();

        assert_eq!(direct, threaded);
    }

    #[test]
    fn test_channel_closes_after_eof() {
        let mut scanner = ScannerThread::spawn("x", 1);
        assert_eq!(scanner.next().map(|t| t.kind), Some(TokenKind::Identifier));
        assert_eq!(scanner.next().map(|t| t.kind), Some(TokenKind::Eof));
        assert!(scanner.next().is_none());
    }

    #[test]
    fn test_early_drop_does_not_hang() {
        let source = "x ".repeat(10_000);
        let mut scanner = ScannerThread::spawn(&source, 1);
        assert!(scanner.next().is_some());
        drop(scanner);
    }

    #[test]
    fn test_open_respects_options() {
        let options = ScanOptions {
            threaded: true,
            ..ScanOptions::default()
        };
        let kinds: Vec<TokenKind> = open("a b", &options).map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }
}
