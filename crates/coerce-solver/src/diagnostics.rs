//! Use-site diagnostics collected during classification.
//!
//! Classification is total and returns `NoConversion` for everything it
//! rejects. A few rejections carry information the caller must report even
//! though no conversion exists (a signature using a modifier the language
//! does not understand, an `UnmanagedCallersOnly` target, an anonymous method
//! converted to an expression tree). Those are pushed into a caller-owned
//! [`UseSiteDiagnostics`] collector.

use coerce_common::diagnostics::{DiagnosticMessage, format_message};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UseSiteDiagnostic {
    pub message: DiagnosticMessage,
    pub args: Vec<String>,
}

impl UseSiteDiagnostic {
    pub fn code(&self) -> u32 {
        self.message.code
    }

    /// The message with its arguments substituted.
    pub fn render(&self) -> String {
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        format_message(self.message.message, &args)
    }
}

#[derive(Clone, Debug, Default)]
pub struct UseSiteDiagnostics {
    items: Vec<UseSiteDiagnostic>,
}

impl UseSiteDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: DiagnosticMessage, args: Vec<String>) {
        let diagnostic = UseSiteDiagnostic { message, args };
        if !self.items.contains(&diagnostic) {
            self.items.push(diagnostic);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UseSiteDiagnostic> {
        self.items.iter()
    }

    pub fn has_code(&self, code: u32) -> bool {
        self.items.iter().any(|d| d.code() == code)
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
