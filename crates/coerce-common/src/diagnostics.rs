//! Diagnostic codes and message templates.
//!
//! The solver never renders diagnostics. It produces structured outcomes and
//! maps them to a [`DiagnosticMessage`]; callers substitute `{0}`, `{1}`, ...
//! with [`format_message`].

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    Suggestion,
    Message,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    pub const CANNOT_IMPLICITLY_CONVERT: u32 = 29;
    pub const CANNOT_CONVERT: u32 = 30;
    pub const AMBIGUOUS_CALL: u32 = 121;
    pub const TYPE_ARGUMENTS_CANNOT_BE_INFERRED: u32 = 411;
    pub const AMBIGUOUS_USER_DEFINED_CONVERSION: u32 = 457;
    pub const NOT_SUPPORTED_BY_LANGUAGE: u32 = 570;
    pub const NO_BEST_TYPE_FOR_IMPLICIT_ARRAY: u32 = 826;
    pub const ANONYMOUS_METHOD_TO_EXPRESSION_TREE: u32 = 1946;
    pub const STATEMENT_LAMBDA_TO_EXPRESSION_TREE: u32 = 834;
    pub const DELEGATE_TYPE_COULD_NOT_BE_INFERRED: u32 = 8917;
    pub const UNMANAGED_CALLERS_ONLY_TO_DELEGATE: u32 = 8902;
    pub const OPERATION_CANCELLED: u32 = 9000;
}

pub mod diagnostic_messages {
    use super::{DiagnosticCategory, DiagnosticMessage, diagnostic_codes as codes};

    pub const CANNOT_IMPLICITLY_CONVERT: DiagnosticMessage = DiagnosticMessage {
        code: codes::CANNOT_IMPLICITLY_CONVERT,
        category: DiagnosticCategory::Error,
        message: "Cannot implicitly convert type '{0}' to '{1}'",
    };
    pub const CANNOT_CONVERT: DiagnosticMessage = DiagnosticMessage {
        code: codes::CANNOT_CONVERT,
        category: DiagnosticCategory::Error,
        message: "Cannot convert type '{0}' to '{1}'",
    };
    pub const AMBIGUOUS_CALL: DiagnosticMessage = DiagnosticMessage {
        code: codes::AMBIGUOUS_CALL,
        category: DiagnosticCategory::Error,
        message: "The call is ambiguous between the following methods: {0}",
    };
    pub const TYPE_ARGUMENTS_CANNOT_BE_INFERRED: DiagnosticMessage = DiagnosticMessage {
        code: codes::TYPE_ARGUMENTS_CANNOT_BE_INFERRED,
        category: DiagnosticCategory::Error,
        message: "The type arguments for method '{0}' cannot be inferred from the usage",
    };
    pub const AMBIGUOUS_USER_DEFINED_CONVERSION: DiagnosticMessage = DiagnosticMessage {
        code: codes::AMBIGUOUS_USER_DEFINED_CONVERSION,
        category: DiagnosticCategory::Error,
        message: "Ambiguous user defined conversions {0} when converting from '{1}' to '{2}'",
    };
    pub const NOT_SUPPORTED_BY_LANGUAGE: DiagnosticMessage = DiagnosticMessage {
        code: codes::NOT_SUPPORTED_BY_LANGUAGE,
        category: DiagnosticCategory::Error,
        message: "'{0}' is not supported by the language",
    };
    pub const NO_BEST_TYPE_FOR_IMPLICIT_ARRAY: DiagnosticMessage = DiagnosticMessage {
        code: codes::NO_BEST_TYPE_FOR_IMPLICIT_ARRAY,
        category: DiagnosticCategory::Error,
        message: "No best type found for implicitly-typed array",
    };
    pub const ANONYMOUS_METHOD_TO_EXPRESSION_TREE: DiagnosticMessage = DiagnosticMessage {
        code: codes::ANONYMOUS_METHOD_TO_EXPRESSION_TREE,
        category: DiagnosticCategory::Error,
        message: "An anonymous method expression cannot be converted to an expression tree",
    };
    pub const STATEMENT_LAMBDA_TO_EXPRESSION_TREE: DiagnosticMessage = DiagnosticMessage {
        code: codes::STATEMENT_LAMBDA_TO_EXPRESSION_TREE,
        category: DiagnosticCategory::Error,
        message: "A lambda expression with a statement body cannot be converted to an expression tree",
    };
    pub const DELEGATE_TYPE_COULD_NOT_BE_INFERRED: DiagnosticMessage = DiagnosticMessage {
        code: codes::DELEGATE_TYPE_COULD_NOT_BE_INFERRED,
        category: DiagnosticCategory::Error,
        message: "The delegate type could not be inferred",
    };
    pub const UNMANAGED_CALLERS_ONLY_TO_DELEGATE: DiagnosticMessage = DiagnosticMessage {
        code: codes::UNMANAGED_CALLERS_ONLY_TO_DELEGATE,
        category: DiagnosticCategory::Error,
        message: "'{0}' is attributed with 'UnmanagedCallersOnly' and cannot be converted to a delegate type",
    };
    pub const OPERATION_CANCELLED: DiagnosticMessage = DiagnosticMessage {
        code: codes::OPERATION_CANCELLED,
        category: DiagnosticCategory::Message,
        message: "The operation was cancelled",
    };
}

/// Substitute `{0}`, `{1}`, ... placeholders in a message template.
///
/// Placeholders without a matching argument are left untouched.
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };
        match after[..close].parse::<usize>() {
            Ok(index) if index < args.len() => out.push_str(args[index]),
            _ => out.push_str(&rest[open..open + close + 2]),
        }
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
#[path = "../tests/diagnostics_tests.rs"]
mod tests;
