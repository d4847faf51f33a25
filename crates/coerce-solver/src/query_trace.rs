//! Structured query tracing for public entry points.
//!
//! Events use target `coerce::query_json` and are intended to be consumed with
//! a JSON `tracing-subscriber` layer filtered to
//! `coerce::query_json=trace`.
//!
//! Environment:
//! - `COERCE_QUERY_RUN_ID`: optional run identifier attached to every event.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, trace};

use crate::expr::ExprId;
use crate::method::MethodId;
use crate::types::TypeId;

static NEXT_QUERY_ID: AtomicU64 = AtomicU64::new(1);
static QUERY_RUN_ID: OnceLock<String> = OnceLock::new();

#[inline]
pub(crate) fn enabled() -> bool {
    tracing::enabled!(target: "coerce::query_json", Level::TRACE)
}

#[inline]
pub(crate) fn next_query_id() -> u64 {
    NEXT_QUERY_ID.fetch_add(1, Ordering::Relaxed)
}

#[inline]
fn run_id() -> &'static str {
    QUERY_RUN_ID
        .get_or_init(|| {
            std::env::var("COERCE_QUERY_RUN_ID").unwrap_or_else(|_| "default".to_string())
        })
        .as_str()
}

/// Start of a query over one expression (delegate type inference, natural
/// type, best common type keyed by its first element).
#[inline]
pub(crate) fn expr_start(query_id: u64, op: &'static str, expr: ExprId, version: &'static str) {
    trace!(
        target: "coerce::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        expr_id = expr.0,
        language_version = version
    );
}

#[inline]
pub(crate) fn type_end(query_id: u64, op: &'static str, result: Option<TypeId>, cache_hit: bool) {
    trace!(
        target: "coerce::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        result_type_id = result.map(|t| t.0),
        cache_hit
    );
}

/// Start of a query over a method (type argument inference, overload
/// resolution keyed by its first candidate).
#[inline]
pub(crate) fn method_start(query_id: u64, op: &'static str, method: MethodId, args: usize, version: &'static str) {
    trace!(
        target: "coerce::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        method_id = method.0,
        arg_count = args,
        language_version = version
    );
}

/// Start of a relation query between a source and a target type.
#[inline]
pub(crate) fn relation_start(
    query_id: u64,
    op: &'static str,
    source: Option<TypeId>,
    target: TypeId,
    version: &'static str,
) {
    trace!(
        target: "coerce::query_json",
        event = "query",
        phase = "start",
        run_id = run_id(),
        query_id,
        op,
        source_type_id = source.map(|t| t.0),
        target_type_id = target.0,
        language_version = version
    );
}

#[inline]
pub(crate) fn relation_end(query_id: u64, op: &'static str, outcome: &'static str, ok: bool) {
    trace!(
        target: "coerce::query_json",
        event = "query",
        phase = "end",
        run_id = run_id(),
        query_id,
        op,
        outcome,
        result = ok
    );
}

#[cfg(test)]
#[path = "../tests/query_trace_tests.rs"]
mod tests;
