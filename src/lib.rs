//! Tower middleware that enforces an origin-allowlist [CORS][mdn] policy.
//!
//! A [`CorsPolicy`](cors::CorsPolicy) is built once from a
//! [`CorsConfig`](cors::CorsConfig), validated, and then shared by every
//! request the wrapped service handles. Requests from admitted origins get the
//! standard `Access-Control-*` response headers; preflight requests are
//! answered directly with `204 No Content`. Requests from other origins are
//! passed through untouched and left to the browser's same-origin checks.
//!
//! See the [`cors`] module for an example.
//!
//! [mdn]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS

#![allow(elided_lifetimes_in_paths, clippy::type_complexity)]
#![warn(
    clippy::all,
    clippy::dbg_macro,
    clippy::todo,
    clippy::empty_enum,
    clippy::enum_glob_use,
    clippy::mem_forget,
    clippy::unused_self,
    clippy::filter_map_next,
    clippy::needless_continue,
    clippy::needless_borrow,
    clippy::match_wildcard_for_single_variants,
    clippy::if_let_mutex,
    clippy::await_holding_lock,
    clippy::imprecise_flops,
    clippy::suboptimal_flops,
    clippy::lossy_float_literal,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::fn_params_excessive_bools,
    clippy::exit,
    clippy::inefficient_to_string,
    clippy::linkedlist,
    clippy::macro_use_imports,
    clippy::option_option,
    clippy::verbose_file_reads,
    clippy::unnested_or_patterns,
    rust_2018_idioms,
    future_incompatible,
    nonstandard_style,
    missing_docs
)]
#![deny(unreachable_pub, rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod cors;

pub use crate::cors::{ConfigError, Cors, CorsConfig, CorsLayer, CorsPolicy};

#[cfg(test)]
mod test_helpers;
