//! Search core for nine men's morris agents: a Monte Carlo tree search
//! engine guided by a pluggable policy/value oracle, plus a client for the
//! perfect-play endgame database usable as an exact teacher.
//!
//! The crate deliberately stops at the contracts: move generation and full
//! game rules live in the board collaborator behind [`mill::rules::Rules`],
//! network inference behind [`evaluation::Oracle`], and the raw database
//! protocol behind [`tablebase::Backend`].

#![warn(missing_docs, variant_size_differences)]
// Rustc lints.
#![warn(
    absolute_paths_not_starting_with_crate,
    keyword_idents,
    macro_use_extern_crate,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_import_braces,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]
// Rustdoc lints.
#![warn(
    rustdoc::private_doc_tests,
    rustdoc::broken_intra_doc_links,
    rustdoc::invalid_codeblock_attributes,
    rustdoc::invalid_html_tags,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::bare_urls
)]
// Clippy lints.
#![warn(
    clippy::correctness,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
// Performance is extremely important.
#![deny(clippy::perf)]

pub mod evaluation;
pub mod mill;
pub mod search;
pub mod tablebase;
