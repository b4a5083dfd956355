//! End-to-end scenarios for gitctx.

mod harness;
mod scenarios;
