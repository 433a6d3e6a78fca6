//! Identity-provider token handling.
//!
//! Tokens are issued by an external identity provider; this service only
//! verifies them. [`jwt::issue_token`] exists for local tooling and tests.

pub mod jwt;
