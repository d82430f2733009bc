// SPDX-License-Identifier: MIT

pub mod config;
pub mod error;
pub mod loader;
pub mod rules;
pub mod server;
pub mod service;
pub mod store;
