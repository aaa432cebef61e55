// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod aggregate;
pub mod auth;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod draft;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;
pub mod recurrence;
pub mod session;
pub mod store;
pub mod utils;
