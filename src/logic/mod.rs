// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Side-effect pipelines run by command workers: loading reference data and sending updates.

pub mod loader;
pub mod submit;
