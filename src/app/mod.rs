// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

pub mod config;
pub mod logging;
