// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 Singulabs bot contributors

pub mod auth;
pub mod controller;
pub mod cycle;
pub mod fleet;
pub mod identity;
