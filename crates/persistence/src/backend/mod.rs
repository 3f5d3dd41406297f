// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Database backend-specific code.
//!
//! This module isolates backend-specific initialization, migration,
//! and helper functions that cannot be expressed in Diesel DSL.
//!
//! ## Backend Support
//!
//! - `sqlite`: `SQLite` backend, used for both file and in-memory databases
//!
//! Backend-specific code is limited to:
//!
//! - Connection initialization
//! - Migration execution
//! - Backend-specific configuration (PRAGMA statements)
//! - The text encoding used for stored timestamps
//!
//! All domain queries and mutations live in `queries/` and `mutations/`.

pub mod sqlite;
