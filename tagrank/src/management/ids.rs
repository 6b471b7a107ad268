// This file is part of the product tagrank.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_CONNECTION_ID: AtomicU32 = AtomicU32::new(1);
static NEXT_WORKFLOW_ID: AtomicU32 = AtomicU32::new(1);

/// Bus ids are never zero; the counters skip it when they wrap.
fn next_non_zero(counter: &AtomicU32) -> u32 {
    loop {
        let id = counter.fetch_add(1, Ordering::Relaxed);
        if id != 0 {
            return id;
        }
    }
}

pub fn next_connection_id() -> u32 {
    next_non_zero(&NEXT_CONNECTION_ID)
}

pub fn next_workflow_id() -> u32 {
    next_non_zero(&NEXT_WORKFLOW_ID)
}
