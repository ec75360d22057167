// Copyright (C) 2026  Caprica Software Limited
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Host machine queries and power control.

use std::process::Command;

use anyhow::{Context, Result, bail};

/// Returns the first address reported by `hostname -I`, if any.
pub(crate) fn primary_ip() -> Option<String> {
    let output = Command::new("hostname").arg("-I").output().ok()?;
    if !output.status.success() {
        return None;
    }

    first_address(&String::from_utf8_lossy(&output.stdout))
}

fn first_address(output: &str) -> Option<String> {
    output.split_whitespace().next().map(str::to_string)
}

/// Runs the configured halt command (`halt` by default).
pub(crate) fn halt(command: &str) -> Result<()> {
    let mut parts = command.split_whitespace();
    let Some(program) = parts.next() else {
        bail!("No halt command configured");
    };

    let status = Command::new(program)
        .args(parts)
        .status()
        .with_context(|| format!("Failed to run '{}'", command))?;

    if !status.success() {
        bail!("'{}' exited with {}", command, status);
    }

    Ok(())
}
