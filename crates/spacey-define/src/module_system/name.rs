// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module name normalization and relative reference resolution

/// Split a module name into trimmed, non-empty segments.
pub fn segments(name: &str) -> impl Iterator<Item = &str> {
    name.split('/').map(str::trim).filter(|s| !s.is_empty())
}

/// Normalize a module name: `a//b/` and ` a / b ` both become `a/b`.
pub fn normalize(name: &str) -> String {
    segments(name).collect::<Vec<_>>().join("/")
}

/// Registry key for a name: normalized and case-folded.
pub fn key(name: &str) -> String {
    normalize(name).to_lowercase()
}

/// Returns true if the reference starts with a `.` or `..` segment.
pub fn is_relative(reference: &str) -> bool {
    matches!(segments(reference).next(), Some("." | ".."))
}

/// Resolve a dependency reference against the module that declared it.
///
/// The module's last segment is dropped, then every leading `..` drops one
/// more; a leading `.` stays in the same directory. Absolute references are
/// only normalized.
pub fn resolve_relative(module: &str, reference: &str) -> String {
    let mut parts = segments(reference).peekable();
    if !matches!(parts.peek(), Some(&("." | ".."))) {
        return parts.collect::<Vec<_>>().join("/");
    }

    let mut base: Vec<&str> = segments(module).collect();
    base.pop();
    while let Some(&part) = parts.peek() {
        match part {
            "." => {}
            ".." => {
                base.pop();
            }
            _ => break,
        }
        parts.next();
    }

    base.extend(parts);
    base.join("/")
}
