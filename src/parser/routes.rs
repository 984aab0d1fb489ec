//! # Route Discovery
//!
//! @title API Route File Discovery
//! @author Ramprasad
//!
//! Finds Next.js API route files under the App Router (`app/api/**`) and
//! Pages Router (`pages/api/**`) conventions and maps a route file to the
//! URL path it serves.

use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Glob patterns, relative to the project root, that contain API routes.
const ROUTE_PATTERNS: &[&str] = &[
    "app/api/**/*.ts",
    "app/api/**/*.tsx",
    "pages/api/**/*.ts",
    "pages/api/**/*.tsx",
];

/// Directory names never descended into.
const IGNORED_DIRS: &[&str] = &["node_modules", "dist", ".next"];

/// Collects API route files below `root`.
///
/// # Arguments
///
/// * `root` - Project directory to search
///
/// # Returns
///
/// Existing `.ts`/`.tsx` files matching the route conventions, sorted.
pub fn discover_routes(root: &Path) -> Vec<PathBuf> {
    let patterns: Vec<Pattern> = ROUTE_PATTERNS
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect();

    let mut routes: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() > 0
                && e.file_type().is_dir()
                && IGNORED_DIRS
                    .iter()
                    .any(|ignored| e.file_name().to_string_lossy() == *ignored))
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let relative = e.path().strip_prefix(root).unwrap_or(e.path());
            let relative = relative.to_string_lossy().replace('\\', "/");
            patterns.iter().any(|p| p.matches(&relative))
        })
        .map(|e| e.path().to_path_buf())
        .collect();

    routes.sort();
    routes
}

/// Derives the URL path served by a route file.
///
/// `app/api/tasks/route.ts` maps to `/api/tasks`, `pages/api/users/index.ts`
/// to `/api/users`. Files without an `/api/` segment map to `/api`.
pub fn route_path(file_path: &str) -> String {
    let normalized = file_path.replace('\\', "/");
    let Some(api_index) = normalized.find("/api/") else {
        return "/api".to_string();
    };

    let mut path = normalized[api_index..].to_string();

    for suffix in ["/route.ts", "/route.tsx"] {
        if let Some(stripped) = path.strip_suffix(suffix) {
            path = stripped.to_string();
        }
    }
    for ext in [".tsx", ".ts"] {
        if let Some(stripped) = path.strip_suffix(ext) {
            path = stripped.to_string();
        }
    }
    if let Some(stripped) = path.strip_suffix("/index") {
        path = stripped.to_string();
    }

    if path.is_empty() {
        "/api".to_string()
    } else {
        path
    }
}
