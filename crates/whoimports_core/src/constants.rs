//! Constants for file extensions, config file names and scanner defaults.
//!
//! Resolution probes a fixed, ordered list of extensions. The collector accepts
//! a slightly wider set so that `.mts`/`.cts` files are still scanned as
//! importers even though they are never inferred as import targets.

/// File extensions for source files the collector hands to the matcher
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "ts",  // TypeScript
    "tsx", // TypeScript with JSX
    "mts", // TypeScript module
    "cts", // TypeScript CommonJS
    "js",  // JavaScript
    "jsx", // JavaScript with JSX
    "mjs", // JavaScript module
    "cjs", // JavaScript CommonJS
];

/// Extensions to try when resolving module imports (in priority order)
pub const RESOLVE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];

/// Index file names to try when resolving directory imports
pub const INDEX_FILES: &[&str] =
    &["index.ts", "index.tsx", "index.js", "index.jsx", "index.mjs", "index.cjs"];

/// Import map looked up directly under the scan root
pub const IMPORT_MAP_FILE: &str = "import_map.json";

/// Path-mapping config looked up directly under the scan root
pub const TSCONFIG_FILE: &str = "tsconfig.json";

/// Directories the collector never descends into
pub const DEFAULT_IGNORED_DIRS: &[&str] = &["node_modules", ".git", "dist", "build", "coverage"];
