//! Central constants for the styledash pipeline

/// Default values for Git operations
pub mod git {
    /// Fixed subdirectory of the temporary directory that receives the clone
    pub const CLONE_DIR: &str = "clone";

    /// Depth argument for shallow clones
    pub const CLONE_DEPTH: &str = "1";
}

/// Defaults for the component discovery walk
pub mod discovery {
    /// Directory base names that are never entered during the walk.
    ///
    /// Dependency trees, version-control metadata, build output, and
    /// documentation/test directories in their common spellings.
    pub const IGNORED_DIRECTORIES: &[&str] = &[
        "node_modules",
        "bower_components",
        ".git",
        ".hg",
        ".svn",
        "build",
        "dist",
        "out",
        "output",
        "coverage",
        "flow-typed",
        "doc",
        "docs",
        "example",
        "examples",
        "fixture",
        "fixtures",
        "test",
        "tests",
        "__tests__",
        "__mocks__",
    ];

    /// File extensions eligible for documentation extraction
    pub const SOURCE_EXTENSIONS: &[&str] = &["js", "jsx", "tsx"];
}

/// Defaults for the component compiler
pub mod compiler {
    pub const DEFAULT_NODE_BINARY: &str = "node";

    pub const DEFAULT_NPM_BINARY: &str = "npm";

    /// Global callback name compiled bundles invoke with `(key, module)`
    pub const DEFAULT_JSONP_CALLBACK: &str = "__registerComponentBundle";

    /// Per-build deadline before the child process is killed
    pub const DEFAULT_CHILD_TIMEOUT_SECS: u64 = 120;

    /// Scratch directory created inside the clone for build-worker artifacts
    pub const BUILD_SCRATCH_DIR: &str = ".component-build";

    /// Transpiler config files that make the build defer entirely to the
    /// target repository's own setup
    pub const TRANSPILER_CONFIG_FILES: &[&str] = &[
        ".babelrc",
        ".babelrc.js",
        "babel.config.js",
        "babel.config.json",
    ];

    /// Known manifest dependencies mapped to transpilation preset identifiers
    pub const PRESET_PACKAGES: &[(&str, &str)] = &[
        ("react", "react"),
        ("babel-preset-react", "react"),
        ("@babel/preset-react", "react"),
        ("babel-preset-es2015", "es2015"),
        ("babel-preset-env", "env"),
        ("@babel/preset-env", "env"),
        ("babel-preset-stage-0", "stage-0"),
        ("babel-preset-stage-1", "stage-1"),
        ("babel-preset-stage-2", "stage-2"),
        ("babel-preset-stage-3", "stage-3"),
        ("typescript", "typescript"),
        ("@babel/preset-typescript", "typescript"),
    ];
}

/// Package manifest handling
pub mod manifest {
    /// Manifest file expected at the repository root
    pub const MANIFEST_FILE: &str = "package.json";
}

/// Queue naming
pub mod queue {
    /// Queue carrying repository compile jobs
    pub const COMPILE_QUEUE: &str = "compile-repo";
}

/// Defaults for configuration
pub mod config {
    /// Default configuration file name
    pub const DEFAULT_CONFIG_FILE: &str = "styledash.yaml";

    /// Default directory for the file-backed component store
    pub const DEFAULT_DATA_DIR: &str = "data";
}
