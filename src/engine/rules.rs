//! The fixed ESLint configuration every file is linted with.

use serde_json::{json, Value};

/// Plugins the configuration loads; each needs its npm package installed.
pub const PLUGINS: [&str; 5] = ["@typescript-eslint", "import", "promise", "node", "security"];

/// Rule levels applied on top of the shared presets.
pub const RULES: [(&str, &str); 17] = [
    ("no-unused-vars", "warn"),
    ("no-undef", "error"),
    ("no-console", "warn"),
    ("no-unreachable", "error"),
    ("no-debugger", "warn"),
    ("eqeqeq", "warn"),
    ("curly", "warn"),
    ("no-empty", "warn"),
    ("no-var", "error"),
    ("prefer-const", "warn"),
    ("@typescript-eslint/no-unused-vars", "warn"),
    ("@typescript-eslint/explicit-function-return-type", "warn"),
    ("@typescript-eslint/no-explicit-any", "warn"),
    ("@typescript-eslint/no-inferrable-types", "warn"),
    ("security/detect-object-injection", "warn"),
    ("security/detect-non-literal-regexp", "warn"),
    ("security/detect-unsafe-regex", "warn"),
];

/// The complete eslintrc document passed to ESLint via `--config`.
pub fn base_config() -> Value {
    let rules: serde_json::Map<String, Value> = RULES
        .iter()
        .map(|(name, level)| (name.to_string(), Value::from(*level)))
        .collect();

    json!({
        "root": true,
        "parser": "@typescript-eslint/parser",
        "parserOptions": {
            "ecmaVersion": 2021,
            "sourceType": "module",
        },
        "env": {
            "browser": true,
            "node": true,
            "es2021": true,
        },
        "plugins": PLUGINS,
        "extends": [
            "eslint:recommended",
            "plugin:@typescript-eslint/recommended",
            "plugin:import/errors",
            "plugin:import/warnings",
            "plugin:promise/recommended",
            "plugin:node/recommended",
        ],
        "rules": rules,
    })
}
