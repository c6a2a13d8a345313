//! Loads a repository-root `.env` file so that opt-in tests can be enabled
//! from IDEs and CI without exporting variables by hand.
//!
//! Variables already set in the process win over the file.

use std::env;
use std::fs;
use std::path::Path;

/// Read `<repo>/.env` (if any) into the process environment.
///
/// Blank lines and `#` comments are skipped, `KEY=VALUE` is split on the
/// first `=`, and surrounding single or double quotes are stripped.
pub fn load_dotenv_if_present() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || env::var_os(key).is_some() {
            continue;
        }
        env::set_var(key, unquote(value.trim()));
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
