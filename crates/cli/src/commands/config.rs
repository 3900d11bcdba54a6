//! `swaggen config`: inspect or reset the rc file.

use swaggen_common::ConfigStore;

use super::open_store;

/// Print the rc file.
pub fn show() -> i32 {
    match open_store(None).and_then(|store| render(&store)) {
        Ok(text) => {
            print!("{text}");
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn render(store: &ConfigStore) -> Result<String, String> {
    let body = toml::to_string_pretty(store.data())
        .map_err(|err| format!("Failed to render settings: {err}"))?;
    Ok(format!("# {}\n{body}", store.path().display()))
}

/// Overwrite the rc file with defaults.
pub fn reset() -> i32 {
    match open_store(None).and_then(|mut store| store.reset().map_err(|err| err.to_string())) {
        Ok(()) => {
            println!("✅ Settings restored to defaults");
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

pub fn path() -> i32 {
    match ConfigStore::config_path() {
        Ok(path) => {
            println!("{}", path.display());
            0
        }
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_lists_sections() {
        let temp_dir = TempDir::new().unwrap();
        let store = ConfigStore::load_from(temp_dir.path().join("config.toml")).unwrap();
        let text = render(&store).unwrap();
        assert!(text.starts_with("# "));
        assert!(text.contains("[core]"));
        assert!(text.contains("source = \"https://petstore.swagger.io/v2/swagger.json\""));
        assert!(text.contains("[mock]"));
    }
}
