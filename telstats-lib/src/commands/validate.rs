use super::Host;
use super::common::load_schema;
use super::config::Config;
use crate::Result;
use camino::Utf8PathBuf;
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `telstats.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

/// Validates a configuration file and the schema it names without contacting the device
pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let config_path = args.config.as_deref();

    let result = Config::load(config_path).and_then(|config| load_schema(&config).map(|registry| (config, registry)));

    match result {
        Ok((config, registry)) => {
            let _ = writeln!(host.output(), "Configuration file is valid");
            if let Some(path) = config_path {
                let _ = writeln!(host.output(), "Config file: {path}");
            } else {
                let _ = writeln!(host.output(), "Using default configuration (no config file given)");
            }

            let source = config.schema.as_ref().map_or_else(|| "builtin".to_string(), ToString::to_string);
            let _ = writeln!(
                host.output(),
                "Schema: {source} ({} statistic and {} context properties)",
                registry.properties().count(),
                registry.context_properties().count()
            );
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use crate::commands::init::{InitArgs, init_config};
    use std::fs;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_default_config_is_valid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = Utf8PathBuf::try_from(temp_dir.path().join("telstats.toml")).unwrap();

        let mut init_host = TestHost::new();
        init_config(&mut init_host, &InitArgs { output: Some(config_path.clone()) }).unwrap();

        let mut host = TestHost::new();
        validate_config(&mut host, &ValidateArgs { config: Some(config_path) }).unwrap();

        let output = host.output_text();
        assert!(output.contains("Configuration file is valid"));
        assert!(output.contains("Schema: builtin"));
        assert_eq!(host.exit_code, None);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_invalid_toml_syntax() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_file(&temp_dir, "invalid.toml", "base_url = \"https://device\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_err());
        assert_eq!(host.exit_code, Some(1));
        assert!(host.error_text().contains("Configuration validation failed"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_unknown_field() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_file(&temp_dir, "unknown.toml", "unknown_field = \"value\"\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_err());
        assert_eq!(host.exit_code, Some(1));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_invalid_duration_format() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_file(&temp_dir, "duration.toml", "poll_interval = \"every minute\"\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_err());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_custom_schema() {
        let temp_dir = tempfile::tempdir().unwrap();
        let schema_path = write_file(
            &temp_dir,
            "schema.json",
            r#"{"stats": {"system": {"structure": {"folder": true}}, "uptime": {"key": "/mgmt/tm/sys::uptime", "structure": {"parentKey": "system"}}}}"#,
        );
        let config_path = write_file(&temp_dir, "telstats.toml", &format!("schema = '{schema_path}'\n"));

        let mut host = TestHost::new();
        validate_config(&mut host, &ValidateArgs { config: Some(config_path) }).unwrap();

        assert!(host.output_text().contains("(2 statistic and 0 context properties)"));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_invalid_schema() {
        let temp_dir = tempfile::tempdir().unwrap();
        let schema_path = write_file(&temp_dir, "schema.json", r#"{"stats": {"cpu": {"key": "nowhere::cpu"}}}"#);
        let config_path = write_file(&temp_dir, "telstats.toml", &format!("schema = '{schema_path}'\n"));

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(config_path) });

        assert!(result.is_err());
        assert_eq!(host.exit_code, Some(1));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_empty_config_is_valid() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config_path = write_file(&temp_dir, "empty.toml", "# Empty config file\n");

        let mut host = TestHost::new();
        validate_config(&mut host, &ValidateArgs { config: Some(config_path) }).unwrap();
    }
}
