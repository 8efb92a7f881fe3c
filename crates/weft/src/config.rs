use anyhow::Context as _;
use camino::{Utf8Path, Utf8PathBuf};

const CONFIG_FILE: &str = "weft.toml";

/// The contents of `weft.toml`.
#[derive(Debug, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) beautify: weft_fmt::Options,
}

impl Config {
    /// Reads `path`, or `weft.toml` in the working directory when there is one.
    pub(crate) fn load(path: Option<&Utf8Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None if Utf8Path::new(CONFIG_FILE).is_file() => Utf8PathBuf::from(CONFIG_FILE),
            None => return Ok(Self::default()),
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read `{path}`"))?;
        let config = Self::parse(&text).with_context(|| format!("invalid configuration `{path}`"))?;
        tracing::debug!(%path, ?config, "loaded configuration");
        Ok(config)
    }

    fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use weft_fmt::Options;

    use super::*;

    #[test]
    fn missing_settings_keep_their_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());

        let config = Config::parse("[beautify]\nmax_split_width = 100\n").unwrap();
        assert_eq!(config.beautify, Options { max_split_width: 100, ..Options::default() });
    }

    #[test]
    fn unknown_settings_are_rejected() {
        let error = Config::parse("[beautify]\nmax_width = 100\n").unwrap_err();
        assert!(format!("{error:#}").contains("unknown field `max_width`"), "{error:#}");
    }
}
