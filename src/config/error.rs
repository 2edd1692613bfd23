//! Errors raised while loading or validating `sitegen.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid sitegen.toml: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config file `{}` not found; `build` needs one", .0.display())]
    MissingConfig(PathBuf),

    #[error("[[experiences]] key must not be empty")]
    EmptyExperienceKey,

    #[error("[[experiences]] key `{0}` is declared more than once")]
    DuplicateExperience(String),

    #[error("[[experiences]] `{0}` output_dir must be a relative path inside the output root")]
    UnsafeOutputDir(String),

    #[error("[build.routes_filename] must be a plain file name, got `{0}`")]
    RoutesFilename(String),

    #[error("at least one [[experiences]] entry is required to build")]
    NoExperiences,

    /// The output root is wiped before every build, so it must not hold any
    /// build input.
    #[error("[build.output] `{}` contains the {input} `{}`, which a build would delete", .output.display(), .path.display())]
    OutputOverlapsInput {
        output: PathBuf,
        input: &'static str,
        path: PathBuf,
    },

    #[error("unknown experience keys: {}", .0.join(", "))]
    UnknownExperience(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let dup = ConfigError::DuplicateExperience("hina".into());
        assert_eq!(dup.to_string(), "[[experiences]] key `hina` is declared more than once");

        let overlap = ConfigError::OutputOverlapsInput {
            output: PathBuf::from("/p/out"),
            input: "store",
            path: PathBuf::from("/p/out/micro"),
        };
        assert_eq!(
            overlap.to_string(),
            "[build.output] `/p/out` contains the store `/p/out/micro`, which a build would delete"
        );

        let unknown = ConfigError::UnknownExperience(vec!["a".into(), "b".into()]);
        assert_eq!(unknown.to_string(), "unknown experience keys: a, b");
    }
}
