use std::fmt;
use std::str::FromStr;

use clap::Parser;
use thiserror::Error;

/// An experimental move and borrow checker over a miniature statement IR,
/// bundled with a demo program it runs on.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Analyse a single function of the demo program. Syntax:
    ///   * `main`
    ///   * `main#2` if there are more than one with the name
    #[clap(long)]
    pub analyse: Option<FnLocator>,

    /// Print the analysed function's control-flow graph as Graphviz dot.
    #[clap(long)]
    pub dot: bool,

    /// Exit nonzero when the checker reports errors.
    #[clap(long)]
    pub deny: bool,

    /// Dump timing information after running.
    #[clap(long)]
    pub profile: bool,

    /// Print debug information.
    #[clap(long, short)]
    pub verbose: bool,

    /// Disable colored output.
    #[clap(long)]
    pub no_color: bool,
}

/// Selects a function by name, with an index to break ties between
/// same-named functions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FnLocator {
    pub name: String,
    pub index: u32,
}

impl fmt::Display for FnLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}#{}", self.name, self.index)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LocatorParseError {
    #[error("invalid function locator format, expected `name` or `name#index`")]
    InvalidFormat,
    #[error("couldn't parse what we expected to be a number")]
    InvalidNumber,
}

impl FromStr for FnLocator {
    type Err = LocatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('#');

        let name = match parts.next() {
            Some(name) if !name.is_empty() => name.to_owned(),
            _ => return Err(LocatorParseError::InvalidFormat),
        };

        let index = match parts.next() {
            None => 0,
            Some(index) => index
                .parse()
                .map_err(|_| LocatorParseError::InvalidNumber)?,
        };

        if parts.next().is_some() {
            return Err(LocatorParseError::InvalidFormat);
        }

        Ok(FnLocator { name, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_name() {
        let loc: FnLocator = "main".parse().unwrap();
        assert_eq!(loc.name, "main");
        assert_eq!(loc.index, 0);
        assert_eq!(loc.to_string(), "main");
    }

    #[test]
    fn name_with_index() {
        let loc: FnLocator = "drain#2".parse().unwrap();
        assert_eq!(loc.name, "drain");
        assert_eq!(loc.index, 2);
        assert_eq!(loc.to_string(), "drain#2");
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            "".parse::<FnLocator>(),
            Err(LocatorParseError::InvalidFormat)
        );
        assert_eq!(
            "#1".parse::<FnLocator>(),
            Err(LocatorParseError::InvalidFormat)
        );
        assert_eq!(
            "f#x".parse::<FnLocator>(),
            Err(LocatorParseError::InvalidNumber)
        );
        assert_eq!(
            "f#1#2".parse::<FnLocator>(),
            Err(LocatorParseError::InvalidFormat)
        );
    }
}
