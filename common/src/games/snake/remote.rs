use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Administrative commands that bypass the collision path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteAction {
    /// Same reset as dying on a collision.
    Suicide,
    /// Halve the body, count a death, reset direction.
    Shrink,
}

impl RemoteAction {
    pub const fn as_str(self) -> &'static str {
        match self {
            RemoteAction::Suicide => "suicide",
            RemoteAction::Shrink => "shrink",
        }
    }
}

impl fmt::Display for RemoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemoteAction {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suicide" | "kill" => Ok(RemoteAction::Suicide),
            "shrink" => Ok(RemoteAction::Shrink),
            _ => Err(EngineError::UnknownRemoteAction(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_actions() {
        assert_eq!("suicide".parse::<RemoteAction>().unwrap(), RemoteAction::Suicide);
        assert_eq!("Kill".parse::<RemoteAction>().unwrap(), RemoteAction::Suicide);
        assert_eq!(" shrink ".parse::<RemoteAction>().unwrap(), RemoteAction::Shrink);
        assert!(matches!(
            "explode".parse::<RemoteAction>(),
            Err(EngineError::UnknownRemoteAction(_))
        ));
    }
}
