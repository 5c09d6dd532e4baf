use std::fmt;

/// Machine-readable error codes shared by every rankshift error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    FileMissing,
    ConfigParseError,
    MalformedGraphLine,
    MalformedLevelLine,
    MissingLevel,
    MalformedSolution,
    MalformedTiming,
    SolverSpawnFailed,
    SolverExitFailure,
    SolverOutputMissing,
    SelectionImpossible,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::FileMissing => "E1001",
            Self::ConfigParseError => "E1002",
            Self::MalformedGraphLine => "E2001",
            Self::MalformedLevelLine => "E2002",
            Self::MissingLevel => "E2003",
            Self::MalformedSolution => "E2004",
            Self::MalformedTiming => "E2005",
            Self::SolverSpawnFailed => "E3001",
            Self::SolverExitFailure => "E3002",
            Self::SolverOutputMissing => "E3003",
            Self::SelectionImpossible => "E4001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::FileMissing => "Expected file is missing or unreadable",
            Self::ConfigParseError => "Config file parse error",
            Self::MalformedGraphLine => "Malformed graph line",
            Self::MalformedLevelLine => "Malformed level line",
            Self::MissingLevel => "Node has no level assignment",
            Self::MalformedSolution => "Malformed solution file",
            Self::MalformedTiming => "Malformed timing file",
            Self::SolverSpawnFailed => "Failed to start external tool",
            Self::SolverExitFailure => "External tool exited with failure",
            Self::SolverOutputMissing => "External tool produced no output file",
            Self::SelectionImpossible => "No edge can be selected for this scenario",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::FileMissing => Some("Check the configured paths and the working directory."),
            Self::ConfigParseError => Some("Fix syntax in the TOML config file and retry."),
            Self::MalformedGraphLine => Some("Every graph line needs at least `head tail`."),
            Self::MalformedLevelLine => Some("Every state line must be `node level`."),
            Self::MissingLevel => {
                Some("The solver dropped a node; check for isolated nodes in the graph.")
            }
            Self::MalformedSolution | Self::SolverOutputMissing => {
                Some("Inspect the MIP script output in the work directory.")
            }
            Self::MalformedTiming => Some("The MIP script must write seconds to `time`."),
            Self::SolverSpawnFailed => Some("Verify `java`, the solver jar and scripts exist."),
            Self::SolverExitFailure => None,
            Self::SelectionImpossible => Some("Use a larger generated graph or more levels."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
