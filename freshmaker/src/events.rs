use std::fmt;

/// Messages freshmaker reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Event {
    /// RPMs of a Brew build were signed.
    BrewSignRpm { msg_id: String, nvr: String },
    /// The RPM spec file of a package changed in dist-git.
    GitRpmSpecChange {
        msg_id: String,
        package: String,
        branch: String,
        rev: String,
    },
}

impl Event {
    pub fn brew_sign_rpm(msg_id: impl Into<String>, nvr: impl Into<String>) -> Self {
        Self::BrewSignRpm {
            msg_id: msg_id.into(),
            nvr: nvr.into(),
        }
    }

    pub fn git_rpm_spec_change(
        msg_id: impl Into<String>,
        package: impl Into<String>,
        branch: impl Into<String>,
        rev: impl Into<String>,
    ) -> Self {
        Self::GitRpmSpecChange {
            msg_id: msg_id.into(),
            package: package.into(),
            branch: branch.into(),
            rev: rev.into(),
        }
    }

    pub fn msg_id(&self) -> &str {
        match self {
            Self::BrewSignRpm { msg_id, .. } | Self::GitRpmSpecChange { msg_id, .. } => msg_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::BrewSignRpm { .. } => "BrewSignRPMEvent",
            Self::GitRpmSpecChange { .. } => "GitRPMSpecChangeEvent",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrewSignRpm { nvr, .. } => write!(f, "{}({nvr})", self.kind()),
            Self::GitRpmSpecChange {
                package, branch, rev, ..
            } => write!(f, "{}({package}@{branch}:{rev})", self.kind()),
        }
    }
}
